//! Startup phase.
//!
//! <https://www.postgresql.org/docs/current/protocol-flow.html#PROTOCOL-FLOW-START-UP>
use std::{collections::HashMap, fmt};

use super::Config;
use crate::{
    Result,
    client::PgStream,
    common::{logger, span},
    postgres::{
        BackendMessage, ProtocolError, TransactionStatus,
        backend::{Authentication, BackendKeyData},
        frontend::PasswordMessage,
    },
};

/// Startup phase successful response.
#[derive(Debug, Default)]
pub struct StartupResponse {
    pub params: HashMap<String, String>,
    pub key_data: Option<BackendKeyData>,
    pub status: TransactionStatus,
}

/// Authentication method requested by the server is not supported.
pub struct UnsupportedAuth {
    method: &'static str,
}

impl UnsupportedAuth {
    /// Name of the requested method.
    pub fn method(&self) -> &'static str {
        self.method
    }
}

impl std::error::Error for UnsupportedAuth { }

impl fmt::Display for UnsupportedAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported authentication method `{}`", self.method)
    }
}

impl fmt::Debug for UnsupportedAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

/// Perform the startup phase, up to the first `ReadyForQuery`.
pub async fn startup(config: &Config, stream: &mut PgStream) -> Result<StartupResponse> {
    span!("startup");

    stream.send_startup(config.startup());
    stream.flush().await?;

    // For all authentication methods except GSSAPI, SSPI and SASL, there is at most one request
    // and one response.
    loop {
        let auth = match stream.recv().await? {
            BackendMessage::Authentication(auth) => auth,
            BackendMessage::ErrorResponse(err) => return Err(err.into_error().into()),
            BackendMessage::NegotiateProtocolVersion(negotiate) => {
                logger!(warn, "server supports protocol 3.{} only", negotiate.minor);
                continue;
            }
            f => return Err(ProtocolError::unexpected_phase(f.msgtype(), "authentication").into()),
        };

        match auth {
            Authentication::Ok => break,
            Authentication::CleartextPassword => {
                stream.send(PasswordMessage { password: &config.pass });
                stream.flush().await?;
            }
            auth => return Err(UnsupportedAuth { method: auth.method_name() }.into()),
        }
    }

    // After AuthenticationOk the backend process is being started, it may still fail with
    // ErrorResponse. In the normal case it sends ParameterStatus messages, BackendKeyData,
    // and finally ReadyForQuery.
    let mut response = StartupResponse::default();

    loop {
        match stream.recv().await? {
            BackendMessage::ReadyForQuery(ready) => {
                response.status = ready.status;
                break;
            }
            BackendMessage::BackendKeyData(key_data) => response.key_data = Some(key_data),
            BackendMessage::ParameterStatus(param) => {
                response.params.insert(param.name.to_string(), param.value.to_string());
            }
            BackendMessage::NoticeResponse(notice) => {
                logger!(warn, "{}", notice.into_diagnostic());
            }
            BackendMessage::NegotiateProtocolVersion(negotiate) => {
                logger!(warn, "server supports protocol 3.{} only", negotiate.minor);
            }
            BackendMessage::ErrorResponse(err) => return Err(err.into_error().into()),
            f => return Err(ProtocolError::unexpected_phase(f.msgtype(), "startup").into()),
        }
    }

    Ok(response)
}

#[cfg(test)]
mod test {
    use bytes::BytesMut;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::{TcpListener, TcpStream},
    };

    use super::*;
    use crate::{
        ErrorKind,
        mock::{encode_backend, error_response},
        postgres::backend::{ParameterStatus, ReadyForQuery},
    };

    async fn pair() -> (PgStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, _) = listener.accept().await.unwrap();
        (PgStream::new(client), server)
    }

    /// Read one frontend message, `startup` has no message type.
    async fn read_frame(server: &mut TcpStream, startup: bool) -> Vec<u8> {
        let mut frame = vec![];
        if !startup {
            frame.push(server.read_u8().await.unwrap());
        }
        let len = server.read_u32().await.unwrap();
        frame.extend_from_slice(&len.to_be_bytes());
        let mut body = vec![0; len as usize - 4];
        server.read_exact(&mut body).await.unwrap();
        frame.extend(body);
        frame
    }

    async fn reply(server: &mut TcpStream, messages: Vec<BackendMessage>) {
        let mut buf = BytesMut::new();
        for msg in &messages {
            encode_backend(msg, &mut buf);
        }
        server.write_all(&buf).await.unwrap();
    }

    #[tokio::test]
    async fn cleartext_password() {
        let (mut stream, mut server) = pair().await;
        let config = Config::default().user("ferris").password("crab");

        let server = tokio::spawn(async move {
            let startup = read_frame(&mut server, true).await;
            assert!(startup.windows(7).any(|w| w == b"ferris\0"));

            reply(&mut server, vec![Authentication::CleartextPassword.into()]).await;
            assert_eq!(read_frame(&mut server, false).await, b"p\0\0\0\x09crab\0");

            reply(
                &mut server,
                vec![
                    Authentication::Ok.into(),
                    ParameterStatus { name: "server_version".into(), value: "17.2".into() }.into(),
                    BackendKeyData { process_id: 7, secret_key: 42 }.into(),
                    ReadyForQuery { status: TransactionStatus::Idle }.into(),
                ],
            )
            .await;
            server
        });

        let response = startup(&config, &mut stream).await.unwrap();
        assert_eq!(response.params["server_version"], "17.2");
        assert_eq!(response.key_data, Some(BackendKeyData { process_id: 7, secret_key: 42 }));
        assert_eq!(response.status, TransactionStatus::Idle);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn unsupported_method() {
        let (mut stream, mut server) = pair().await;
        let server = tokio::spawn(async move {
            read_frame(&mut server, true).await;
            reply(&mut server, vec![Authentication::MD5Password { salt: *b"salt" }.into()]).await;
            server
        });

        let err = startup(&Config::default(), &mut stream).await.unwrap_err();
        let ErrorKind::UnsupportedAuth(auth) = err.kind() else { panic!("{err}") };
        assert_eq!(auth.method(), "MD5Password");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn startup_error() {
        let (mut stream, mut server) = pair().await;
        let server = tokio::spawn(async move {
            read_frame(&mut server, true).await;
            reply(&mut server, vec![error_response("3D000", "database \"nope\" does not exist")]).await;
            server
        });

        let err = startup(&Config::default(), &mut stream).await.unwrap_err();
        assert_eq!(err.as_database().unwrap().code(), Some("3D000"));
        server.await.unwrap();
    }
}
