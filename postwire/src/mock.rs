//! Test doubles: a backend message encoder and a scripted [`Client`].
use bytes::{BufMut, Bytes, BytesMut};
use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU8, AtomicUsize, Ordering},
    },
};

use crate::{
    client::{Client, Responses},
    common::ByteStr,
    ext::{BufMutExt, FmtExt},
    postgres::{
        BackendMessage, Oid, PgFormat, Request, TransactionStatus,
        backend::*,
        field::{Field, FieldType},
    },
};

/// Serialize a backend message the way the server would.
pub(crate) fn encode_backend(msg: &BackendMessage, buf: &mut BytesMut) {
    let mut body = BytesMut::new();

    match msg {
        BackendMessage::Authentication(auth) => match auth {
            Authentication::Ok => body.put_u32(0),
            Authentication::KerberosV5 => body.put_u32(2),
            Authentication::CleartextPassword => body.put_u32(3),
            Authentication::MD5Password { salt } => {
                body.put_u32(5);
                body.put_slice(salt);
            }
            Authentication::SCMCredential => body.put_u32(6),
            Authentication::GSS => body.put_u32(7),
            Authentication::GSSContinue { data } => {
                body.put_u32(8);
                body.put_slice(data);
            }
            Authentication::SSPI => body.put_u32(9),
            Authentication::SASL { mechanisms } => {
                body.put_u32(10);
                for mechanism in mechanisms {
                    body.put_nul_string(mechanism);
                }
                body.put_u8(0);
            }
            Authentication::SASLContinue { data } => {
                body.put_u32(11);
                body.put_slice(data);
            }
            Authentication::SASLFinal { data } => {
                body.put_u32(12);
                body.put_slice(data);
            }
        },
        BackendMessage::BackendKeyData(key) => {
            body.put_u32(key.process_id);
            body.put_u32(key.secret_key);
        }
        BackendMessage::CommandComplete(complete) => {
            let tag = match (complete.row_id, complete.rows) {
                (Some(row_id), Some(rows)) => format!("{} {row_id} {rows}", complete.command.as_str()),
                (_, Some(rows)) => format!("{} {rows}", complete.command.as_str()),
                _ => complete.command.to_string(),
            };
            body.put_nul_string(&tag);
        }
        BackendMessage::CopyBothResponse(CopyBothResponse { format, column_formats })
        | BackendMessage::CopyInResponse(CopyInResponse { format, column_formats })
        | BackendMessage::CopyOutResponse(CopyOutResponse { format, column_formats }) => {
            body.put_u8(format.format_code() as u8);
            body.put_u16(column_formats.len() as u16);
            for format in column_formats {
                body.put_u16(format.format_code());
            }
        }
        BackendMessage::CopyData(copy) => body.put_slice(&copy.data),
        BackendMessage::DataRow(row) => {
            body.put_u16(row.columns.len() as u16);
            for column in &row.columns {
                put_nullable(&mut body, column.as_deref());
            }
        }
        BackendMessage::ErrorResponse(ErrorResponse { fields })
        | BackendMessage::NoticeResponse(NoticeResponse { fields }) => {
            for field in fields {
                body.put_u8(field.kind.code());
                body.put_nul_string(&field.value);
            }
            body.put_u8(0);
        }
        BackendMessage::FunctionCallResponse(response) => {
            put_nullable(&mut body, response.value.as_deref());
        }
        BackendMessage::NegotiateProtocolVersion(negotiate) => {
            body.put_u32(negotiate.minor);
            body.put_u32(negotiate.options.len() as u32);
            for option in &negotiate.options {
                body.put_nul_string(option);
            }
        }
        BackendMessage::NotificationResponse(notification) => {
            body.put_u32(notification.process_id);
            body.put_nul_string(&notification.channel);
            body.put_nul_string(&notification.payload);
        }
        BackendMessage::ParameterDescription(description) => {
            body.put_u16(description.oids.len() as u16);
            for oid in &description.oids {
                body.put_u32(*oid);
            }
        }
        BackendMessage::ParameterStatus(param) => {
            body.put_nul_string(&param.name);
            body.put_nul_string(&param.value);
        }
        BackendMessage::ReadyForQuery(ready) => body.put_u8(ready.status.as_byte()),
        BackendMessage::RowDescription(description) => {
            body.put_u16(description.fields.len() as u16);
            for field in &description.fields {
                body.put_nul_string(&field.name);
                body.put_u32(field.table_oid);
                body.put_i16(field.column);
                body.put_u32(field.type_oid);
                body.put_i16(field.type_size);
                body.put_i32(field.type_modifier);
                body.put_u16(field.format.format_code());
            }
        }
        BackendMessage::BindComplete(_)
        | BackendMessage::CloseComplete(_)
        | BackendMessage::CopyDone(_)
        | BackendMessage::EmptyQueryResponse(_)
        | BackendMessage::NoData(_)
        | BackendMessage::ParseComplete(_)
        | BackendMessage::PortalSuspended(_) => {}
    }

    buf.put_u8(msg.msgtype());
    buf.put_u32(4 + body.len() as u32);
    buf.put(body);
}

fn put_nullable(body: &mut BytesMut, value: Option<&[u8]>) {
    match value {
        Some(value) => {
            body.put_i32(value.len() as i32);
            body.put_slice(value);
        }
        None => body.put_i32(-1),
    }
}

/// Text format `RowDescription` of `(name, oid)` columns.
pub(crate) fn row_description(columns: &[(&str, Oid)]) -> BackendMessage {
    let fields = columns
        .iter()
        .map(|&(name, type_oid)| FieldDescription {
            name: ByteStr::copy_from_str(name),
            table_oid: 0,
            column: 0,
            type_oid,
            type_size: -1,
            type_modifier: -1,
            format: PgFormat::Text,
        })
        .collect();
    RowDescription { fields }.into()
}

pub(crate) fn data_row(values: &[Option<&str>]) -> BackendMessage {
    let columns = values
        .iter()
        .map(|value| value.map(|value| Bytes::copy_from_slice(value.as_bytes())))
        .collect();
    DataRow { columns }.into()
}

pub(crate) fn command_complete(tag: &'static str) -> BackendMessage {
    CommandComplete::parse(ByteStr::from_static(tag)).into()
}

pub(crate) fn error_response(code: &'static str, message: &'static str) -> BackendMessage {
    ErrorResponse {
        fields: vec![
            Field::new(FieldType::SeverityLocalized, "ERROR"),
            Field::new(FieldType::Code, code),
            Field::new(FieldType::Message, message),
        ],
    }
    .into()
}

struct Exchange {
    request: Bytes,
    responses: Vec<BackendMessage>,
    status: TransactionStatus,
}

struct Inner {
    script: Mutex<VecDeque<Exchange>>,
    exchanges: AtomicUsize,
    status: AtomicU8,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if std::thread::panicking() {
            return;
        }
        let script = self.script.get_mut().unwrap_or_else(|e| e.into_inner());
        assert!(script.is_empty(), "{} expected exchanges never requested", script.len());
    }
}

/// A [`Client`] replaying scripted exchanges.
///
/// Each exchange asserts the exact request bytes, then replies with the scripted messages from
/// a spawned task. The task yields before every reply and before applying the status, so
/// callers observe pending replies and a status that lags the last reply.
#[derive(Clone)]
pub(crate) struct TestClient {
    inner: Arc<Inner>,
}

impl TestClient {
    pub(crate) fn new() -> Self {
        Self::with_status(TransactionStatus::Idle)
    }

    pub(crate) fn with_status(status: TransactionStatus) -> Self {
        Self {
            inner: Arc::new(Inner {
                script: Mutex::new(VecDeque::new()),
                exchanges: AtomicUsize::new(0),
                status: AtomicU8::new(status.as_byte()),
            }),
        }
    }

    /// Script the next exchange, the status is reported after the replies are sent.
    pub(crate) fn expect(
        &self,
        request: Request,
        responses: impl IntoIterator<Item = BackendMessage>,
        status: TransactionStatus,
    ) -> &Self {
        self.inner.script.lock().unwrap().push_back(Exchange {
            request: request.freeze(),
            responses: responses.into_iter().collect(),
            status,
        });
        self
    }

    /// Number of exchanges requested so far.
    pub(crate) fn exchanges(&self) -> usize {
        self.inner.exchanges.load(Ordering::SeqCst)
    }

    /// Number of scripted exchanges not yet requested.
    pub(crate) fn remaining(&self) -> usize {
        self.inner.script.lock().unwrap().len()
    }
}

impl Client for TestClient {
    fn exchange(&self, request: Request) -> Responses {
        self.inner.exchanges.fetch_add(1, Ordering::SeqCst);

        let Some(exchange) = self.inner.script.lock().unwrap().pop_front() else {
            panic!("unexpected request: {:?}", request.as_bytes().lossy());
        };
        assert_eq!(
            format!("{:?}", request.as_bytes().lossy()),
            format!("{:?}", exchange.request.lossy()),
            "request does not match the script",
        );

        let (send, responses) = Responses::channel();
        let inner = self.inner.clone();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            for message in exchange.responses {
                let _ = send.send(Ok(message));
                tokio::task::yield_now().await;
            }
            // ReadyForQuery arrives after the last reply
            tokio::task::yield_now().await;
            inner.status.store(exchange.status.as_byte(), Ordering::SeqCst);
            drop(send);
        });
        responses
    }

    fn transaction_status(&self) -> TransactionStatus {
        TransactionStatus::from_byte(self.inner.status.load(Ordering::SeqCst)).unwrap()
    }
}
