//! Postgres Backend Messages
//!
//! <https://www.postgresql.org/docs/current/protocol-message-formats.html>
use bytes::{Buf, Bytes};

use super::{DatabaseError, Diagnostic, Oid, PgFormat, ProtocolError, field::Field};
use crate::{common::ByteStr, ext::BytesExt};

/// A type that can be decoded into postgres backend message
pub trait BackendProtocol: Sized {
    /// Decode message body, `body` excludes the message type and length.
    fn decode(msgtype: u8, body: Bytes) -> Result<Self,ProtocolError>;
}

/// Postgres backend messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendMessage {
    Authentication(Authentication),
    BackendKeyData(BackendKeyData),
    BindComplete(BindComplete),
    CloseComplete(CloseComplete),
    CommandComplete(CommandComplete),
    CopyBothResponse(CopyBothResponse),
    CopyData(CopyData),
    CopyDone(CopyDone),
    CopyInResponse(CopyInResponse),
    CopyOutResponse(CopyOutResponse),
    DataRow(DataRow),
    EmptyQueryResponse(EmptyQueryResponse),
    ErrorResponse(ErrorResponse),
    FunctionCallResponse(FunctionCallResponse),
    NegotiateProtocolVersion(NegotiateProtocolVersion),
    NoData(NoData),
    NoticeResponse(NoticeResponse),
    NotificationResponse(NotificationResponse),
    ParameterDescription(ParameterDescription),
    ParameterStatus(ParameterStatus),
    ParseComplete(ParseComplete),
    PortalSuspended(PortalSuspended),
    ReadyForQuery(ReadyForQuery),
    RowDescription(RowDescription),
}

macro_rules! match_backend {
    ($($name:ident,)*) => {
        impl BackendMessage {
            pub fn msgtype(&self) -> u8 {
                match self {
                    $(Self::$name(_) => $name::MSGTYPE,)*
                }
            }

            /// Get message name from message type.
            ///
            /// Returns `"Unknown"` for unknown message type.
            pub fn message_name(msgtype: u8) -> &'static str {
                match msgtype {
                    $($name::MSGTYPE => stringify!($name),)*
                    _ => "Unknown",
                }
            }
        }

        impl BackendProtocol for BackendMessage {
            fn decode(msgtype: u8, body: Bytes) -> Result<Self, ProtocolError> {
                let message = match msgtype {
                    $($name::MSGTYPE => Self::$name(<$name as BackendProtocol>::decode(msgtype, body)?),)*
                    _ => return Err(ProtocolError::unknown(msgtype)),
                };
                Ok(message)
            }
        }

        $(
            impl From<$name> for BackendMessage {
                fn from(value: $name) -> Self {
                    Self::$name(value)
                }
            }
        )*
    };
}

match_backend! {
    Authentication,
    BackendKeyData,
    BindComplete,
    CloseComplete,
    CommandComplete,
    CopyBothResponse,
    CopyData,
    CopyDone,
    CopyInResponse,
    CopyOutResponse,
    DataRow,
    EmptyQueryResponse,
    ErrorResponse,
    FunctionCallResponse,
    NegotiateProtocolVersion,
    NoData,
    NoticeResponse,
    NotificationResponse,
    ParameterDescription,
    ParameterStatus,
    ParseComplete,
    PortalSuspended,
    ReadyForQuery,
    RowDescription,
}

macro_rules! assert_msgtype {
    ($typ:ident) => {
        if Self::MSGTYPE != $typ {
            return Err(ProtocolError::unexpected(Self::MSGTYPE,$typ))
        }
    };
}

/// Identifies the message as an authentication request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authentication {
    /// Specifies that the authentication was successful.
    Ok,
    /// Specifies that Kerberos V5 authentication is required.
    KerberosV5,
    /// Specifies that a clear-text password is required.
    CleartextPassword,
    /// Specifies that an MD5-encrypted password is required.
    MD5Password {
        /// The salt to use when encrypting the password.
        salt: [u8;4],
    },
    /// Specifies that an SCM credentials message is required.
    SCMCredential,
    /// Specifies that GSSAPI authentication is required.
    GSS,
    /// GSSAPI or SSPI authentication data.
    GSSContinue {
        data: Bytes,
    },
    /// Specifies that SSPI authentication is required.
    SSPI,
    /// Specifies that SASL authentication is required.
    SASL {
        /// SASL authentication mechanisms, in the server's order of preference.
        mechanisms: Vec<ByteStr>,
    },
    /// Specifies that this message contains a SASL challenge.
    SASLContinue {
        /// SASL data, specific to the SASL mechanism being used.
        data: Bytes,
    },
    /// Specifies that SASL authentication has completed.
    SASLFinal {
        /// SASL outcome "additional data", specific to the SASL mechanism being used.
        data: Bytes,
    },
}

impl Authentication {
    pub const MSGTYPE: u8 = b'R';

    /// Returns the authentication method name.
    pub fn method_name(&self) -> &'static str {
        match self {
            Self::Ok => "Ok",
            Self::KerberosV5 => "KerberosV5",
            Self::CleartextPassword => "CleartextPassword",
            Self::MD5Password { .. } => "MD5Password",
            Self::SCMCredential => "SCMCredential",
            Self::GSS => "GSS",
            Self::GSSContinue { .. } => "GSSContinue",
            Self::SSPI => "SSPI",
            Self::SASL { .. } => "SASL",
            Self::SASLContinue { .. } => "SASLContinue",
            Self::SASLFinal { .. } => "SASLFinal",
        }
    }
}

impl BackendProtocol for Authentication {
    fn decode(msgtype: u8, mut body: Bytes) -> Result<Self,ProtocolError> {
        assert_msgtype!(msgtype);
        let auth = match body.try_get_u32()? {
            0 => Authentication::Ok,
            2 => Authentication::KerberosV5,
            3 => Authentication::CleartextPassword,
            5 => Authentication::MD5Password { salt: body.try_get_u32()?.to_be_bytes(), },
            6 => Authentication::SCMCredential,
            7 => Authentication::GSS,
            8 => Authentication::GSSContinue { data: body },
            9 => Authentication::SSPI,
            10 => {
                let mut mechanisms = vec![];
                loop {
                    let name = body.get_nul_bytestr()?;
                    if name.is_empty() {
                        break;
                    }
                    mechanisms.push(name);
                }
                Authentication::SASL { mechanisms }
            }
            11 => Authentication::SASLContinue { data: body },
            12 => Authentication::SASLFinal { data: body },
            auth => return Err(ProtocolError::unknown_auth(auth)),
        };
        Ok(auth)
    }
}

/// Identifies the message as cancellation key data.
///
/// The frontend must save these values if it wishes to be able to issue CancelRequest messages later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendKeyData {
    /// The process ID of this backend.
    pub process_id: u32,
    /// The secret key of this backend.
    pub secret_key: u32,
}

impl BackendKeyData {
    pub const MSGTYPE: u8 = b'K';
}

impl BackendProtocol for BackendKeyData {
    fn decode(msgtype: u8, mut body: Bytes) -> Result<Self,ProtocolError> {
        assert_msgtype!(msgtype);
        Ok(Self {
            process_id: body.try_get_u32()?,
            secret_key: body.try_get_u32()?,
        })
    }
}

/// Identifies the message as a command-completed response
///
/// For an INSERT command, the tag is INSERT oid rows, where rows is the number of rows inserted.
/// oid used to be the object ID of the inserted row if rows was 1 and the target table had OIDs,
/// but OIDs system columns are not supported anymore; therefore oid is always 0.
///
/// For a DELETE, UPDATE, MERGE, SELECT, MOVE, FETCH, or COPY command, the tag is the command
/// followed by the number of rows affected.
///
/// Any other command only carry the command tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandComplete {
    /// The command name, the first word of the tag.
    pub command: ByteStr,
    /// The object ID of the inserted row, only reported by INSERT.
    pub row_id: Option<u32>,
    /// The number of rows affected.
    pub rows: Option<u64>,
}

impl CommandComplete {
    pub const MSGTYPE: u8 = b'C';

    /// Parse a command tag.
    pub fn parse(tag: ByteStr) -> Self {
        let mut tokens = tag.split_ascii_whitespace();
        let command = match tokens.next() {
            Some(command) => tag.slice_ref(command),
            None => tag.clone(),
        };

        let (row_id, rows) = match command.as_str() {
            "INSERT" => {
                let row_id = tokens.next().and_then(|e| e.parse().ok());
                let rows = tokens.next().and_then(|e| e.parse().ok());
                (row_id, rows)
            }
            "COPY" | "DELETE" | "FETCH" | "MERGE" | "MOVE" | "SELECT" | "UPDATE" => {
                (None, tokens.next().and_then(|e| e.parse().ok()))
            }
            _ => (None, None),
        };

        Self { command, row_id, rows }
    }
}

impl BackendProtocol for CommandComplete {
    fn decode(msgtype: u8, mut body: Bytes) -> Result<Self, ProtocolError> {
        assert_msgtype!(msgtype);
        Ok(Self::parse(body.get_nul_bytestr()?))
    }
}

macro_rules! copy_response {
    ($($(#[$doc:meta])* struct $name:ident, $ty:literal;)*) => {$(
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            /// Overall COPY format, [`Text`][PgFormat::Text] or [`Binary`][PgFormat::Binary].
            pub format: PgFormat,
            /// The format codes to be used for each column.
            ///
            /// All must be zero if the overall copy format is textual.
            pub column_formats: Vec<PgFormat>,
        }

        impl $name {
            pub const MSGTYPE: u8 = $ty;
        }

        impl BackendProtocol for $name {
            fn decode(msgtype: u8, mut body: Bytes) -> Result<Self, ProtocolError> {
                assert_msgtype!(msgtype);
                let format = PgFormat::from_code(body.try_get_u8()?.into())?;
                let len = body.try_get_u16()?;
                let mut column_formats = Vec::with_capacity(len.into());
                for _ in 0..len {
                    column_formats.push(PgFormat::from_code(body.try_get_u16()?)?);
                }
                Ok(Self { format, column_formats })
            }
        }
    )*};
}

copy_response! {
    /// Identifies the message as a Start Copy Both response.
    ///
    /// This message is used only for Streaming Replication.
    struct CopyBothResponse, b'W';

    /// Identifies the message as a Start Copy In response.
    ///
    /// The frontend must now send copy-in data.
    struct CopyInResponse, b'G';

    /// Identifies the message as a Start Copy Out response.
    ///
    /// This message will be followed by copy-out data.
    struct CopyOutResponse, b'H';
}

/// Identifies the message as COPY data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyData {
    /// Data that forms part of a COPY data stream.
    pub data: Bytes,
}

impl CopyData {
    pub const MSGTYPE: u8 = b'd';
}

impl BackendProtocol for CopyData {
    fn decode(msgtype: u8, data: Bytes) -> Result<Self, ProtocolError> {
        assert_msgtype!(msgtype);
        Ok(Self { data })
    }
}

/// Identifies the message as a data row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRow {
    /// Column values, [`None`] for NULL.
    ///
    /// Values are slices of the received buffer.
    pub columns: Vec<Option<Bytes>>,
}

impl DataRow {
    pub const MSGTYPE: u8 = b'D';
}

impl BackendProtocol for DataRow {
    fn decode(msgtype: u8, mut body: Bytes) -> Result<Self, ProtocolError> {
        assert_msgtype!(msgtype);
        let len = body.try_get_u16()?;
        let mut columns = Vec::with_capacity(len.into());
        for _ in 0..len {
            columns.push(body.get_nullable()?);
        }
        Ok(Self { columns })
    }
}

/// Identifies the message as an error
///
/// The message body consists of one or more identified fields, followed by a zero byte as a terminator.
/// Fields can appear in any order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub fields: Vec<Field>,
}

impl ErrorResponse {
    pub const MSGTYPE: u8 = b'E';

    pub fn into_error(self) -> DatabaseError {
        DatabaseError::new(self.fields)
    }
}

impl BackendProtocol for ErrorResponse {
    fn decode(msgtype: u8, body: Bytes) -> Result<Self,ProtocolError> {
        assert_msgtype!(msgtype);
        Ok(Self { fields: Field::decode(body)? })
    }
}

/// A warning message. The frontend should display the message.
///
/// The message body consists of the same fields as [`ErrorResponse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeResponse {
    pub fields: Vec<Field>,
}

impl NoticeResponse {
    pub const MSGTYPE: u8 = b'N';

    pub fn into_diagnostic(self) -> Diagnostic {
        Diagnostic::new(self.fields)
    }
}

impl BackendProtocol for NoticeResponse {
    fn decode(msgtype: u8, body: Bytes) -> Result<Self,ProtocolError> {
        assert_msgtype!(msgtype);
        Ok(Self { fields: Field::decode(body)? })
    }
}

/// Identifies the message as a function call result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCallResponse {
    /// The value of the function result, [`None`] for NULL.
    pub value: Option<Bytes>,
}

impl FunctionCallResponse {
    pub const MSGTYPE: u8 = b'V';
}

impl BackendProtocol for FunctionCallResponse {
    fn decode(msgtype: u8, mut body: Bytes) -> Result<Self, ProtocolError> {
        assert_msgtype!(msgtype);
        Ok(Self { value: body.get_nullable()? })
    }
}

/// Identifies the message as a protocol version negotiation message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiateProtocolVersion {
    /// Newest minor protocol version supported by the server for the major protocol version requested by the client.
    pub minor: u32,
    /// Protocol options not recognized by the server.
    pub options: Vec<ByteStr>,
}

impl NegotiateProtocolVersion {
    pub const MSGTYPE: u8 = b'v';
}

impl BackendProtocol for NegotiateProtocolVersion {
    fn decode(msgtype: u8, mut body: Bytes) -> Result<Self,ProtocolError> {
        assert_msgtype!(msgtype);
        let minor = body.try_get_u32()?;
        let len = body.try_get_u32()?;
        let mut options = vec![];
        for _ in 0..len {
            options.push(body.get_nul_bytestr()?);
        }
        Ok(Self { minor, options })
    }
}

/// Identifies the message as a notification response, sent by `NOTIFY`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationResponse {
    /// The process ID of the notifying backend process.
    pub process_id: u32,
    /// The name of the channel that the notify has been raised on.
    pub channel: ByteStr,
    /// The "payload" string passed from the notifying process.
    pub payload: ByteStr,
}

impl NotificationResponse {
    pub const MSGTYPE: u8 = b'A';
}

impl BackendProtocol for NotificationResponse {
    fn decode(msgtype: u8, mut body: Bytes) -> Result<Self, ProtocolError> {
        assert_msgtype!(msgtype);
        Ok(Self {
            process_id: body.try_get_u32()?,
            channel: body.get_nul_bytestr()?,
            payload: body.get_nul_bytestr()?,
        })
    }
}

/// Identifies the message as a parameter description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDescription {
    /// The object ID of each parameter data type.
    pub oids: Vec<Oid>,
}

impl ParameterDescription  {
    pub const MSGTYPE: u8 = b't';
}

impl BackendProtocol for ParameterDescription {
    fn decode(msgtype: u8, mut body: Bytes) -> Result<Self,ProtocolError> {
        assert_msgtype!(msgtype);
        let len = body.try_get_u16()?;
        let mut oids = Vec::with_capacity(len.into());
        for _ in 0..len {
            oids.push(body.try_get_u32()?);
        }
        Ok(Self { oids })
    }
}

/// Identifies the message as a run-time parameter status report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterStatus {
    /// The name of the run-time parameter being reported
    pub name: ByteStr,
    /// The current value of the parameter
    pub value: ByteStr,
}

impl ParameterStatus {
    pub const MSGTYPE: u8 = b'S';
}

impl BackendProtocol for ParameterStatus {
    fn decode(msgtype: u8, mut body: Bytes) -> Result<Self,ProtocolError> {
        assert_msgtype!(msgtype);
        Ok(Self {
            name: body.get_nul_bytestr()?,
            value: body.get_nul_bytestr()?,
        })
    }
}

/// Current backend transaction status, reported by [`ReadyForQuery`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransactionStatus {
    /// `I`, not in a transaction block.
    #[default]
    Idle,
    /// `T`, in a transaction block.
    Open,
    /// `E`, in a failed transaction block, queries will be rejected until block is ended.
    Failed,
}

impl TransactionStatus {
    pub fn from_byte(status: u8) -> Result<Self, ProtocolError> {
        match status {
            b'I' => Ok(Self::Idle),
            b'T' => Ok(Self::Open),
            b'E' => Ok(Self::Failed),
            status => Err(ProtocolError::UnknownTransactionStatus { status }),
        }
    }

    pub fn as_byte(&self) -> u8 {
        match self {
            Self::Idle => b'I',
            Self::Open => b'T',
            Self::Failed => b'E',
        }
    }
}

/// ReadyForQuery is sent whenever the backend is ready for a new query cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadyForQuery {
    pub status: TransactionStatus,
}

impl ReadyForQuery {
    pub const MSGTYPE: u8 = b'Z';
}

impl BackendProtocol for ReadyForQuery {
    fn decode(msgtype: u8, mut body: Bytes) -> Result<Self, ProtocolError> {
        assert_msgtype!(msgtype);
        Ok(Self { status: TransactionStatus::from_byte(body.try_get_u8()?)? })
    }
}

/// Identifies the message as a row description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowDescription {
    pub fields: Vec<FieldDescription>,
}

/// Description of one column in [`RowDescription`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescription {
    /// The field name.
    pub name: ByteStr,
    /// If the field can be identified as a column of a specific table, the object ID of the table; otherwise zero.
    pub table_oid: Oid,
    /// If the field can be identified as a column of a specific table, the attribute number of the column; otherwise zero.
    pub column: i16,
    /// The object ID of the field's data type.
    pub type_oid: Oid,
    /// The data type size (see pg_type.typlen). Note that negative values denote variable-width types.
    pub type_size: i16,
    /// The type modifier (see pg_attribute.atttypmod). The meaning of the modifier is type-specific.
    pub type_modifier: i32,
    /// The format code being used for the field.
    ///
    /// In a RowDescription returned from the statement variant of Describe,
    /// the format code is not yet known and will always be zero.
    pub format: PgFormat,
}

impl RowDescription {
    pub const MSGTYPE: u8 = b'T';
}

impl BackendProtocol for RowDescription {
    fn decode(msgtype: u8, mut body: Bytes) -> Result<Self, ProtocolError> {
        assert_msgtype!(msgtype);
        let len = body.try_get_u16()?;
        let mut fields = Vec::with_capacity(len.into());
        for _ in 0..len {
            fields.push(FieldDescription {
                name: body.get_nul_bytestr()?,
                table_oid: body.try_get_u32()?,
                column: body.try_get_i16()?,
                type_oid: body.try_get_u32()?,
                type_size: body.try_get_i16()?,
                type_modifier: body.try_get_i32()?,
                format: PgFormat::from_code(body.try_get_u16()?)?,
            });
        }
        Ok(Self { fields })
    }
}

macro_rules! unit_msg {
    ($(
        $(#[$doc:meta])* struct $name:ident, $ty:literal;
    )*) => {$(
            $(#[$doc])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq)]
            pub struct $name;

            impl $name {
                pub const MSGTYPE: u8 = $ty;
            }

            impl BackendProtocol for $name {
                fn decode(msgtype: u8, _: Bytes) -> Result<Self,ProtocolError> {
                    assert_msgtype!(msgtype);
                    Ok(Self)
                }
            }
    )*};
}

unit_msg! {
    /// Identifies the message as a Bind-complete indicator.
    struct BindComplete, b'2';

    /// Identifies the message as a Close-complete indicator.
    struct CloseComplete, b'3';

    /// Identifies the message as a COPY-complete indicator.
    struct CopyDone, b'c';

    /// Identifies the message as a response to an empty query string.
    ///
    /// This substitutes for CommandComplete.
    struct EmptyQueryResponse, b'I';

    /// Identifies the message as a no-data indicator.
    struct NoData, b'n';

    /// Identifies the message as a Parse-complete indicator.
    struct ParseComplete, b'1';

    /// Identifies the message as a portal-suspended indicator.
    ///
    /// Note this only appears if an Execute message's row-count limit was reached.
    struct PortalSuspended, b's';
}

#[cfg(test)]
mod test {
    use super::*;

    fn command(tag: &'static str) -> CommandComplete {
        CommandComplete::parse(ByteStr::from_static(tag))
    }

    #[test]
    fn command_complete_tag() {
        let insert = command("INSERT 0 1");
        assert_eq!(insert.command, "INSERT");
        assert_eq!(insert.row_id, Some(0));
        assert_eq!(insert.rows, Some(1));

        let update = command("UPDATE 5");
        assert_eq!(update.command, "UPDATE");
        assert_eq!(update.row_id, None);
        assert_eq!(update.rows, Some(5));

        let begin = command("BEGIN");
        assert_eq!(begin.command, "BEGIN");
        assert_eq!(begin.row_id, None);
        assert_eq!(begin.rows, None);

        let select = command("SELECT 12");
        assert_eq!(select.rows, Some(12));

        let create = command("CREATE TABLE");
        assert_eq!(create.command, "CREATE");
        assert_eq!(create.rows, None);
    }

    #[test]
    fn authentication_requests() {
        let auth = Authentication::decode(b'R', Bytes::from_static(b"\0\0\0\x05abcd")).unwrap();
        assert_eq!(auth, Authentication::MD5Password { salt: *b"abcd" });

        let auth = Authentication::decode(
            b'R',
            Bytes::from_static(b"\0\0\0\x0aSCRAM-SHA-256-PLUS\0SCRAM-SHA-256\0\0"),
        )
        .unwrap();
        let Authentication::SASL { mechanisms } = auth else { panic!("expected SASL") };
        assert_eq!(mechanisms, ["SCRAM-SHA-256-PLUS", "SCRAM-SHA-256"].map(ByteStr::from));

        let auth = Authentication::decode(b'R', Bytes::from_static(b"\0\0\0\x0bserver-first")).unwrap();
        assert_eq!(auth, Authentication::SASLContinue { data: Bytes::from_static(b"server-first") });

        let err = Authentication::decode(b'R', Bytes::from_static(b"\0\0\0\x04")).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownAuth { auth: 4 }));
    }

    #[test]
    fn unknown_message_type() {
        let err = BackendMessage::decode(b'?', Bytes::new()).unwrap_err();
        assert!(matches!(err, ProtocolError::Unexpected { expect: None, found: b'?', .. }));
        assert_eq!(err.to_string(), "Unknown message type `?`");
    }

    #[test]
    fn ready_for_query_status() {
        for (byte, status) in [
            (b'I', TransactionStatus::Idle),
            (b'T', TransactionStatus::Open),
            (b'E', TransactionStatus::Failed),
        ] {
            let msg = ReadyForQuery::decode(b'Z', Bytes::copy_from_slice(&[byte])).unwrap();
            assert_eq!(msg.status, status);
            assert_eq!(status.as_byte(), byte);
        }
        assert!(ReadyForQuery::decode(b'Z', Bytes::from_static(b"X")).is_err());
    }

    #[test]
    fn data_row_values() {
        let body = Bytes::from_static(b"\0\x02\0\0\0\x0342a\xff\xff\xff\xff");
        let row = DataRow::decode(b'D', body).unwrap();
        assert_eq!(row.columns, vec![Some(Bytes::from_static(b"42a")), None]);

        let short = Bytes::from_static(b"\0\x01\0\0\0\x09");
        assert!(matches!(DataRow::decode(b'D', short), Err(ProtocolError::Truncated { .. })));
    }
}
