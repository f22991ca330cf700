//! Error and Notice message fields.
//!
//! <https://www.postgresql.org/docs/current/protocol-error-fields.html>
use bytes::{Buf, Bytes};

use super::ProtocolError;
use crate::{common::ByteStr, ext::BytesExt};

/// Type of an [`ErrorResponse`][1] or [`NoticeResponse`][2] field.
///
/// [1]: super::backend::ErrorResponse
/// [2]: super::backend::NoticeResponse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// `C` the SQLSTATE code for the error.
    Code,
    /// `c` name of the column associated with the error.
    ColumnName,
    /// `n` name of the constraint associated with the error.
    ConstraintName,
    /// `d` name of the data type associated with the error.
    DataTypeName,
    /// `D` an optional secondary error message carrying more detail about the problem.
    Detail,
    /// `F` the file name of the source-code location where the error was reported.
    File,
    /// `H` an optional suggestion what to do about the problem.
    Hint,
    /// `p` error cursor position as an index into the internally generated command.
    InternalPosition,
    /// `q` the text of a failed internally-generated command.
    InternalQuery,
    /// `L` the line number of the source-code location where the error was reported.
    Line,
    /// `M` the primary human-readable error message.
    Message,
    /// `P` error cursor position as an index into the original query string.
    Position,
    /// `R` the name of the source-code routine reporting the error.
    Routine,
    /// `s` name of the schema containing the object associated with the error.
    SchemaName,
    /// `S` the severity, possibly localized.
    SeverityLocalized,
    /// `V` the severity, never localized.
    SeverityNonLocalized,
    /// `t` name of the table associated with the error.
    TableName,
    /// `W` call stack traceback of the active procedural language function.
    Where,
    /// Field type not known by this library.
    ///
    /// Frontends should silently ignore fields of unrecognized type.
    Unknown(u8),
}

impl FieldType {
    /// Map a field type code, unrecognized codes map to [`FieldType::Unknown`].
    pub fn from_code(code: u8) -> Self {
        match code {
            b'C' => Self::Code,
            b'c' => Self::ColumnName,
            b'n' => Self::ConstraintName,
            b'd' => Self::DataTypeName,
            b'D' => Self::Detail,
            b'F' => Self::File,
            b'H' => Self::Hint,
            b'p' => Self::InternalPosition,
            b'q' => Self::InternalQuery,
            b'L' => Self::Line,
            b'M' => Self::Message,
            b'P' => Self::Position,
            b'R' => Self::Routine,
            b's' => Self::SchemaName,
            b'S' => Self::SeverityLocalized,
            b'V' => Self::SeverityNonLocalized,
            b't' => Self::TableName,
            b'W' => Self::Where,
            code => Self::Unknown(code),
        }
    }

    /// Returns the field type code.
    pub fn code(&self) -> u8 {
        match self {
            Self::Code => b'C',
            Self::ColumnName => b'c',
            Self::ConstraintName => b'n',
            Self::DataTypeName => b'd',
            Self::Detail => b'D',
            Self::File => b'F',
            Self::Hint => b'H',
            Self::InternalPosition => b'p',
            Self::InternalQuery => b'q',
            Self::Line => b'L',
            Self::Message => b'M',
            Self::Position => b'P',
            Self::Routine => b'R',
            Self::SchemaName => b's',
            Self::SeverityLocalized => b'S',
            Self::SeverityNonLocalized => b'V',
            Self::TableName => b't',
            Self::Where => b'W',
            Self::Unknown(code) => *code,
        }
    }
}

/// One identified field of an error or notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub kind: FieldType,
    pub value: ByteStr,
}

impl Field {
    pub fn new(kind: FieldType, value: impl Into<ByteStr>) -> Self {
        Self { kind, value: value.into() }
    }

    /// Decode the fields of an error or notice message body.
    ///
    /// Decoding stops at the zero terminator, a body without terminator is accepted.
    pub fn decode(mut body: Bytes) -> Result<Vec<Field>, ProtocolError> {
        let mut fields = Vec::new();
        while body.has_remaining() {
            let code = body.get_u8();
            if code == b'\0' {
                break;
            }
            let value = body.get_nul_bytestr()?;
            fields.push(Field { kind: FieldType::from_code(code), value });
        }
        Ok(fields)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decode_error_fields() {
        let body = Bytes::from_static(b"SERROR\0C42601\0Msyntax error\0\0");
        let fields = Field::decode(body).unwrap();
        assert_eq!(
            fields,
            vec![
                Field::new(FieldType::SeverityLocalized, "ERROR"),
                Field::new(FieldType::Code, "42601"),
                Field::new(FieldType::Message, "syntax error"),
            ]
        );
    }

    #[test]
    fn unknown_field_type() {
        let body = Bytes::from_static(b"Zfuture\0Mok\0\0");
        let fields = Field::decode(body).unwrap();
        assert_eq!(fields[0].kind, FieldType::Unknown(b'Z'));
        assert_eq!(fields[0].value, "future");
        assert_eq!(fields[1].kind, FieldType::Message);
    }

    #[test]
    fn field_code_roundtrip() {
        for code in b"CcndDFHpqLMPRsSVtW" {
            let kind = FieldType::from_code(*code);
            assert!(!matches!(kind, FieldType::Unknown(_)));
            assert_eq!(kind.code(), *code);
        }
    }

    #[test]
    fn unterminated_value() {
        let body = Bytes::from_static(b"Msyntax");
        assert!(Field::decode(body).is_err());
    }
}
