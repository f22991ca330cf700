//! Character and byte string codecs.
use bytes::{BufMut, Bytes, BytesMut};

use super::{Codec, DecodeError, EncodeError, Kind, Parameter, Value, text};
use crate::postgres::{Oid, PgFormat, oid};

/// Character types as `String`.
///
/// Also decodes `numeric` in text format, and `json` which is text in both formats.
/// Encodes as `varchar` text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec;

impl Codec for TextCodec {
    fn kind(&self) -> Kind {
        Kind::Text
    }

    fn can_decode(&self, format: PgFormat, oid: Oid, kind: Kind) -> bool {
        kind == Kind::Text
            && match oid {
                oid::TEXT | oid::VARCHAR | oid::BPCHAR | oid::NAME | oid::UNKNOWN | oid::XML => true,
                oid::JSON => true,
                oid::NUMERIC | oid::JSONB => format == PgFormat::Text,
                _ => false,
            }
    }

    fn decode(&self, value: &[u8], _: PgFormat, _: Oid) -> Result<Value, DecodeError> {
        Ok(Value::Text(text(value, Kind::Text)?.to_owned()))
    }

    fn encode(&self, value: Value) -> Result<Parameter, EncodeError> {
        match value {
            Value::Text(value) => Ok(Parameter::new(PgFormat::Text, oid::VARCHAR, value)),
            Value::Null(Kind::Text) => Ok(Parameter::null(PgFormat::Text, oid::VARCHAR)),
            value => Err(EncodeError::Unsupported { kind: value.kind() }),
        }
    }
}

/// Single character, `"char"` or `char(1)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharCodec;

impl Codec for CharCodec {
    fn kind(&self) -> Kind {
        Kind::Char
    }

    fn can_decode(&self, _: PgFormat, oid: Oid, kind: Kind) -> bool {
        kind == Kind::Char && matches!(oid, oid::CHAR | oid::BPCHAR)
    }

    fn decode(&self, value: &[u8], _: PgFormat, _: Oid) -> Result<Value, DecodeError> {
        let value = text(value, Kind::Char)?;
        let mut chars = value.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => Ok(Value::Char(ch)),
            _ => Err(DecodeError::invalid(Kind::Char, format!("expected one character, found {value:?}"))),
        }
    }

    fn encode(&self, value: Value) -> Result<Parameter, EncodeError> {
        match value {
            Value::Char(ch) => {
                let mut buf = [0u8; 4];
                let ch = ch.encode_utf8(&mut buf);
                Ok(Parameter::new(PgFormat::Text, oid::BPCHAR, Bytes::copy_from_slice(ch.as_bytes())))
            }
            Value::Null(Kind::Char) => Ok(Parameter::null(PgFormat::Text, oid::BPCHAR)),
            value => Err(EncodeError::Unsupported { kind: value.kind() }),
        }
    }
}

/// `bytea`, raw in binary format, hex `\x` in text format.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteaCodec;

const HEX: &[u8; 16] = b"0123456789abcdef";

fn unhex(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

impl Codec for ByteaCodec {
    fn kind(&self) -> Kind {
        Kind::Bytea
    }

    fn can_decode(&self, _: PgFormat, oid: Oid, kind: Kind) -> bool {
        kind == Kind::Bytea && oid == oid::BYTEA
    }

    fn decode(&self, value: &[u8], format: PgFormat, _: Oid) -> Result<Value, DecodeError> {
        if format == PgFormat::Binary {
            return Ok(Value::Bytea(Bytes::copy_from_slice(value)));
        }

        let Some(hex) = value.strip_prefix(b"\\x") else {
            return Err(DecodeError::invalid(Kind::Bytea, "expected hex format"));
        };
        if hex.len() % 2 != 0 {
            return Err(DecodeError::invalid(Kind::Bytea, "odd number of hex digits"));
        }

        let mut buf = BytesMut::with_capacity(hex.len() / 2);
        for pair in hex.chunks_exact(2) {
            match (unhex(pair[0]), unhex(pair[1])) {
                (Some(hi), Some(lo)) => buf.put_u8(hi << 4 | lo),
                _ => return Err(DecodeError::invalid(Kind::Bytea, "invalid hex digit")),
            }
        }
        Ok(Value::Bytea(buf.freeze()))
    }

    fn encode(&self, value: Value) -> Result<Parameter, EncodeError> {
        match value {
            Value::Bytea(value) => {
                let mut buf = BytesMut::with_capacity(2 + value.len() * 2);
                buf.put_slice(b"\\x");
                for byte in value.iter() {
                    buf.put_u8(HEX[(byte >> 4) as usize]);
                    buf.put_u8(HEX[(byte & 0xf) as usize]);
                }
                Ok(Parameter::new(PgFormat::Text, oid::BYTEA, buf.freeze()))
            }
            Value::Null(Kind::Bytea) => Ok(Parameter::null(PgFormat::Text, oid::BYTEA)),
            value => Err(EncodeError::Unsupported { kind: value.kind() }),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::codec::Codecs;

    #[test]
    fn text_types() {
        let codecs = Codecs::default();
        for oid in [oid::TEXT, oid::VARCHAR, oid::BPCHAR, oid::NAME, oid::UNKNOWN] {
            let value: String = codecs.decode(Some("héllo".as_bytes()), PgFormat::Binary, oid).unwrap();
            assert_eq!(value, "héllo");
        }

        let value: String = codecs.decode(Some(&b"3.14"[..]), PgFormat::Text, oid::NUMERIC).unwrap();
        assert_eq!(value, "3.14");
        assert!(codecs.decode::<String>(Some(&b"\0\x01"[..]), PgFormat::Binary, oid::NUMERIC).is_err());

        let param = codecs.encode("").unwrap();
        assert_eq!(param, Parameter::new(PgFormat::Text, oid::VARCHAR, ""));
        let value: String = codecs.decode(param.value.as_deref(), param.format, param.oid).unwrap();
        assert_eq!(value, "");
    }

    #[test]
    fn invalid_utf8() {
        let codecs = Codecs::default();
        let err = codecs.decode::<String>(Some(&b"\xff"[..]), PgFormat::Text, oid::TEXT).unwrap_err();
        assert_eq!(err.to_string(), "invalid String value, invalid utf8");
    }

    #[test]
    fn single_char() {
        let codecs = Codecs::default();
        let value: char = codecs.decode(Some("ß".as_bytes()), PgFormat::Text, oid::BPCHAR).unwrap();
        assert_eq!(value, 'ß');
        assert!(codecs.decode::<char>(Some(&b"ab"[..]), PgFormat::Text, oid::CHAR).is_err());
        assert!(codecs.decode::<char>(Some(&b""[..]), PgFormat::Text, oid::CHAR).is_err());

        let param = codecs.encode('ß').unwrap();
        let value: char = codecs.decode(param.value.as_deref(), param.format, param.oid).unwrap();
        assert_eq!(value, 'ß');
    }

    #[test]
    fn bytea_hex() {
        let codecs = Codecs::default();
        let param = codecs.encode(vec![0x00u8, 0xde, 0xad, 0xff]).unwrap();
        assert_eq!(param.value.as_deref(), Some(&b"\\x00deadff"[..]));

        let value: Vec<u8> = codecs.decode(param.value.as_deref(), param.format, param.oid).unwrap();
        assert_eq!(value, [0x00, 0xde, 0xad, 0xff]);

        let value: Bytes = codecs.decode(Some(&b"\\xDEAD"[..]), PgFormat::Text, oid::BYTEA).unwrap();
        assert_eq!(&value[..], &[0xde, 0xad]);

        let value: Bytes = codecs.decode(Some(&b"\\x"[..]), PgFormat::Text, oid::BYTEA).unwrap();
        assert!(value.is_empty());

        let value: Bytes = codecs.decode(Some(&b"\x01\x02"[..]), PgFormat::Binary, oid::BYTEA).unwrap();
        assert_eq!(&value[..], &[1, 2]);

        assert!(codecs.decode::<Bytes>(Some(&b"\\xabc"[..]), PgFormat::Text, oid::BYTEA).is_err());
        assert!(codecs.decode::<Bytes>(Some(&b"\\xzz"[..]), PgFormat::Text, oid::BYTEA).is_err());
    }
}
