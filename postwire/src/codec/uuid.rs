use ::uuid::Uuid;

use super::{Codec, DecodeError, EncodeError, Kind, Parameter, Value, fixed, text, value};
use crate::postgres::{Oid, PgFormat, oid};

value! {
    Uuid => Uuid;
}

/// `uuid`, 16 bytes in binary format.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidCodec;

impl Codec for UuidCodec {
    fn kind(&self) -> Kind {
        Kind::Uuid
    }

    fn can_decode(&self, _: PgFormat, oid: Oid, kind: Kind) -> bool {
        kind == Kind::Uuid && oid == oid::UUID
    }

    fn decode(&self, value: &[u8], format: PgFormat, _: Oid) -> Result<Value, DecodeError> {
        let uuid = match format {
            PgFormat::Binary => {
                let bytes = fixed::<16>(value, Kind::Uuid)?;
                let mut hi = [0u8; 8];
                let mut lo = [0u8; 8];
                hi.copy_from_slice(&bytes[..8]);
                lo.copy_from_slice(&bytes[8..]);
                Uuid::from_u64_pair(u64::from_be_bytes(hi), u64::from_be_bytes(lo))
            }
            PgFormat::Text => Uuid::parse_str(text(value, Kind::Uuid)?)
                .map_err(|err| DecodeError::invalid(Kind::Uuid, err.to_string()))?,
        };
        Ok(Value::Uuid(uuid))
    }

    fn encode(&self, value: Value) -> Result<Parameter, EncodeError> {
        match value {
            Value::Uuid(uuid) => {
                let (hi, lo) = uuid.as_u64_pair();
                let mut buf = Vec::with_capacity(16);
                buf.extend_from_slice(&hi.to_be_bytes());
                buf.extend_from_slice(&lo.to_be_bytes());
                Ok(Parameter::new(PgFormat::Binary, oid::UUID, buf))
            }
            Value::Null(Kind::Uuid) => Ok(Parameter::null(PgFormat::Binary, oid::UUID)),
            value => Err(EncodeError::Unsupported { kind: value.kind() }),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::codec::Codecs;

    #[test]
    fn uuid_formats() {
        let codecs = Codecs::default();
        let text: &[u8] = b"a1a2a3a4-b1b2-c1c2-d1d2-d3d4d5d6d7d8";
        let value: Uuid = codecs.decode(Some(text), PgFormat::Text, oid::UUID).unwrap();
        assert_eq!(value.as_u64_pair(), (0xa1a2a3a4b1b2c1c2, 0xd1d2d3d4d5d6d7d8));

        let param = codecs.encode(value).unwrap();
        assert_eq!(param.format, PgFormat::Binary);
        assert_eq!(param.value.as_deref().map(<[u8]>::len), Some(16));

        let decoded: Uuid = codecs.decode(param.value.as_deref(), param.format, param.oid).unwrap();
        assert_eq!(decoded, value);

        let max: Uuid = codecs.decode(Some(&[0xff; 16][..]), PgFormat::Binary, oid::UUID).unwrap();
        assert_eq!(max, Uuid::from_u128(u128::MAX));
        assert!(codecs.decode::<Uuid>(Some(&b"not-a-uuid"[..]), PgFormat::Text, oid::UUID).is_err());
    }
}
