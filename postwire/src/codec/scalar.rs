//! Boolean and numeric codecs.
use super::{Codec, DecodeError, EncodeError, Kind, Parameter, Value, fixed, text};
use crate::postgres::{Oid, PgFormat, oid};

/// `bool`, text `t`/`f` or single binary byte.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolCodec;

impl Codec for BoolCodec {
    fn kind(&self) -> Kind {
        Kind::Bool
    }

    fn can_decode(&self, _: PgFormat, oid: Oid, kind: Kind) -> bool {
        kind == Kind::Bool && oid == oid::BOOL
    }

    fn decode(&self, value: &[u8], format: PgFormat, _: Oid) -> Result<Value, DecodeError> {
        let value = match format {
            PgFormat::Binary => fixed::<1>(value, Kind::Bool)?[0] != 0,
            PgFormat::Text => match text(value, Kind::Bool)? {
                "t" | "TRUE" => true,
                "f" | "FALSE" => false,
                other => return Err(DecodeError::invalid(Kind::Bool, format!("found {other:?}"))),
            },
        };
        Ok(Value::Bool(value))
    }

    fn encode(&self, value: Value) -> Result<Parameter, EncodeError> {
        match value {
            Value::Bool(value) => Ok(Parameter::new(PgFormat::Binary, oid::BOOL, vec![value as u8])),
            Value::Null(Kind::Bool) => Ok(Parameter::null(PgFormat::Binary, oid::BOOL)),
            value => Err(EncodeError::Unsupported { kind: value.kind() }),
        }
    }
}

/// Fixed width numeric codec: big endian binary, or text parsed with [`std::str::FromStr`].
macro_rules! numeric {
    ($(#[$doc:meta])* $name:ident, $kind:ident, $ty:ty, $oid:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl Codec for $name {
            fn kind(&self) -> Kind {
                Kind::$kind
            }

            fn can_decode(&self, _: PgFormat, oid: Oid, kind: Kind) -> bool {
                kind == Kind::$kind && oid == oid::$oid
            }

            fn decode(&self, value: &[u8], format: PgFormat, _: Oid) -> Result<Value, DecodeError> {
                let value = match format {
                    PgFormat::Binary => <$ty>::from_be_bytes(fixed(value, Kind::$kind)?),
                    PgFormat::Text => {
                        let value = text(value, Kind::$kind)?;
                        value.parse::<$ty>().map_err(|err| {
                            DecodeError::invalid(Kind::$kind, format!("{value:?}, {err}"))
                        })?
                    }
                };
                Ok(Value::$kind(value))
            }

            fn encode(&self, value: Value) -> Result<Parameter, EncodeError> {
                match value {
                    Value::$kind(value) => Ok(Parameter::new(
                        PgFormat::Binary,
                        oid::$oid,
                        value.to_be_bytes().to_vec(),
                    )),
                    Value::Null(Kind::$kind) => Ok(Parameter::null(PgFormat::Binary, oid::$oid)),
                    value => Err(EncodeError::Unsupported { kind: value.kind() }),
                }
            }
        }
    };
}

numeric!(
    /// `int2`, `smallint`
    Int2Codec, Int2, i16, INT2
);
numeric!(
    /// `int4`, `integer`
    Int4Codec, Int4, i32, INT4
);
numeric!(
    /// `int8`, `bigint`
    Int8Codec, Int8, i64, INT8
);
numeric!(
    /// `float4`, `real`, text accepts `NaN` and `Infinity`
    Float4Codec, Float4, f32, FLOAT4
);
numeric!(
    /// `float8`, `double precision`, text accepts `NaN` and `Infinity`
    Float8Codec, Float8, f64, FLOAT8
);

#[cfg(test)]
mod test {
    use super::*;
    use crate::codec::Codecs;

    fn roundtrip<T>(codecs: &Codecs, value: T) -> T
    where
        T: crate::codec::Encode + crate::codec::Decode + Clone,
    {
        let param = codecs.encode(value).unwrap();
        codecs.decode(param.value.as_deref(), param.format, param.oid).unwrap()
    }

    #[test]
    fn bool_text_and_binary() {
        let codecs = Codecs::default();
        for (input, expected) in [("t", true), ("TRUE", true), ("f", false), ("FALSE", false)] {
            let value: bool = codecs.decode(Some(input.as_bytes()), PgFormat::Text, oid::BOOL).unwrap();
            assert_eq!(value, expected, "{input}");
        }
        for input in ["yes", "true", "false", "True"] {
            assert!(codecs.decode::<bool>(Some(input.as_bytes()), PgFormat::Text, oid::BOOL).is_err(), "{input}");
        }
        assert!(codecs.decode::<bool>(Some(&b"\x01"[..]), PgFormat::Binary, oid::BOOL).unwrap());
        assert!(!roundtrip(&codecs, false));
        assert!(roundtrip(&codecs, true));
    }

    #[test]
    fn integer_boundaries() {
        let codecs = Codecs::default();
        for value in [i16::MIN, -1, 0, i16::MAX] {
            assert_eq!(roundtrip(&codecs, value), value);
        }
        for value in [i32::MIN, 0, i32::MAX] {
            assert_eq!(roundtrip(&codecs, value), value);
        }
        for value in [i64::MIN, 0, i64::MAX] {
            assert_eq!(roundtrip(&codecs, value), value);
        }

        let value: i64 = codecs
            .decode(Some(&b"-9223372036854775808"[..]), PgFormat::Text, oid::INT8)
            .unwrap();
        assert_eq!(value, i64::MIN);
        assert!(codecs.decode::<i16>(Some(&b"32768"[..]), PgFormat::Text, oid::INT2).is_err());
    }

    #[test]
    fn binary_width_is_checked() {
        let codecs = Codecs::default();
        let err = codecs.decode::<i32>(Some(&b"\0\0\x01"[..]), PgFormat::Binary, oid::INT4).unwrap_err();
        assert_eq!(err.to_string(), "invalid i32 value, expected 4 bytes, found 3");
    }

    #[test]
    fn float_specials() {
        let codecs = Codecs::default();
        let nan: f64 = codecs.decode(Some(&b"NaN"[..]), PgFormat::Text, oid::FLOAT8).unwrap();
        assert!(nan.is_nan());
        let inf: f32 = codecs.decode(Some(&b"-Infinity"[..]), PgFormat::Text, oid::FLOAT4).unwrap();
        assert_eq!(inf, f32::NEG_INFINITY);
        assert_eq!(roundtrip(&codecs, f64::MAX), f64::MAX);
        assert_eq!(roundtrip(&codecs, f32::MIN_POSITIVE), f32::MIN_POSITIVE);
        assert!(roundtrip(&codecs, f64::NAN).is_nan());
    }

    #[test]
    fn integer_does_not_decode_other_oid() {
        let codecs = Codecs::default();
        assert!(matches!(
            codecs.decode::<i64>(Some(&b"1"[..]), PgFormat::Text, oid::INT4),
            Err(DecodeError::Unsupported { .. })
        ));
    }
}
