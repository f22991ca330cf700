use serde::{Deserialize, Serialize, de::DeserializeOwned};

use super::{Codec, Decode, DecodeError, Encode, EncodeError, Kind, Parameter, Value, value};
use crate::postgres::{Oid, PgFormat, oid};

value! {
    serde_json::Value => Json;
}

/// `jsonb` binary format version.
const JSONB_VERSION: u8 = 1;

/// `json` and `jsonb`, encoded as `json` text.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn kind(&self) -> Kind {
        Kind::Json
    }

    fn can_decode(&self, _: PgFormat, oid: Oid, kind: Kind) -> bool {
        kind == Kind::Json && matches!(oid, oid::JSON | oid::JSONB)
    }

    fn decode(&self, value: &[u8], format: PgFormat, oid: Oid) -> Result<Value, DecodeError> {
        let value = match (oid, format) {
            (oid::JSONB, PgFormat::Binary) => match value.split_first() {
                Some((&JSONB_VERSION, json)) => json,
                _ => return Err(DecodeError::invalid(Kind::Json, "unsupported jsonb version")),
            },
            _ => value,
        };
        Ok(Value::Json(serde_json::from_slice(value)?))
    }

    fn encode(&self, value: Value) -> Result<Parameter, EncodeError> {
        match value {
            Value::Json(json) => Ok(Parameter::new(PgFormat::Text, oid::JSON, serde_json::to_vec(&json)?)),
            Value::Null(Kind::Json) => Ok(Parameter::null(PgFormat::Text, oid::JSON)),
            value => Err(EncodeError::Unsupported { kind: value.kind() }),
        }
    }
}

/// Decode and Encode postgres json value through [`serde`].
///
/// ```no_run
/// # async fn app(row: postwire::Row) -> postwire::Result<()> {
/// use postwire::codec::Json;
///
/// #[derive(serde::Deserialize)]
/// struct Profile {
///     name: String,
/// }
///
/// let Json(profile): Json<Profile> = row.get("profile")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Json<T>(pub T);

impl<T: DeserializeOwned> Decode for Json<T> {
    const KIND: Kind = Kind::Json;

    fn from_value(value: Value) -> Result<Self, DecodeError> {
        let json = serde_json::Value::from_value(value)?;
        Ok(Json(serde_json::from_value(json)?))
    }
}

impl<T: Serialize> Encode for Json<T> {
    const KIND: Kind = Kind::Json;

    fn into_value(self) -> Result<Value, EncodeError> {
        Ok(Value::Json(serde_json::to_value(&self.0)?))
    }
}

impl<T: Serialize> Serialize for Json<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Json<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(Self(T::deserialize(deserializer)?))
    }
}
