//! Conversion between postgres wire values and rust values.
//!
//! A [`Codec`] converts one kind of [`Value`] from and to the wire, for the exact
//! set of [`Oid`] and [`PgFormat`] it declares. [`Codecs`] dispatch to the first codec
//! that accepts a conversion.
//!
//! Rust types opt in with [`Decode`] and [`Encode`]:
//!
//! - `bool`, `i16`, `i32`, `i64`, `f32`, `f64`
//! - `String`, `&str`, `char`
//! - `Bytes`, `Vec<u8>`, `&[u8]`
//! - [`uuid::Uuid`], requires `uuid` feature
//! - [`time`][::time]'s `Date`, `Time`, `PrimitiveDateTime`, `UtcDateTime`, requires `time` feature
//! - [`serde_json::Value`] and [`Json`], requires `json` feature
//! - `Option<T>` of any of above, for NULL
use bytes::Bytes;
use std::fmt;

use crate::postgres::{Oid, OidFmt, PgFormat};

mod error;
mod scalar;
mod string;
#[cfg(feature = "uuid")]
mod uuid;
#[cfg(feature = "time")]
mod time;
#[cfg(feature = "json")]
mod json;

pub use error::{DecodeError, EncodeError};
pub use scalar::{BoolCodec, Float4Codec, Float8Codec, Int2Codec, Int4Codec, Int8Codec};
pub use string::{ByteaCodec, CharCodec, TextCodec};
#[cfg(feature = "uuid")]
pub use self::uuid::UuidCodec;
#[cfg(feature = "time")]
pub use self::time::{DateCodec, TimeCodec, TimestampCodec, TimestampTzCodec};
#[cfg(feature = "json")]
pub use json::{Json, JsonCodec};

/// An encoded parameter value, ready to be sent in `Bind`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub format: PgFormat,
    pub oid: Oid,
    /// Encoded value, [`None`] for NULL.
    pub value: Option<Bytes>,
}

impl Parameter {
    pub fn new(format: PgFormat, oid: Oid, value: impl Into<Bytes>) -> Self {
        Self { format, oid, value: Some(value.into()) }
    }

    pub fn null(format: PgFormat, oid: Oid) -> Self {
        Self { format, oid, value: None }
    }
}

/// Kind of rust value a [`Codec`] converts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Bool,
    Int2,
    Int4,
    Int8,
    Float4,
    Float8,
    Text,
    Char,
    Bytea,
    #[cfg(feature = "uuid")]
    Uuid,
    #[cfg(feature = "time")]
    Date,
    #[cfg(feature = "time")]
    Time,
    #[cfg(feature = "time")]
    Timestamp,
    #[cfg(feature = "time")]
    TimestampTz,
    #[cfg(feature = "json")]
    Json,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Kind::Bool => "bool",
            Kind::Int2 => "i16",
            Kind::Int4 => "i32",
            Kind::Int8 => "i64",
            Kind::Float4 => "f32",
            Kind::Float8 => "f64",
            Kind::Text => "String",
            Kind::Char => "char",
            Kind::Bytea => "Bytes",
            #[cfg(feature = "uuid")]
            Kind::Uuid => "Uuid",
            #[cfg(feature = "time")]
            Kind::Date => "Date",
            #[cfg(feature = "time")]
            Kind::Time => "Time",
            #[cfg(feature = "time")]
            Kind::Timestamp => "PrimitiveDateTime",
            #[cfg(feature = "time")]
            Kind::TimestampTz => "UtcDateTime",
            #[cfg(feature = "json")]
            Kind::Json => "serde_json::Value",
        })
    }
}

/// A decoded, or to be encoded, scalar value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// NULL of given kind.
    Null(Kind),
    Bool(bool),
    Int2(i16),
    Int4(i32),
    Int8(i64),
    Float4(f32),
    Float8(f64),
    Text(String),
    Char(char),
    Bytea(Bytes),
    #[cfg(feature = "uuid")]
    Uuid(::uuid::Uuid),
    #[cfg(feature = "time")]
    Date(::time::Date),
    #[cfg(feature = "time")]
    Time(::time::Time),
    #[cfg(feature = "time")]
    Timestamp(::time::PrimitiveDateTime),
    #[cfg(feature = "time")]
    TimestampTz(::time::UtcDateTime),
    #[cfg(feature = "json")]
    Json(serde_json::Value),
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Null(kind) => *kind,
            Value::Bool(_) => Kind::Bool,
            Value::Int2(_) => Kind::Int2,
            Value::Int4(_) => Kind::Int4,
            Value::Int8(_) => Kind::Int8,
            Value::Float4(_) => Kind::Float4,
            Value::Float8(_) => Kind::Float8,
            Value::Text(_) => Kind::Text,
            Value::Char(_) => Kind::Char,
            Value::Bytea(_) => Kind::Bytea,
            #[cfg(feature = "uuid")]
            Value::Uuid(_) => Kind::Uuid,
            #[cfg(feature = "time")]
            Value::Date(_) => Kind::Date,
            #[cfg(feature = "time")]
            Value::Time(_) => Kind::Time,
            #[cfg(feature = "time")]
            Value::Timestamp(_) => Kind::Timestamp,
            #[cfg(feature = "time")]
            Value::TimestampTz(_) => Kind::TimestampTz,
            #[cfg(feature = "json")]
            Value::Json(_) => Kind::Json,
        }
    }
}

/// Bidirectional conversion of one [`Kind`] of value.
pub trait Codec: Send + Sync + 'static {
    /// The kind of value this codec produces and consumes.
    fn kind(&self) -> Kind;

    /// Returns `true` if this codec can decode a `format` value of type `oid` into `kind`.
    fn can_decode(&self, format: PgFormat, oid: Oid, kind: Kind) -> bool;

    /// Decode a non NULL value.
    fn decode(&self, value: &[u8], format: PgFormat, oid: Oid) -> Result<Value, DecodeError>;

    /// Returns `true` if this codec can encode `value`, NULL included.
    fn can_encode(&self, value: &Value) -> bool {
        value.kind() == self.kind()
    }

    /// Encode value into a [`Parameter`].
    fn encode(&self, value: Value) -> Result<Parameter, EncodeError>;
}

/// Registry of [`Codec`], dispatched in registration order.
pub struct Codecs {
    codecs: Vec<Box<dyn Codec>>,
}

impl Codecs {
    /// Registry without any codec.
    pub fn empty() -> Self {
        Self { codecs: vec![] }
    }

    /// Register a codec that take precedence over all previously registered codecs.
    pub fn register(&mut self, codec: impl Codec) -> &mut Self {
        self.codecs.insert(0, Box::new(codec));
        self
    }

    /// Decode a column `value` of given type `oid` into `T`.
    pub fn decode<T: Decode>(
        &self,
        value: Option<&[u8]>,
        format: PgFormat,
        oid: Oid,
    ) -> Result<T, DecodeError> {
        let codec = self
            .codecs
            .iter()
            .find(|codec| codec.can_decode(format, oid, T::KIND))
            .ok_or(DecodeError::Unsupported { oid, format, target: T::KIND })?;

        match value {
            Some(value) => T::from_value(codec.decode(value, format, oid)?),
            None => T::from_null(),
        }
    }

    /// Encode `value` into a [`Parameter`].
    pub fn encode<T: Encode>(&self, value: T) -> Result<Parameter, EncodeError> {
        let value = value.into_value()?;
        match self.codecs.iter().find(|codec| codec.can_encode(&value)) {
            Some(codec) => codec.encode(value),
            None => Err(EncodeError::Unsupported { kind: value.kind() }),
        }
    }
}

impl Default for Codecs {
    /// Registry of every builtin codec.
    fn default() -> Self {
        let mut codecs: Vec<Box<dyn Codec>> = vec![
            Box::new(BoolCodec),
            Box::new(Int2Codec),
            Box::new(Int4Codec),
            Box::new(Int8Codec),
            Box::new(Float4Codec),
            Box::new(Float8Codec),
            Box::new(TextCodec),
            Box::new(CharCodec),
            Box::new(ByteaCodec),
        ];
        #[cfg(feature = "uuid")]
        codecs.push(Box::new(UuidCodec));
        #[cfg(feature = "time")]
        codecs.extend([
            Box::new(DateCodec) as Box<dyn Codec>,
            Box::new(TimeCodec),
            Box::new(TimestampCodec),
            Box::new(TimestampTzCodec),
        ]);
        #[cfg(feature = "json")]
        codecs.push(Box::new(JsonCodec));
        Self { codecs }
    }
}

impl fmt::Debug for Codecs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.codecs.iter().map(|codec| codec.kind())).finish()
    }
}

/// Type that can be decoded from a column value.
pub trait Decode: Sized {
    /// Kind of value requested from the [`Codecs`].
    const KIND: Kind;

    /// Convert from decoded value.
    fn from_value(value: Value) -> Result<Self, DecodeError>;

    /// Convert from NULL.
    fn from_null() -> Result<Self, DecodeError> {
        Err(DecodeError::Null)
    }
}

/// Type that can be encoded as a parameter.
pub trait Encode {
    /// Kind of value, used to type a NULL.
    const KIND: Kind;

    /// Convert into value to encode.
    fn into_value(self) -> Result<Value, EncodeError>;
}

impl<T: Decode> Decode for Option<T> {
    const KIND: Kind = T::KIND;

    fn from_value(value: Value) -> Result<Self, DecodeError> {
        T::from_value(value).map(Some)
    }

    fn from_null() -> Result<Self, DecodeError> {
        Ok(None)
    }
}

impl<T: Encode> Encode for Option<T> {
    const KIND: Kind = T::KIND;

    fn into_value(self) -> Result<Value, EncodeError> {
        match self {
            Some(value) => value.into_value(),
            None => Ok(Value::Null(T::KIND)),
        }
    }
}

/// Implement [`Decode`] and [`Encode`] for a type held by a [`Value`] variant.
macro_rules! value {
    ($($ty:ty => $variant:ident;)*) => {$(
        impl $crate::codec::Decode for $ty {
            const KIND: $crate::codec::Kind = $crate::codec::Kind::$variant;

            fn from_value(
                value: $crate::codec::Value,
            ) -> Result<Self, $crate::codec::DecodeError> {
                match value {
                    $crate::codec::Value::$variant(value) => Ok(value),
                    value => Err($crate::codec::DecodeError::mismatch(
                        $crate::codec::Kind::$variant,
                        value.kind(),
                    )),
                }
            }
        }

        impl $crate::codec::Encode for $ty {
            const KIND: $crate::codec::Kind = $crate::codec::Kind::$variant;

            fn into_value(self) -> Result<$crate::codec::Value, $crate::codec::EncodeError> {
                Ok($crate::codec::Value::$variant(self))
            }
        }
    )*};
}

pub(crate) use value;

value! {
    bool => Bool;
    i16 => Int2;
    i32 => Int4;
    i64 => Int8;
    f32 => Float4;
    f64 => Float8;
    String => Text;
    char => Char;
    Bytes => Bytea;
}

impl Encode for &str {
    const KIND: Kind = Kind::Text;

    fn into_value(self) -> Result<Value, EncodeError> {
        Ok(Value::Text(self.to_owned()))
    }
}

impl Decode for Vec<u8> {
    const KIND: Kind = Kind::Bytea;

    fn from_value(value: Value) -> Result<Self, DecodeError> {
        Bytes::from_value(value).map(Vec::from)
    }
}

impl Encode for Vec<u8> {
    const KIND: Kind = Kind::Bytea;

    fn into_value(self) -> Result<Value, EncodeError> {
        Ok(Value::Bytea(self.into()))
    }
}

impl Encode for &[u8] {
    const KIND: Kind = Kind::Bytea;

    fn into_value(self) -> Result<Value, EncodeError> {
        Ok(Value::Bytea(Bytes::copy_from_slice(self)))
    }
}

/// Read `value` as UTF-8 text for given kind.
pub(crate) fn text(value: &[u8], kind: Kind) -> Result<&str, DecodeError> {
    std::str::from_utf8(value).map_err(|_| DecodeError::invalid(kind, "invalid utf8"))
}

/// Read `value` as fixed size big endian bytes for given kind.
pub(crate) fn fixed<const N: usize>(value: &[u8], kind: Kind) -> Result<[u8; N], DecodeError> {
    value.try_into().map_err(|_| {
        DecodeError::invalid(kind, format!("expected {N} bytes, found {}", value.len()))
    })
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", OidFmt(self.oid), self.format)
    }
}
