use std::{borrow::Cow, fmt, str::Utf8Error};

use super::Kind;
use crate::postgres::{Oid, OidFmt, PgFormat};

/// An error when decoding a column value.
pub enum DecodeError {
    /// No codec converts the value into requested kind.
    Unsupported { oid: Oid, format: PgFormat, target: Kind },
    /// Value is not valid for its type.
    Invalid { kind: Kind, reason: Cow<'static, str> },
    /// Decoded value is not of the requested kind.
    Mismatch { expected: Kind, found: Kind },
    /// Column requested not found.
    ColumnNotFound { name: String, columns: Vec<String> },
    /// Index requested is out of bounds.
    IndexOutOfBounds { index: usize, len: usize },
    /// Row column count does not match its description.
    ColumnCount { described: usize, found: usize },
    /// Value is NULL.
    Null,
    /// Postgres return non utf8 string.
    Utf8(Utf8Error),
    /// Failed to deserialize using `serde_json`.
    #[cfg(feature = "json")]
    Json(serde_json::Error),
}

impl DecodeError {
    pub(crate) fn invalid(kind: Kind, reason: impl Into<Cow<'static, str>>) -> Self {
        Self::Invalid { kind, reason: reason.into() }
    }

    pub(crate) fn mismatch(expected: Kind, found: Kind) -> Self {
        Self::Mismatch { expected, found }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported { oid, format, target } => write!(
                f,
                "cannot decode value of type {} in {format:?} format into {target}",
                OidFmt(*oid),
            ),
            Self::Invalid { kind, reason } => write!(f, "invalid {kind} value, {reason}"),
            Self::Mismatch { expected, found } => {
                write!(f, "expected {expected} value, found {found}")
            }
            Self::ColumnNotFound { name, columns } => write!(
                f,
                "Column name '{name}' does not exist in column names [{}]",
                columns.join(", "),
            ),
            Self::IndexOutOfBounds { index, len } => write!(
                f,
                "Column index {index} is larger than the number of columns {len}"
            ),
            Self::ColumnCount { described, found } => write!(
                f,
                "row contains {found} columns, but {described} columns are described"
            ),
            Self::Null => f.write_str("unexpected NULL value"),
            Self::Utf8(e) => write!(f, "{e}"),
            #[cfg(feature = "json")]
            Self::Json(e) => write!(f, "{e}"),
        }
    }
}

impl From<Utf8Error> for DecodeError {
    fn from(value: Utf8Error) -> Self {
        Self::Utf8(value)
    }
}

#[cfg(feature = "json")]
impl From<serde_json::Error> for DecodeError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl std::error::Error for DecodeError { }

impl fmt::Debug for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

/// An error when encoding a parameter value.
pub enum EncodeError {
    /// No codec encodes the value.
    Unsupported { kind: Kind },
    /// Value cannot be represented by its type.
    Invalid { kind: Kind, reason: Cow<'static, str> },
    /// Failed to serialize using `serde_json`.
    #[cfg(feature = "json")]
    Json(serde_json::Error),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported { kind } => write!(f, "cannot encode value of type {kind}"),
            Self::Invalid { kind, reason } => write!(f, "invalid {kind} value, {reason}"),
            #[cfg(feature = "json")]
            Self::Json(e) => write!(f, "{e}"),
        }
    }
}

#[cfg(feature = "json")]
impl From<serde_json::Error> for EncodeError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl std::error::Error for EncodeError { }

impl fmt::Debug for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}
