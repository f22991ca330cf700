//! Protocol error
use std::{fmt, str::Utf8Error};

use super::BackendMessage;

/// An error when translating buffer from postgres.
///
/// Protocol errors are fatal, the connection state is unknown afterwards.
pub enum ProtocolError {
    /// Unknown or out of place message type.
    Unexpected {
        expect: Option<u8>,
        found: u8,
        phase: Option<&'static str>,
    },
    /// Unknown authentication request discriminator.
    UnknownAuth {
        auth: u32,
    },
    /// Unknown `ReadyForQuery` transaction status indicator.
    UnknownTransactionStatus {
        status: u8,
    },
    /// Format code other than text or binary.
    UnknownFormat {
        code: u16,
    },
    /// Message length smaller than the length field itself.
    InvalidLength {
        msgtype: u8,
        len: u32,
    },
    /// Message body shorter than its content requires.
    Truncated {
        requested: usize,
        available: usize,
    },
    /// Message body content violates the message format.
    Malformed {
        reason: &'static str,
    },
    Utf8(Utf8Error),
}

impl std::error::Error for ProtocolError { }

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ProtocolError::Unexpected { expect, found, phase } => {
                let found_name = BackendMessage::message_name(found);
                match expect {
                    Some(m) => write!(
                        f,
                        "Expected message `{}` found `{found_name}`",
                        BackendMessage::message_name(m),
                    )?,
                    None if found_name == "Unknown" => {
                        write!(f, "Unknown message type `{}`", found.escape_ascii())?
                    }
                    None => write!(f, "Unexpected message `{found_name}`")?,
                }
                if let Some(phase) = phase {
                    write!(f, " in `{phase}`")?
                }
                Ok(())
            },
            ProtocolError::UnknownAuth { auth } => {
                write!(f, "Unknown authentication request `{auth}`")
            },
            ProtocolError::UnknownTransactionStatus { status } => {
                write!(f, "Unknown transaction status `{}`", status.escape_ascii())
            },
            ProtocolError::UnknownFormat { code } => write!(f, "Unknown format code `{code}`"),
            ProtocolError::InvalidLength { msgtype, len } => write!(
                f,
                "Invalid length {len} for message `{}`",
                BackendMessage::message_name(msgtype)
            ),
            ProtocolError::Truncated { requested, available } => write!(
                f,
                "Message body too short, requested {requested} bytes but {available} available"
            ),
            ProtocolError::Malformed { reason } => write!(f, "Malformed message, {reason}"),
            ProtocolError::Utf8(ref e) => write!(f, "Invalid utf8 in message, {e}"),
        }
    }
}

impl fmt::Debug for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl From<bytes::TryGetError> for ProtocolError {
    fn from(e: bytes::TryGetError) -> Self {
        Self::Truncated { requested: e.requested, available: e.available }
    }
}

impl From<Utf8Error> for ProtocolError {
    fn from(e: Utf8Error) -> Self {
        Self::Utf8(e)
    }
}

impl ProtocolError {
    pub(crate) fn unknown(found: u8) -> ProtocolError {
        Self::Unexpected {
            expect: None,
            found,
            phase: None,
        }
    }

    pub(crate) fn unexpected(expect: u8, found: u8) -> ProtocolError {
        Self::Unexpected {
            expect: Some(expect),
            found,
            phase: None,
        }
    }

    pub(crate) fn unexpected_phase(found: u8, phase: &'static str) -> ProtocolError {
        Self::Unexpected {
            expect: None,
            found,
            phase: Some(phase),
        }
    }

    pub(crate) fn unknown_auth(auth: u32) -> ProtocolError {
        Self::UnknownAuth { auth }
    }

    pub(crate) fn truncated(requested: usize, available: usize) -> ProtocolError {
        Self::Truncated { requested, available }
    }

    pub(crate) fn malformed(reason: &'static str) -> ProtocolError {
        Self::Malformed { reason }
    }
}
