use bytes::{Buf, BufMut, Bytes};

use crate::{common::ByteStr, postgres::ProtocolError};

/// Integer signess in postgres docs is awful.
pub trait UsizeExt {
    /// Length is `usize` in rust, while postgres want `u32`.
    ///
    /// This will panic when overflow instead of wrapping.
    fn to_u32(self) -> u32;
    /// Length is `usize` in rust, while postgres want `u16`.
    ///
    /// This will panic when overflow instead of wrapping.
    fn to_u16(self) -> u16;
}

/// Nul string operation.
pub trait StrExt {
    /// String length plus nul (1).
    fn nul_string_len(&self) -> u32;
}

/// Nul string operation in [`BufMut`]
pub trait BufMutExt {
    /// Write string and nul termination.
    fn put_nul_string(&mut self, string: &str);
}

/// Checked reads over a backend message body.
///
/// Backend bodies come from the network, a short or malformed body is a [`ProtocolError`]
/// instead of a panic.
pub trait BytesExt {
    /// Read a nul terminated string without copying.
    fn get_nul_bytestr(&mut self) -> Result<ByteStr, ProtocolError>;

    /// Split off exactly `len` bytes.
    fn try_split_to(&mut self, len: usize) -> Result<Bytes, ProtocolError>;

    /// Read a length prefixed value where `-1` means NULL.
    fn get_nullable(&mut self) -> Result<Option<Bytes>, ProtocolError>;
}

/// Helper trait to [`Display`][std::fmt::Display] bytes.
pub trait FmtExt {
    /// Lossy [`Display`][std::fmt::Display] bytes.
    fn lossy(&self) -> LossyFmt<'_>;
}

/// Lossy [`Display`][std::fmt::Display] implementation for bytes.
pub struct LossyFmt<'a>(pub &'a [u8]);

impl UsizeExt for usize {
    fn to_u32(self) -> u32 {
        self.try_into().expect("message size too large for protocol")
    }

    fn to_u16(self) -> u16 {
        self.try_into().expect("message size too large for protocol")
    }
}

impl StrExt for str {
    fn nul_string_len(&self) -> u32 {
        self.len().to_u32() + 1/* nul */
    }
}

impl<B: BufMut> BufMutExt for B {
    fn put_nul_string(&mut self, string: &str) {
        self.put(string.as_bytes());
        self.put_u8(b'\0');
    }
}

impl BytesExt for Bytes {
    fn get_nul_bytestr(&mut self) -> Result<ByteStr, ProtocolError> {
        let Some(end) = self.iter().position(|e| matches!(e, b'\0')) else {
            return Err(ProtocolError::malformed("string is not nul terminated"));
        };
        let me = self.split_to(end);
        Buf::advance(self, 1); // nul
        Ok(ByteStr::from_utf8(me)?)
    }

    fn try_split_to(&mut self, len: usize) -> Result<Bytes, ProtocolError> {
        if self.len() < len {
            return Err(ProtocolError::truncated(len, self.len()));
        }
        Ok(self.split_to(len))
    }

    fn get_nullable(&mut self) -> Result<Option<Bytes>, ProtocolError> {
        match self.try_get_i32()? {
            -1 => Ok(None),
            len @ 0.. => self.try_split_to(len as usize).map(Some),
            _ => Err(ProtocolError::malformed("negative value length")),
        }
    }
}

impl FmtExt for [u8] {
    fn lossy(&self) -> LossyFmt<'_> {
        LossyFmt(self)
    }
}

impl std::fmt::Display for LossyFmt<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for &b in self.0 {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02x}")?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for LossyFmt<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "b\"{self}\"")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn nul_string() {
        let mut body = Bytes::from_static(b"user\0postgres\0");
        assert_eq!(body.get_nul_bytestr().unwrap(), "user");
        assert_eq!(body.get_nul_bytestr().unwrap(), "postgres");
        assert!(body.is_empty());
        assert!(body.get_nul_bytestr().is_err());
    }

    #[test]
    fn nullable_value() {
        let mut body = Bytes::from_static(b"\xff\xff\xff\xff\x00\x00\x00\x02ab\x00\x00\x00\x09a");
        assert_eq!(body.get_nullable().unwrap(), None);
        assert_eq!(body.get_nullable().unwrap().as_deref(), Some(&b"ab"[..]));
        assert!(body.get_nullable().is_err());
    }

    #[test]
    fn lossy_display() {
        assert_eq!(b"a\x01b".lossy().to_string(), "a\\x01b");
    }
}
