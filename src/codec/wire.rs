//! Bounds-checked cursor and SSH wire-format writers.
//!
//! SSH wire fields are a 4-byte big-endian length followed by that many
//! bytes:
//! ```text
//! ┌────────────┬──────────────┐
//! │ Length     │ Data         │
//! │ uint32 BE  │ Length bytes │
//! └────────────┴──────────────┘
//! ```
//!
//! [`Cursor`] is the only way the crate reads structured input: every read
//! either returns the requested bytes or an [`OutOfBounds`] error.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{CodecError, DecodeError, FramingError};

/// A read ran past the end of the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfBounds {
    pub needed: usize,
    pub remaining: usize,
}

impl From<OutOfBounds> for FramingError {
    fn from(e: OutOfBounds) -> Self {
        FramingError::Truncated {
            needed: e.needed,
            remaining: e.remaining,
        }
    }
}

impl From<OutOfBounds> for DecodeError {
    fn from(e: OutOfBounds) -> Self {
        DecodeError::UnexpectedEof {
            needed: e.needed,
            remaining: e.remaining,
        }
    }
}

impl From<OutOfBounds> for CodecError {
    fn from(e: OutOfBounds) -> Self {
        CodecError::MalformedSignature {
            needed: e.needed,
            remaining: e.remaining,
        }
    }
}

/// Owned read cursor over a byte buffer.
///
/// Slices handed out are zero-copy views into the underlying `Bytes`.
#[derive(Debug, Clone)]
pub struct Cursor {
    buf: Bytes,
}

impl Cursor {
    /// Create a cursor positioned at the start of `buf`.
    pub fn new(buf: impl Into<Bytes>) -> Self {
        Self { buf: buf.into() }
    }

    /// Number of unread bytes.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    /// True if everything has been consumed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    fn ensure(&self, needed: usize) -> Result<(), OutOfBounds> {
        if self.buf.len() < needed {
            return Err(OutOfBounds {
                needed,
                remaining: self.buf.len(),
            });
        }
        Ok(())
    }

    /// Skip `n` bytes.
    pub fn skip(&mut self, n: usize) -> Result<(), OutOfBounds> {
        self.ensure(n)?;
        self.buf.advance(n);
        Ok(())
    }

    /// Read one byte.
    pub fn read_u8(&mut self) -> Result<u8, OutOfBounds> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    /// Read a big-endian u16.
    pub fn read_u16(&mut self) -> Result<u16, OutOfBounds> {
        self.ensure(2)?;
        Ok(self.buf.get_u16())
    }

    /// Read a big-endian u32.
    pub fn read_u32(&mut self) -> Result<u32, OutOfBounds> {
        self.ensure(4)?;
        Ok(self.buf.get_u32())
    }

    /// Read exactly `n` bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<Bytes, OutOfBounds> {
        self.ensure(n)?;
        Ok(self.buf.split_to(n))
    }

    /// Read a length-prefixed SSH string.
    pub fn read_string(&mut self) -> Result<Bytes, OutOfBounds> {
        let len = self.read_u32()? as usize;
        self.read_bytes(len)
    }
}

/// Append a length-prefixed SSH string.
pub fn put_string(buf: &mut BytesMut, data: &[u8]) {
    buf.put_u32(data.len() as u32);
    buf.put_slice(data);
}

/// Prefix `body` with its own 4-byte big-endian length.
pub fn wrap_length(body: &[u8]) -> Bytes {
    let mut out = BytesMut::with_capacity(4 + body.len());
    put_string(&mut out, body);
    out.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_fields_in_order() {
        let mut cursor = Cursor::new(vec![0x01, 0x02, 0x03, 0, 0, 0, 2, b'h', b'i']);
        assert_eq!(cursor.read_u8().unwrap(), 0x01);
        assert_eq!(cursor.read_u16().unwrap(), 0x0203);
        assert_eq!(&cursor.read_string().unwrap()[..], b"hi");
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_read_past_end_reports_shortfall() {
        let mut cursor = Cursor::new(vec![0, 0, 0, 9, 1, 2]);
        let err = cursor.read_string().unwrap_err();
        assert_eq!(
            err,
            OutOfBounds {
                needed: 9,
                remaining: 2
            }
        );
    }

    #[test]
    fn test_failed_read_does_not_consume() {
        let mut cursor = Cursor::new(vec![1, 2]);
        assert!(cursor.read_u32().is_err());
        assert_eq!(cursor.remaining(), 2);
        assert_eq!(cursor.read_u16().unwrap(), 0x0102);
    }

    #[test]
    fn test_put_string_big_endian_length() {
        let mut buf = BytesMut::new();
        put_string(&mut buf, b"nistp256");
        assert_eq!(&buf[..4], &[0, 0, 0, 8]);
        assert_eq!(&buf[4..], b"nistp256");
    }

    #[test]
    fn test_wrap_length() {
        assert_eq!(&wrap_length(&[5])[..], &[0, 0, 0, 1, 5]);
        assert_eq!(&wrap_length(&[])[..], &[0, 0, 0, 0]);
    }
}
