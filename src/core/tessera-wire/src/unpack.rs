//! Unpacking helpers.
//!
//! Every method checks the remaining length before reading, so a truncated
//! buffer yields a [`WireError`] rather than a panic from the underlying
//! [`Buf`] accessors.

use bytes::Buf;

use crate::{WireError, MAX_PACK_MEM_LEN};

fn ensure<B: Buf + ?Sized>(buf: &B, needed: usize) -> Result<(), WireError> {
    let remaining = buf.remaining();
    if remaining < needed {
        return Err(WireError::Truncated { needed, remaining });
    }
    Ok(())
}

/// Extension methods for reading wire fields from a [`Buf`].
pub trait UnpackExt: Buf {
    /// Unpacks a network byte order `u16`.
    fn safe_unpack16(&mut self) -> Result<u16, WireError> {
        ensure(self, 2)?;
        Ok(self.get_u16())
    }

    /// Unpacks a network byte order `u32`.
    fn safe_unpack32(&mut self) -> Result<u32, WireError> {
        ensure(self, 4)?;
        Ok(self.get_u32())
    }

    /// Unpacks a network byte order `u64`.
    fn safe_unpack64(&mut self) -> Result<u64, WireError> {
        ensure(self, 8)?;
        Ok(self.get_u64())
    }

    /// Unpacks a single-byte `bool`. Any non-zero byte is `true`.
    fn safe_unpack_bool(&mut self) -> Result<bool, WireError> {
        ensure(self, 1)?;
        Ok(self.get_u8() != 0)
    }

    /// Unpacks a `[u32 len][bytes]` byte string.
    fn safe_unpack_mem(&mut self) -> Result<Vec<u8>, WireError> {
        let len = self.safe_unpack32()? as usize;
        if len > MAX_PACK_MEM_LEN {
            return Err(WireError::TooLong {
                len,
                max: MAX_PACK_MEM_LEN,
            });
        }
        ensure(self, len)?;
        let mut data = vec![0u8; len];
        self.copy_to_slice(&mut data);
        Ok(data)
    }

    /// Unpacks a string written by [`PackExt::pack_str`](crate::PackExt::pack_str).
    ///
    /// A zero length yields `None`. A single trailing NUL is stripped when
    /// present.
    fn safe_unpack_str(&mut self) -> Result<Option<String>, WireError> {
        let mut data = self.safe_unpack_mem()?;
        if data.is_empty() {
            return Ok(None);
        }
        if data.last() == Some(&0) {
            data.pop();
        }
        String::from_utf8(data)
            .map(Some)
            .map_err(|_| WireError::InvalidUtf8)
    }
}

impl<B: Buf + ?Sized> UnpackExt for B {}
