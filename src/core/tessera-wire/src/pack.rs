//! Packing helpers.

use bytes::BufMut;

/// Extension methods for writing wire fields into a [`BufMut`].
pub trait PackExt: BufMut {
    /// Packs a `u16` in network byte order.
    fn pack16(&mut self, value: u16) {
        self.put_u16(value);
    }

    /// Packs a `u32` in network byte order.
    fn pack32(&mut self, value: u32) {
        self.put_u32(value);
    }

    /// Packs a `u64` in network byte order.
    fn pack64(&mut self, value: u64) {
        self.put_u64(value);
    }

    /// Packs a `bool` as a single byte.
    fn pack_bool(&mut self, value: bool) {
        self.put_u8(u8::from(value));
    }

    /// Packs a byte string as `[u32 len][bytes]`.
    fn pack_mem(&mut self, data: &[u8]) {
        self.put_u32(data.len() as u32);
        self.put_slice(data);
    }

    /// Packs an optional string as `[u32 len][bytes][NUL]`.
    ///
    /// The length counts the terminator. `None` packs as a zero length with no
    /// payload.
    fn pack_str(&mut self, value: Option<&str>) {
        match value {
            Some(s) => {
                self.put_u32(s.len() as u32 + 1);
                self.put_slice(s.as_bytes());
                self.put_u8(0);
            },
            None => self.put_u32(0),
        }
    }
}

impl<B: BufMut + ?Sized> PackExt for B {}
