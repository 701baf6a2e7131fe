//! # Tessera Wire
//!
//! Primitives for packing credential envelopes into message buffers.
//!
//! All integers are written in network byte order (big-endian). Byte strings
//! are length-prefixed with a `u32`. Text strings additionally carry a
//! trailing NUL that is counted by the length prefix, which keeps the layout
//! readable by legacy peers.
//!
//! Packing is infallible and goes through [`PackExt`] on any
//! [`bytes::BufMut`]. Unpacking goes through [`UnpackExt`] on any
//! [`bytes::Buf`] and fails with a [`WireError`] instead of panicking when the
//! buffer is truncated or a length prefix overruns it.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod pack;
pub mod unpack;

pub use error::WireError;
pub use pack::PackExt;
pub use unpack::UnpackExt;

/// Largest byte string accepted by [`UnpackExt::safe_unpack_mem`].
pub const MAX_PACK_MEM_LEN: usize = 16 * 1024 * 1024;
