//! Wire decoding error types.

use thiserror::Error;

/// Errors that can occur while unpacking a buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// Fewer bytes remain than the field requires.
    #[error("truncated buffer: need {needed} bytes, {remaining} remaining")]
    Truncated {
        /// Bytes required by the field.
        needed: usize,
        /// Bytes left in the buffer.
        remaining: usize,
    },

    /// A length prefix exceeds the permitted maximum.
    #[error("length {len} exceeds maximum {max}")]
    TooLong {
        /// Declared length.
        len: usize,
        /// Permitted maximum.
        max: usize,
    },

    /// A string field is not valid UTF-8.
    #[error("invalid utf-8 in string field")]
    InvalidUtf8,
}
