//! Numeric error codes exchanged with mechanisms.

use std::fmt;

/// First code value mechanisms should use for their own errors.
pub const FIRST_MECHANISM_ERROR: i32 = 8;

/// An authentication error code.
///
/// The generic codes are meaningful regardless of the active mechanism.
/// Anything else is [`ErrorCode::Mechanism`] and only the active mechanism can
/// describe it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// No error.
    Success,
    /// Unspecified failure.
    GeneralFailure,
    /// No mechanism is loaded.
    NoMechanism,
    /// Bad argument to a mechanism operation.
    BadArgument,
    /// Memory management error.
    Memory,
    /// Unknown user.
    NoSuchUser,
    /// Invalid credential.
    InvalidCredential,
    /// Mechanism mismatch between peers.
    Mismatch,
    /// Protocol version too old.
    UnsupportedVersion,
    /// Mechanism-defined code.
    Mechanism(i32),
}

impl ErrorCode {
    /// Returns the raw numeric value.
    pub const fn raw(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::GeneralFailure => -1,
            Self::NoMechanism => 1,
            Self::BadArgument => 2,
            Self::Memory => 3,
            Self::NoSuchUser => 4,
            Self::InvalidCredential => 5,
            Self::Mismatch => 6,
            Self::UnsupportedVersion => 7,
            Self::Mechanism(code) => code,
        }
    }

    /// Classifies a raw numeric value.
    pub const fn from_raw(code: i32) -> Self {
        match code {
            0 => Self::Success,
            -1 => Self::GeneralFailure,
            1 => Self::NoMechanism,
            2 => Self::BadArgument,
            3 => Self::Memory,
            4 => Self::NoSuchUser,
            5 => Self::InvalidCredential,
            6 => Self::Mismatch,
            7 => Self::UnsupportedVersion,
            other => Self::Mechanism(other),
        }
    }

    /// Whether the code belongs to the generic space.
    pub const fn is_generic(self) -> bool {
        !matches!(self, Self::Mechanism(_))
    }
}

impl From<ErrorCode> for i32 {
    fn from(code: ErrorCode) -> Self {
        code.raw()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw())
    }
}
