//! Authentication error types.

use thiserror::Error;

use tessera_wire::WireError;

use crate::code::ErrorCode;

/// Errors that can occur during authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No mechanism is loaded and none could be loaded.
    #[error("no authentication mechanism loaded")]
    NoMechanism,

    /// The requested mechanism name is not registered.
    #[error("unknown authentication mechanism: {0}")]
    UnknownMechanism(String),

    /// The mechanism is registered but could not be brought up.
    #[error("cannot load authentication mechanism {name}: {reason}")]
    LoadFailed {
        /// Mechanism name.
        name: String,
        /// Why loading failed.
        reason: String,
    },

    /// Bad argument passed to a mechanism operation.
    #[error("bad argument: {0}")]
    BadArgument(String),

    /// Memory management error.
    #[error("memory management error")]
    Memory,

    /// The identity does not map to a known user.
    #[error("no such user: {0}")]
    NoSuchUser(String),

    /// The credential failed verification.
    #[error("authentication credential invalid")]
    InvalidCredential,

    /// The encoded credential names a different mechanism than the active one.
    #[error("authentication type mismatch: remote {remote}, local {local}")]
    Mismatch {
        /// Mechanism declared by the envelope.
        remote: String,
        /// Mechanism active locally.
        local: String,
    },

    /// The negotiated protocol version predates every supported wire format.
    #[error("protocol version {0} not supported")]
    UnsupportedVersion(u16),

    /// The buffer could not be decoded.
    #[error("error decoding credential: {0}")]
    Decode(#[from] WireError),

    /// Writing a credential description failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// One or more providers failed to release during teardown.
    #[error("teardown failed: {0}")]
    Teardown(String),

    /// Mechanism-specific failure, resolved only by that mechanism.
    #[error("{message}")]
    Mechanism {
        /// Mechanism-defined code.
        code: i32,
        /// Mechanism-supplied description.
        message: String,
    },
}

impl AuthError {
    /// Maps the error onto the numeric code taxonomy.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NoMechanism | Self::UnknownMechanism(_) | Self::LoadFailed { .. } => {
                ErrorCode::NoMechanism
            },
            Self::BadArgument(_) => ErrorCode::BadArgument,
            Self::Memory => ErrorCode::Memory,
            Self::NoSuchUser(_) => ErrorCode::NoSuchUser,
            Self::InvalidCredential => ErrorCode::InvalidCredential,
            Self::Mismatch { .. } => ErrorCode::Mismatch,
            Self::UnsupportedVersion(_) => ErrorCode::UnsupportedVersion,
            Self::Decode(_) | Self::Io(_) | Self::Configuration(_) | Self::Teardown(_) => {
                ErrorCode::GeneralFailure
            },
            Self::Mechanism { code, .. } => ErrorCode::from_raw(*code),
        }
    }
}
