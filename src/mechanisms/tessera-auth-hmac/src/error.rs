//! auth/hmac error types and codes.

use std::borrow::Cow;

use thiserror::Error;

use tessera_auth::{AuthError, FIRST_MECHANISM_ERROR};

/// The credential's lifetime has passed.
pub const CRED_EXPIRED: i32 = FIRST_MECHANISM_ERROR;

/// The signature does not match the credential contents.
pub const BAD_SIGNATURE: i32 = FIRST_MECHANISM_ERROR + 1;

/// An identity was requested before the credential was verified.
pub const NOT_VERIFIED: i32 = FIRST_MECHANISM_ERROR + 2;

/// Describes an auth/hmac code.
pub fn errstr(code: i32) -> Cow<'static, str> {
    Cow::Borrowed(match code {
        CRED_EXPIRED => "credential expired",
        BAD_SIGNATURE => "credential signature invalid",
        NOT_VERIFIED => "credential not verified",
        _ => "unknown error",
    })
}

/// Builds the facade error for an auth/hmac code.
pub(crate) fn mechanism_error(code: i32) -> AuthError {
    AuthError::Mechanism {
        code,
        message: errstr(code).into_owned(),
    }
}

/// Errors in auth/hmac configuration.
#[derive(Debug, Error)]
pub enum HmacConfigError {
    /// The key is not valid base64.
    #[error("invalid key encoding: {0}")]
    KeyEncoding(String),

    /// The key is shorter than the minimum.
    #[error("key too short: {len} bytes, need at least {min}")]
    KeyTooShort {
        /// Decoded key length.
        len: usize,
        /// Minimum accepted length.
        min: usize,
    },

    /// The configuration file could not be read or parsed.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<HmacConfigError> for AuthError {
    fn from(e: HmacConfigError) -> Self {
        AuthError::Configuration(e.to_string())
    }
}
