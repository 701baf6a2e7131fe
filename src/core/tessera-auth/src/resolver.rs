//! Error code descriptions.
//!
//! Generic codes are described by a fixed table that always wins. Any other
//! code is handed to the active mechanism. The two tables are never merged,
//! so a mechanism that reuses a generic value cannot shadow it.

use std::borrow::Cow;

use crate::{AuthContext, ErrorCode};

/// Returned when no mechanism can be loaded to describe a code.
pub const INIT_FAILURE_MESSAGE: &str = "authentication initialization failure";

const GENERIC_ERRORS: &[(ErrorCode, &str)] = &[
    (ErrorCode::Success, "no error"),
    (ErrorCode::GeneralFailure, "unknown error"),
    (ErrorCode::NoMechanism, "no authentication plugin installed"),
    (ErrorCode::BadArgument, "bad argument to plugin function"),
    (ErrorCode::Memory, "memory management error"),
    (ErrorCode::NoSuchUser, "no such user"),
    (ErrorCode::InvalidCredential, "authentication credential invalid"),
    (ErrorCode::Mismatch, "authentication type mismatch"),
    (ErrorCode::UnsupportedVersion, "authentication version too old"),
];

/// Looks `code` up in the generic table only.
pub fn generic_errstr(code: i32) -> Option<&'static str> {
    GENERIC_ERRORS
        .iter()
        .find(|(generic, _)| generic.raw() == code)
        .map(|(_, msg)| *msg)
}

/// Describes `code`, loading the default mechanism if needed.
///
/// Never fails: without a mechanism the answer is
/// [`INIT_FAILURE_MESSAGE`].
pub fn resolve(ctx: &AuthContext, code: i32) -> Cow<'static, str> {
    let Ok(provider) = ctx.ensure_initialized(None) else {
        return Cow::Borrowed(INIT_FAILURE_MESSAGE);
    };

    match generic_errstr(code) {
        Some(msg) => Cow::Borrowed(msg),
        None => provider.mechanism().errstr(code),
    }
}
