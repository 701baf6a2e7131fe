//! Process-wide facade.
//!
//! Programs that want a single authentication context for the whole process
//! [`install`] one at startup and then call the `auth_*` functions from
//! anywhere. Before installation every function returns the same fallback as
//! an [`AuthContext`] whose mechanism cannot be loaded.
//!
//! Installation happens at most once. [`auth_fini`] releases the mechanism but
//! leaves the context installed, so a later call loads it again.

use std::borrow::Cow;
use std::io::Write;
use std::sync::OnceLock;

use bytes::{Bytes, BytesMut};

use crate::resolver::INIT_FAILURE_MESSAGE;
use crate::{AuthContext, AuthError, Credential, ErrorCode, Gid, ProtocolVersion, Uid, NOBODY};

static GLOBAL: OnceLock<AuthContext> = OnceLock::new();

/// Installs the process-wide context.
///
/// Fails with [`AuthError::Configuration`] if one is already installed; the
/// rejected context is dropped.
pub fn install(ctx: AuthContext) -> Result<&'static AuthContext, AuthError> {
    GLOBAL.set(ctx).map_err(|_| {
        AuthError::Configuration("authentication context already installed".into())
    })?;
    require()
}

/// The installed context, if any.
pub fn global() -> Option<&'static AuthContext> {
    GLOBAL.get()
}

fn require() -> Result<&'static AuthContext, AuthError> {
    global().ok_or(AuthError::NoMechanism)
}

/// Initializes the installed context with `mechanism` or its default.
pub fn auth_init(mechanism: Option<&str>) -> Result<(), AuthError> {
    require()?.init(mechanism)
}

/// Releases the installed context's mechanism. Succeeds when nothing is
/// installed or loaded.
pub fn auth_fini() -> Result<(), AuthError> {
    match global() {
        Some(ctx) => ctx.teardown(),
        None => Ok(()),
    }
}

/// See [`AuthContext::create`].
pub fn auth_create(auth_info: Option<&str>) -> Result<Credential, AuthError> {
    require()?.create(auth_info)
}

/// See [`AuthContext::destroy`].
pub fn auth_destroy(cred: Credential) -> Result<(), AuthError> {
    require()?.destroy(cred)
}

/// See [`AuthContext::verify`].
pub fn auth_verify(cred: &Credential, auth_info: Option<&str>) -> Result<(), AuthError> {
    require()?.verify(cred, auth_info)
}

/// See [`AuthContext::get_uid`].
pub fn auth_get_uid(cred: &Credential, auth_info: Option<&str>) -> Uid {
    global().map_or(NOBODY, |ctx| ctx.get_uid(cred, auth_info))
}

/// See [`AuthContext::get_gid`].
pub fn auth_get_gid(cred: &Credential, auth_info: Option<&str>) -> Gid {
    global().map_or(NOBODY, |ctx| ctx.get_gid(cred, auth_info))
}

/// See [`AuthContext::get_host`].
pub fn auth_get_host(cred: &Credential, auth_info: Option<&str>) -> Option<String> {
    global().and_then(|ctx| ctx.get_host(cred, auth_info))
}

/// See [`AuthContext::pack`].
pub fn auth_pack(
    cred: &Credential,
    buf: &mut BytesMut,
    version: ProtocolVersion,
) -> Result<(), AuthError> {
    require()?.pack(cred, buf, version)
}

/// See [`AuthContext::unpack`].
pub fn auth_unpack(buf: &mut Bytes, version: ProtocolVersion) -> Result<Credential, AuthError> {
    require()?.unpack(buf, version)
}

/// See [`AuthContext::print`].
pub fn auth_print(cred: &Credential, out: &mut dyn Write) -> Result<(), AuthError> {
    require()?.print(cred, out)
}

/// See [`AuthContext::errno`].
pub fn auth_errno(cred: &Credential) -> ErrorCode {
    global().map_or(ErrorCode::GeneralFailure, |ctx| ctx.errno(cred))
}

/// See [`AuthContext::errstr`].
pub fn auth_errstr(code: i32) -> Cow<'static, str> {
    global().map_or(Cow::Borrowed(INIT_FAILURE_MESSAGE), |ctx| ctx.errstr(code))
}
