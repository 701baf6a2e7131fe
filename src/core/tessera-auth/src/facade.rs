//! Facade dispatch.
//!
//! One method per mechanism operation. Each loads the default mechanism on
//! first use and forwards its arguments unchanged. When no mechanism can be
//! loaded the method returns its fallback instead of the load error:
//!
//! | Operation | Fallback |
//! |---|---|
//! | `create`, `destroy`, `verify`, `pack`, `unpack`, `print` | `Err(AuthError::NoMechanism)` |
//! | `get_uid`, `get_gid` | [`NOBODY`] |
//! | `get_host` | `None` |
//! | `errno` | [`ErrorCode::GeneralFailure`] |
//! | `errstr` | [`INIT_FAILURE_MESSAGE`](crate::resolver::INIT_FAILURE_MESSAGE) |
//!
//! Nothing here retries.

use std::borrow::Cow;
use std::io::Write;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};

use crate::codec::{decode_credential, encode_credential};
use crate::{
    resolver, AuthContext, AuthError, Credential, ErrorCode, Gid, Provider, ProtocolVersion, Uid,
    NOBODY,
};

impl AuthContext {
    /// Explicitly initializes with `mechanism`, or the configured default.
    pub fn init(&self, mechanism: Option<&str>) -> Result<(), AuthError> {
        self.ensure_initialized(mechanism).map(|_| ())
    }

    fn provider(&self) -> Option<Arc<Provider>> {
        self.ensure_initialized(None).ok()
    }

    fn require(&self) -> Result<Arc<Provider>, AuthError> {
        self.provider().ok_or(AuthError::NoMechanism)
    }

    /// Creates a credential for the calling identity.
    pub fn create(&self, auth_info: Option<&str>) -> Result<Credential, AuthError> {
        self.require()?.mechanism().create(auth_info)
    }

    /// Returns a credential to its mechanism.
    pub fn destroy(&self, cred: Credential) -> Result<(), AuthError> {
        self.require()?.mechanism().destroy(cred)
    }

    /// Verifies a credential.
    pub fn verify(&self, cred: &Credential, auth_info: Option<&str>) -> Result<(), AuthError> {
        self.require()?.mechanism().verify(cred, auth_info)
    }

    /// Uid asserted by `cred`, or [`NOBODY`].
    pub fn get_uid(&self, cred: &Credential, auth_info: Option<&str>) -> Uid {
        self.provider()
            .map_or(NOBODY, |p| p.mechanism().get_uid(cred, auth_info))
    }

    /// Gid asserted by `cred`, or [`NOBODY`].
    pub fn get_gid(&self, cred: &Credential, auth_info: Option<&str>) -> Gid {
        self.provider()
            .map_or(NOBODY, |p| p.mechanism().get_gid(cred, auth_info))
    }

    /// Host `cred` was created on.
    pub fn get_host(&self, cred: &Credential, auth_info: Option<&str>) -> Option<String> {
        self.provider()
            .and_then(|p| p.mechanism().get_host(cred, auth_info))
    }

    /// Packs `cred` into `buf` for a peer speaking `version`.
    pub fn pack(
        &self,
        cred: &Credential,
        buf: &mut BytesMut,
        version: ProtocolVersion,
    ) -> Result<(), AuthError> {
        encode_credential(&*self.require()?, cred, buf, version)
    }

    /// Unpacks a credential from `buf` sent by a peer speaking `version`.
    pub fn unpack(&self, buf: &mut Bytes, version: ProtocolVersion) -> Result<Credential, AuthError> {
        decode_credential(&*self.require()?, buf, version)
    }

    /// Writes a description of `cred`.
    pub fn print(&self, cred: &Credential, out: &mut dyn Write) -> Result<(), AuthError> {
        self.require()?.mechanism().print(cred, out)
    }

    /// Last error recorded on `cred`.
    pub fn errno(&self, cred: &Credential) -> ErrorCode {
        self.provider()
            .map_or(ErrorCode::GeneralFailure, |p| p.mechanism().errno(cred))
    }

    /// Describes an error code. Never fails.
    pub fn errstr(&self, code: i32) -> Cow<'static, str> {
        resolver::resolve(self, code)
    }
}
