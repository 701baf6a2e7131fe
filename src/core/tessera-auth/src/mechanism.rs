//! Authentication mechanism trait.

use std::borrow::Cow;
use std::io::Write;

use bytes::{Bytes, BytesMut};

use crate::{AuthError, Credential, ErrorCode, Gid, ProtocolVersion, Uid};

/// Trait for authentication mechanisms.
///
/// A mechanism owns the full lifecycle of its credentials: it creates them,
/// checks them, answers identity queries and encodes its own payload. The
/// facade only selects one mechanism by name and forwards calls to it.
///
/// Implementations must be shareable across threads; the facade calls into
/// them without holding any lock.
pub trait Mechanism: Send + Sync {
    /// Stable numeric identifier, carried by the current wire format.
    fn id(&self) -> u32;

    /// Stable name, used for registry lookup and by the legacy wire format.
    fn name(&self) -> &str;

    /// Creates a credential for the calling identity.
    ///
    /// # Arguments
    ///
    /// * `auth_info` - Mechanism options (see [`AuthInfo`](crate::AuthInfo))
    fn create(&self, auth_info: Option<&str>) -> Result<Credential, AuthError>;

    /// Releases a credential.
    fn destroy(&self, cred: Credential) -> Result<(), AuthError> {
        drop(cred);
        Ok(())
    }

    /// Verifies a credential, typically one received from a peer.
    fn verify(&self, cred: &Credential, auth_info: Option<&str>) -> Result<(), AuthError>;

    /// Returns the uid asserted by the credential, or [`NOBODY`](crate::NOBODY).
    fn get_uid(&self, cred: &Credential, auth_info: Option<&str>) -> Uid;

    /// Returns the gid asserted by the credential, or [`NOBODY`](crate::NOBODY).
    fn get_gid(&self, cred: &Credential, auth_info: Option<&str>) -> Gid;

    /// Returns the host the credential was created on, if known.
    fn get_host(&self, cred: &Credential, auth_info: Option<&str>) -> Option<String>;

    /// Appends the mechanism payload for `cred` to `buf`.
    fn pack(
        &self,
        cred: &Credential,
        buf: &mut BytesMut,
        version: ProtocolVersion,
    ) -> Result<(), AuthError>;

    /// Reads a mechanism payload from `buf`.
    fn unpack(&self, buf: &mut Bytes, version: ProtocolVersion) -> Result<Credential, AuthError>;

    /// Writes a human-readable description of `cred`.
    fn print(&self, cred: &Credential, out: &mut dyn Write) -> Result<(), AuthError>;

    /// Returns the last error recorded on `cred`.
    fn errno(&self, cred: &Credential) -> ErrorCode;

    /// Describes a mechanism-specific error code.
    fn errstr(&self, code: i32) -> Cow<'static, str>;

    /// Releases mechanism-wide resources when the mechanism is unloaded.
    fn fini(&self) -> Result<(), AuthError> {
        Ok(())
    }
}
