//! # Tessera auth/none
//!
//! Trusting authentication mechanism.
//!
//! Credentials carry a uid, gid and host exactly as the creator claimed them
//! and nothing else. Verification always succeeds. Use it only where every
//! peer is already trusted, e.g. single-host test clusters.
//!
//! ## Options
//!
//! `create` reads `uid` (required), `gid` (defaults to `uid`) and `host`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::borrow::Cow;
use std::io::Write;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use tessera_auth::{
    AuthError, AuthInfo, Credential, ErrorCode, Gid, Mechanism, ProtocolVersion, Registry, Uid,
    NOBODY,
};
use tessera_wire::{PackExt, UnpackExt};
use tracing::debug;

/// Mechanism id carried by the current wire format.
pub const MECHANISM_ID: u32 = 100;

/// Mechanism name.
pub const MECHANISM_NAME: &str = "auth/none";

#[derive(Debug, Clone, PartialEq, Eq)]
struct NoneCred {
    uid: Uid,
    gid: Gid,
    host: Option<String>,
}

/// The `auth/none` mechanism.
#[derive(Debug, Default)]
pub struct NoneMechanism;

impl NoneMechanism {
    /// Creates the mechanism.
    pub fn new() -> Self {
        Self
    }

    fn cred<'a>(&self, cred: &'a Credential) -> Result<&'a NoneCred, AuthError> {
        cred.downcast_ref::<NoneCred>()
            .ok_or_else(|| AuthError::BadArgument("credential not created by auth/none".into()))
    }
}

/// Registers `auth/none` with `registry`.
pub fn register(registry: &mut Registry) -> &mut Registry {
    registry.register(MECHANISM_NAME, || {
        Ok(Arc::new(NoneMechanism::new()) as Arc<dyn Mechanism>)
    })
}

impl Mechanism for NoneMechanism {
    fn id(&self) -> u32 {
        MECHANISM_ID
    }

    fn name(&self) -> &str {
        MECHANISM_NAME
    }

    fn create(&self, auth_info: Option<&str>) -> Result<Credential, AuthError> {
        let info = AuthInfo::parse(auth_info);
        let uid = info
            .get_u32("uid")
            .ok_or_else(|| AuthError::BadArgument("auth/none requires a numeric uid".into()))?;
        let gid = match info.get("gid") {
            Some(_) => info
                .get_u32("gid")
                .ok_or_else(|| AuthError::BadArgument("gid must be numeric".into()))?,
            None => uid,
        };
        let host = info.get("host").map(str::to_string);

        debug!(uid, gid, "auth/none credential created");

        Ok(Credential::new(MECHANISM_ID, NoneCred { uid, gid, host }))
    }

    fn verify(&self, cred: &Credential, _auth_info: Option<&str>) -> Result<(), AuthError> {
        self.cred(cred).map(|_| ())
    }

    fn get_uid(&self, cred: &Credential, _auth_info: Option<&str>) -> Uid {
        self.cred(cred).map_or(NOBODY, |c| c.uid)
    }

    fn get_gid(&self, cred: &Credential, _auth_info: Option<&str>) -> Gid {
        self.cred(cred).map_or(NOBODY, |c| c.gid)
    }

    fn get_host(&self, cred: &Credential, _auth_info: Option<&str>) -> Option<String> {
        self.cred(cred).ok().and_then(|c| c.host.clone())
    }

    fn pack(
        &self,
        cred: &Credential,
        buf: &mut BytesMut,
        _version: ProtocolVersion,
    ) -> Result<(), AuthError> {
        let cred = self.cred(cred)?;
        buf.pack32(cred.uid);
        buf.pack32(cred.gid);
        buf.pack_str(cred.host.as_deref());
        Ok(())
    }

    fn unpack(&self, buf: &mut Bytes, _version: ProtocolVersion) -> Result<Credential, AuthError> {
        let uid = buf.safe_unpack32()?;
        let gid = buf.safe_unpack32()?;
        let host = buf.safe_unpack_str()?;
        Ok(Credential::new(MECHANISM_ID, NoneCred { uid, gid, host }))
    }

    fn print(&self, cred: &Credential, out: &mut dyn Write) -> Result<(), AuthError> {
        let cred = self.cred(cred)?;
        writeln!(out, "BEGIN AUTHENTICATION CREDENTIAL")?;
        writeln!(out, "   mechanism: {}", MECHANISM_NAME)?;
        writeln!(out, "   uid: {}", cred.uid)?;
        writeln!(out, "   gid: {}", cred.gid)?;
        writeln!(out, "   host: {}", cred.host.as_deref().unwrap_or("(unknown)"))?;
        writeln!(out, "END AUTHENTICATION CREDENTIAL")?;
        Ok(())
    }

    fn errno(&self, cred: &Credential) -> ErrorCode {
        match self.cred(cred) {
            Ok(_) => ErrorCode::Success,
            Err(e) => e.code(),
        }
    }

    fn errstr(&self, _code: i32) -> Cow<'static, str> {
        Cow::Borrowed("unknown error")
    }
}
