//! # Tessera auth/hmac
//!
//! Signed-token authentication mechanism.
//!
//! A credential asserts a uid, gid and host for a limited time and is signed
//! with HMAC-SHA256 under a key shared by every node. Receivers must
//! [`verify`](Mechanism::verify) a credential before its identity is
//! released; until then uid and gid queries answer [`NOBODY`].
//!
//! ## Options
//!
//! `create` reads `user` (a name from [`HmacConfig::users`], required) and
//! `host` (defaults to [`HmacConfig::host`]).
//!
//! ## Payload
//!
//! `[u32 uid][u32 gid][str host][u64 created][u64 expires][mem nonce][mem signature]`
//!
//! The signature covers every field before it.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;

pub use config::{HmacConfig, Identity};
pub use error::HmacConfigError;

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::{Bytes, BytesMut};
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;
use tracing::{debug, warn};

use tessera_auth::{
    AuthError, AuthInfo, Credential, ErrorCode, Gid, Mechanism, ProtocolVersion, Registry, Uid,
    NOBODY,
};
use tessera_wire::{PackExt, UnpackExt};

use crate::error::{mechanism_error, BAD_SIGNATURE, CRED_EXPIRED, NOT_VERIFIED};

type HmacSha256 = Hmac<Sha256>;

/// Mechanism id carried by the current wire format.
pub const MECHANISM_ID: u32 = 102;

/// Mechanism name.
pub const MECHANISM_NAME: &str = "auth/hmac";

/// Nonce length in bytes.
pub const NONCE_LEN: usize = 16;

/// Source of the current Unix time in seconds.
pub type ClockFn = Arc<dyn Fn() -> u64 + Send + Sync>;

fn system_clock() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[derive(Debug)]
struct HmacCred {
    uid: Uid,
    gid: Gid,
    host: Option<String>,
    created: u64,
    expires: u64,
    nonce: Vec<u8>,
    signature: Vec<u8>,
    verified: AtomicBool,
    errno: AtomicI32,
}

impl HmacCred {
    fn pack_signed(&self, buf: &mut BytesMut) {
        buf.pack32(self.uid);
        buf.pack32(self.gid);
        buf.pack_str(self.host.as_deref());
        buf.pack64(self.created);
        buf.pack64(self.expires);
        buf.pack_mem(&self.nonce);
    }

    fn fail(&self, code: i32) -> AuthError {
        self.errno.store(code, Ordering::Release);
        mechanism_error(code)
    }
}

/// The `auth/hmac` mechanism.
pub struct HmacMechanism {
    mac: HmacSha256,
    users: BTreeMap<String, Identity>,
    host: Option<String>,
    ttl_secs: u64,
    clock: ClockFn,
}

impl HmacMechanism {
    /// Creates the mechanism from configuration.
    pub fn new(config: &HmacConfig) -> Result<Self, HmacConfigError> {
        let key = config.decode_key()?;
        let mac = <HmacSha256 as Mac>::new_from_slice(&key)
            .map_err(|e| HmacConfigError::Invalid(e.to_string()))?;
        Ok(Self {
            mac,
            users: config.users.clone(),
            host: config.host.clone(),
            ttl_secs: config.ttl_secs,
            clock: Arc::new(system_clock),
        })
    }

    /// Replaces the clock (for testing).
    pub fn with_clock(mut self, clock: ClockFn) -> Self {
        self.clock = clock;
        self
    }

    fn mac_over(&self, cred: &HmacCred) -> HmacSha256 {
        let mut signed = BytesMut::new();
        cred.pack_signed(&mut signed);
        let mut mac = self.mac.clone();
        mac.update(&signed);
        mac
    }

    fn sign(&self, cred: &HmacCred) -> Vec<u8> {
        self.mac_over(cred).finalize().into_bytes().to_vec()
    }

    fn cred<'a>(&self, cred: &'a Credential) -> Result<&'a HmacCred, AuthError> {
        cred.downcast_ref::<HmacCred>()
            .ok_or_else(|| AuthError::BadArgument("credential not created by auth/hmac".into()))
    }

    fn verified<'a>(&self, cred: &'a Credential) -> Option<&'a HmacCred> {
        let cred = self.cred(cred).ok()?;
        if !cred.verified.load(Ordering::Acquire) {
            cred.errno.store(NOT_VERIFIED, Ordering::Release);
            return None;
        }
        Some(cred)
    }
}

/// Registers `auth/hmac` with `registry`, built from `config` on load.
pub fn register(registry: &mut Registry, config: HmacConfig) -> &mut Registry {
    registry.register(MECHANISM_NAME, move || {
        let mechanism = HmacMechanism::new(&config)?;
        Ok(Arc::new(mechanism) as Arc<dyn Mechanism>)
    })
}

impl Mechanism for HmacMechanism {
    fn id(&self) -> u32 {
        MECHANISM_ID
    }

    fn name(&self) -> &str {
        MECHANISM_NAME
    }

    fn create(&self, auth_info: Option<&str>) -> Result<Credential, AuthError> {
        let info = AuthInfo::parse(auth_info);
        let user = info
            .get("user")
            .ok_or_else(|| AuthError::BadArgument("auth/hmac requires a user".into()))?;
        let identity = self
            .users
            .get(user)
            .ok_or_else(|| AuthError::NoSuchUser(user.to_string()))?;

        let mut nonce = vec![0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let created = (self.clock)();
        let mut cred = HmacCred {
            uid: identity.uid,
            gid: identity.gid,
            host: info.get("host").map(str::to_string).or_else(|| self.host.clone()),
            created,
            expires: created.saturating_add(self.ttl_secs),
            nonce,
            signature: Vec::new(),
            verified: AtomicBool::new(false),
            errno: AtomicI32::new(0),
        };
        cred.signature = self.sign(&cred);

        debug!(user = %user, uid = cred.uid, expires = cred.expires, "auth/hmac credential created");

        Ok(Credential::new(MECHANISM_ID, cred))
    }

    fn verify(&self, cred: &Credential, _auth_info: Option<&str>) -> Result<(), AuthError> {
        let cred = self.cred(cred)?;

        if self.mac_over(cred).verify_slice(&cred.signature).is_err() {
            warn!(uid = cred.uid, "auth/hmac signature mismatch");
            return Err(cred.fail(BAD_SIGNATURE));
        }

        let now = (self.clock)();
        if now > cred.expires {
            debug!(uid = cred.uid, expires = cred.expires, now, "auth/hmac credential expired");
            return Err(cred.fail(CRED_EXPIRED));
        }

        cred.verified.store(true, Ordering::Release);
        cred.errno.store(0, Ordering::Release);
        Ok(())
    }

    fn get_uid(&self, cred: &Credential, _auth_info: Option<&str>) -> Uid {
        self.verified(cred).map_or(NOBODY, |c| c.uid)
    }

    fn get_gid(&self, cred: &Credential, _auth_info: Option<&str>) -> Gid {
        self.verified(cred).map_or(NOBODY, |c| c.gid)
    }

    fn get_host(&self, cred: &Credential, _auth_info: Option<&str>) -> Option<String> {
        self.verified(cred).and_then(|c| c.host.clone())
    }

    fn pack(
        &self,
        cred: &Credential,
        buf: &mut BytesMut,
        _version: ProtocolVersion,
    ) -> Result<(), AuthError> {
        let cred = self.cred(cred)?;
        cred.pack_signed(buf);
        buf.pack_mem(&cred.signature);
        Ok(())
    }

    fn unpack(&self, buf: &mut Bytes, _version: ProtocolVersion) -> Result<Credential, AuthError> {
        let uid = buf.safe_unpack32()?;
        let gid = buf.safe_unpack32()?;
        let host = buf.safe_unpack_str()?;
        let created = buf.safe_unpack64()?;
        let expires = buf.safe_unpack64()?;
        let nonce = buf.safe_unpack_mem()?;
        let signature = buf.safe_unpack_mem()?;

        Ok(Credential::new(
            MECHANISM_ID,
            HmacCred {
                uid,
                gid,
                host,
                created,
                expires,
                nonce,
                signature,
                verified: AtomicBool::new(false),
                errno: AtomicI32::new(0),
            },
        ))
    }

    fn print(&self, cred: &Credential, out: &mut dyn Write) -> Result<(), AuthError> {
        let cred = self.cred(cred)?;
        writeln!(out, "BEGIN AUTHENTICATION CREDENTIAL")?;
        writeln!(out, "   mechanism: {}", MECHANISM_NAME)?;
        writeln!(out, "   uid: {}", cred.uid)?;
        writeln!(out, "   gid: {}", cred.gid)?;
        writeln!(out, "   host: {}", cred.host.as_deref().unwrap_or("(unknown)"))?;
        writeln!(out, "   created: {}", cred.created)?;
        writeln!(out, "   expires: {}", cred.expires)?;
        writeln!(out, "   verified: {}", cred.verified.load(Ordering::Acquire))?;
        writeln!(out, "END AUTHENTICATION CREDENTIAL")?;
        Ok(())
    }

    fn errno(&self, cred: &Credential) -> ErrorCode {
        match self.cred(cred) {
            Ok(cred) => ErrorCode::from_raw(cred.errno.load(Ordering::Acquire)),
            Err(e) => e.code(),
        }
    }

    fn errstr(&self, code: i32) -> Cow<'static, str> {
        error::errstr(code)
    }
}
