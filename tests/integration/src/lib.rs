//! Integration tests for Tessera authentication.
//!
//! These tests drive whole contexts through the facade: mechanism selection,
//! credential exchange between peers and both envelope formats.

// Allow unwrap() in tests - panics are acceptable for test assertions
#![allow(clippy::disallowed_methods)]

use std::borrow::Cow;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use bytes::{Bytes, BytesMut};
use tessera_auth::{
    AuthContext, AuthError, AuthInfo, Credential, ErrorCode, Gid, Mechanism, ProtocolVersion,
    Registry, Uid, NOBODY,
};
use tessera_auth_hmac::HmacConfig;
use tessera_wire::{PackExt, UnpackExt};

// ============================================================================
// Test Mechanism
// ============================================================================

/// A mechanism that trusts a bare uid, with a configurable id and name.
pub struct TrustTokenMechanism {
    id: u32,
    name: String,
    /// Number of payloads this mechanism decoded.
    pub unpacked: AtomicUsize,
}

impl TrustTokenMechanism {
    pub fn new(id: u32, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            unpacked: AtomicUsize::new(0),
        }
    }
}

struct TrustToken(Uid);

impl Mechanism for TrustTokenMechanism {
    fn id(&self) -> u32 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn create(&self, auth_info: Option<&str>) -> Result<Credential, AuthError> {
        let uid = AuthInfo::parse(auth_info)
            .get_u32("uid")
            .ok_or_else(|| AuthError::BadArgument("uid required".into()))?;
        Ok(Credential::new(self.id, TrustToken(uid)))
    }

    fn verify(&self, _cred: &Credential, _auth_info: Option<&str>) -> Result<(), AuthError> {
        Ok(())
    }

    fn get_uid(&self, cred: &Credential, _auth_info: Option<&str>) -> Uid {
        cred.downcast_ref::<TrustToken>().map_or(NOBODY, |t| t.0)
    }

    fn get_gid(&self, cred: &Credential, auth_info: Option<&str>) -> Gid {
        self.get_uid(cred, auth_info)
    }

    fn get_host(&self, _cred: &Credential, _auth_info: Option<&str>) -> Option<String> {
        None
    }

    fn pack(
        &self,
        cred: &Credential,
        buf: &mut BytesMut,
        _version: ProtocolVersion,
    ) -> Result<(), AuthError> {
        let token = cred
            .downcast_ref::<TrustToken>()
            .ok_or_else(|| AuthError::BadArgument("foreign credential".into()))?;
        buf.pack32(token.0);
        Ok(())
    }

    fn unpack(&self, buf: &mut Bytes, _version: ProtocolVersion) -> Result<Credential, AuthError> {
        self.unpacked.fetch_add(1, Ordering::SeqCst);
        Ok(Credential::new(self.id, TrustToken(buf.safe_unpack32()?)))
    }

    fn print(&self, cred: &Credential, out: &mut dyn Write) -> Result<(), AuthError> {
        writeln!(out, "trust-token uid={}", self.get_uid(cred, None))?;
        Ok(())
    }

    fn errno(&self, _cred: &Credential) -> ErrorCode {
        ErrorCode::Success
    }

    fn errstr(&self, _code: i32) -> Cow<'static, str> {
        Cow::Borrowed("trust-token error")
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Shared signing key for auth/hmac peers.
pub const HMAC_KEY: [u8; 32] = [0x42; 32];

/// A context whose only mechanism is a trust-token with the given id.
pub fn trust_token_context(id: u32) -> (AuthContext, Arc<TrustTokenMechanism>) {
    let mechanism = Arc::new(TrustTokenMechanism::new(id, "trust-token"));
    let mut registry = Registry::new();
    registry.register_instance(mechanism.clone());
    (AuthContext::new(registry, "trust-token"), mechanism)
}

/// A context with every bundled mechanism registered, selecting `auth_type`.
pub fn bundled_context(auth_type: &str) -> AuthContext {
    let mut registry = Registry::new();
    tessera_auth_none::register(&mut registry);
    tessera_auth_hmac::register(
        &mut registry,
        HmacConfig::new(&HMAC_KEY).with_user("alice", 1000, 100),
    );
    AuthContext::new(registry, auth_type)
}

/// Sends `cred` from `sender` to `receiver` and returns what arrived.
///
/// Fails if either side rejects the credential or bytes are left over.
pub fn exchange(
    sender: &AuthContext,
    receiver: &AuthContext,
    cred: &Credential,
    version: ProtocolVersion,
) -> Result<Credential> {
    let mut buf = BytesMut::new();
    sender
        .pack(cred, &mut buf, version)
        .context("Failed to pack credential")?;

    let mut wire = buf.freeze();
    let received = receiver
        .unpack(&mut wire, version)
        .context("Failed to unpack credential")?;
    if !wire.is_empty() {
        bail!("{} bytes left after credential", wire.len());
    }
    Ok(received)
}

/// Packs `cred` with `ctx` and returns the frozen buffer.
pub fn pack(ctx: &AuthContext, cred: &Credential, version: ProtocolVersion) -> Bytes {
    let mut buf = BytesMut::new();
    ctx.pack(cred, &mut buf, version).unwrap();
    buf.freeze()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn test_mechanism_id_exchange() {
        let (sender, _) = trust_token_context(7);
        let (receiver, _) = trust_token_context(7);

        let cred = sender.create(Some("uid=1000")).unwrap();
        let mut wire = pack(&sender, &cred, ProtocolVersion::CURRENT);
        assert_eq!(&wire[..4], &[0, 0, 0, 7]);

        let received = receiver.unpack(&mut wire, ProtocolVersion::CURRENT).unwrap();
        assert_eq!(
            receiver.get_uid(&received, None),
            sender.get_uid(&cred, None)
        );
        assert!(wire.is_empty());
    }

    #[test]
    fn test_mechanism_id_mismatch() {
        let (sender, _) = trust_token_context(7);
        let (receiver, mechanism) = trust_token_context(9);

        let cred = sender.create(Some("uid=1000")).unwrap();
        let mut wire = pack(&sender, &cred, ProtocolVersion::CURRENT);

        let err = receiver
            .unpack(&mut wire, ProtocolVersion::CURRENT)
            .unwrap_err();
        assert!(matches!(err, AuthError::Mismatch { .. }));
        assert_eq!(mechanism.unpacked.load(Ordering::SeqCst), 0);
        assert_eq!(
            receiver.errstr(err.code().raw()),
            "authentication type mismatch"
        );
    }

    #[test]
    fn test_legacy_envelope_names_mechanism() {
        let (sender, _) = trust_token_context(7);
        let (receiver, _) = trust_token_context(9);

        let cred = sender.create(Some("uid=42")).unwrap();
        let mut wire = pack(&sender, &cred, ProtocolVersion::MIN);

        // Legacy peers match on name, so differing ids do not matter.
        let name_len = u32::from_be_bytes(wire[..4].try_into().unwrap());
        assert_eq!(name_len as usize, "trust-token".len() + 1);

        let received = receiver.unpack(&mut wire, ProtocolVersion::MIN).unwrap();
        assert_eq!(receiver.get_uid(&received, None), 42);
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let (ctx, _) = trust_token_context(7);
        let cred = ctx.create(Some("uid=1")).unwrap();

        let mut buf = BytesMut::new();
        let err = ctx.pack(&cred, &mut buf, ProtocolVersion(16)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnsupportedVersion);
        assert!(buf.is_empty());
        assert_eq!(
            ctx.errstr(ErrorCode::UnsupportedVersion.raw()),
            "authentication version too old"
        );
    }

    #[test]
    fn test_none_exchange_both_formats() {
        let sender = bundled_context("auth/none");
        let receiver = bundled_context("auth/none");
        let cred = sender.create(Some("uid=1000,gid=100,host=node01")).unwrap();

        for version in [ProtocolVersion::MIN, ProtocolVersion::CURRENT] {
            let received = exchange(&sender, &receiver, &cred, version).unwrap();
            receiver.verify(&received, None).unwrap();
            assert_eq!(receiver.get_uid(&received, None), 1000);
            assert_eq!(receiver.get_gid(&received, None), 100);
            assert_eq!(receiver.get_host(&received, None).as_deref(), Some("node01"));
        }
    }

    #[test]
    fn test_exchange_keeps_auth_error() {
        let sender = bundled_context("auth/none");
        let receiver = bundled_context("auth/hmac");
        let cred = sender.create(Some("uid=0")).unwrap();

        let err = exchange(&sender, &receiver, &cred, ProtocolVersion::CURRENT).unwrap_err();
        assert!(err.to_string().contains("unpack"));
        let auth = err.downcast_ref::<AuthError>().unwrap();
        assert_eq!(auth.code(), ErrorCode::Mismatch);
    }

    #[test]
    fn test_hmac_exchange() {
        let sender = bundled_context("auth/hmac");
        let receiver = bundled_context("auth/hmac");
        let cred = sender.create(Some("user=alice,host=login1")).unwrap();

        let mut wire = pack(&sender, &cred, ProtocolVersion::CURRENT);
        assert_eq!(&wire[..4], &tessera_auth_hmac::MECHANISM_ID.to_be_bytes());

        let received = receiver.unpack(&mut wire, ProtocolVersion::CURRENT).unwrap();
        assert_eq!(receiver.get_uid(&received, None), NOBODY);

        receiver.verify(&received, None).unwrap();
        assert_eq!(receiver.get_uid(&received, None), 1000);
        assert_eq!(receiver.get_host(&received, None).as_deref(), Some("login1"));
        assert_eq!(receiver.errno(&received), ErrorCode::Success);
    }

    #[test]
    fn test_hmac_errors_resolve_through_mechanism() {
        let ctx = bundled_context("auth/hmac");
        let cred = ctx.create(Some("user=alice")).unwrap();

        ctx.get_uid(&cred, None);
        let code = ctx.errno(&cred).raw();
        assert_eq!(code, tessera_auth_hmac::error::NOT_VERIFIED);
        assert_eq!(ctx.errstr(code), "credential not verified");
        assert_eq!(ctx.errstr(ErrorCode::NoSuchUser.raw()), "no such user");
    }

    #[test]
    fn test_none_credential_rejected_by_hmac_peer() {
        let sender = bundled_context("auth/none");
        let receiver = bundled_context("auth/hmac");
        let cred = sender.create(Some("uid=0")).unwrap();

        let mut wire = pack(&sender, &cred, ProtocolVersion::CURRENT);
        let err = receiver
            .unpack(&mut wire, ProtocolVersion::CURRENT)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Mismatch);

        let mut wire = pack(&sender, &cred, ProtocolVersion::MIN);
        let err = receiver.unpack(&mut wire, ProtocolVersion::MIN).unwrap_err();
        assert!(matches!(
            err,
            AuthError::Mismatch { ref remote, ref local } if remote == "auth/none" && local == "auth/hmac"
        ));
    }

    #[test]
    fn test_unknown_mechanism_falls_back() {
        let ctx = bundled_context("auth/munge");
        let (other, _) = trust_token_context(7);
        let cred = other.create(Some("uid=5")).unwrap();

        assert!(matches!(ctx.create(None), Err(AuthError::NoMechanism)));
        assert_eq!(ctx.get_uid(&cred, None), NOBODY);
        assert_eq!(ctx.get_host(&cred, None), None);
        assert_eq!(ctx.errno(&cred), ErrorCode::GeneralFailure);
        assert_eq!(
            ctx.errstr(1000),
            tessera_auth::resolver::INIT_FAILURE_MESSAGE
        );
        assert!(!ctx.is_initialized());
    }

    #[test]
    fn test_concurrent_first_use_loads_once() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&loads);
        let mut registry = Registry::new();
        registry.register("trust-token", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(TrustTokenMechanism::new(7, "trust-token")) as Arc<dyn Mechanism>)
        });
        let ctx = Arc::new(AuthContext::new(registry, "trust-token"));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8u32)
            .map(|i| {
                let ctx = Arc::clone(&ctx);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    let info = format!("uid={}", i);
                    let cred = ctx.create(Some(&info)).unwrap();
                    let mut wire = pack(&ctx, &cred, ProtocolVersion::CURRENT);
                    let received = ctx.unpack(&mut wire, ProtocolVersion::CURRENT).unwrap();
                    assert_eq!(ctx.get_uid(&received, None), i);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_teardown_then_reuse() {
        let ctx = bundled_context("auth/none");
        ctx.create(Some("uid=1")).unwrap();
        assert!(ctx.is_initialized());

        ctx.teardown().unwrap();
        assert!(!ctx.is_initialized());
        ctx.teardown().unwrap();

        ctx.create(Some("uid=1")).unwrap();
        assert!(ctx.is_initialized());
    }
}
