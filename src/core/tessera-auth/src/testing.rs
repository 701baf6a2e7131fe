//! In-crate test mechanism with call counters.

use std::borrow::Cow;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::{Bytes, BytesMut};
use tessera_wire::{PackExt, UnpackExt};

use crate::{
    AuthError, AuthInfo, Credential, ErrorCode, Gid, Mechanism, ProtocolVersion, Uid, NOBODY,
};

#[derive(Default)]
pub(crate) struct Calls {
    pub create: AtomicUsize,
    pub pack: AtomicUsize,
    pub unpack: AtomicUsize,
    pub fini: AtomicUsize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FakeCred {
    pub uid: Uid,
    pub gid: Gid,
    pub host: Option<String>,
}

pub(crate) const FAKE_BAD_TICKET: i32 = 4;

pub(crate) struct FakeMechanism {
    id: u32,
    name: String,
    pub calls: Calls,
    pub fail_fini: bool,
}

impl FakeMechanism {
    pub fn new(id: u32, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            calls: Calls::default(),
            fail_fini: false,
        }
    }

    fn cred<'a>(&self, cred: &'a Credential) -> Option<&'a FakeCred> {
        cred.downcast_ref::<FakeCred>()
    }
}

impl Mechanism for FakeMechanism {
    fn id(&self) -> u32 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn create(&self, auth_info: Option<&str>) -> Result<Credential, AuthError> {
        self.calls.create.fetch_add(1, Ordering::SeqCst);
        let info = AuthInfo::parse(auth_info);
        let uid = match info.get("user") {
            Some("alice") => 1000,
            Some(other) => return Err(AuthError::NoSuchUser(other.to_string())),
            None => info.get_u32("uid").unwrap_or(0),
        };
        Ok(Credential::new(
            self.id,
            FakeCred {
                uid,
                gid: uid,
                host: info.get("host").map(str::to_string),
            },
        ))
    }

    fn verify(&self, cred: &Credential, _auth_info: Option<&str>) -> Result<(), AuthError> {
        self.cred(cred).map(|_| ()).ok_or(AuthError::InvalidCredential)
    }

    fn get_uid(&self, cred: &Credential, _auth_info: Option<&str>) -> Uid {
        self.cred(cred).map_or(NOBODY, |c| c.uid)
    }

    fn get_gid(&self, cred: &Credential, _auth_info: Option<&str>) -> Gid {
        self.cred(cred).map_or(NOBODY, |c| c.gid)
    }

    fn get_host(&self, cred: &Credential, _auth_info: Option<&str>) -> Option<String> {
        self.cred(cred).and_then(|c| c.host.clone())
    }

    fn pack(
        &self,
        cred: &Credential,
        buf: &mut BytesMut,
        _version: ProtocolVersion,
    ) -> Result<(), AuthError> {
        self.calls.pack.fetch_add(1, Ordering::SeqCst);
        let cred = self
            .cred(cred)
            .ok_or_else(|| AuthError::BadArgument("foreign credential".into()))?;
        buf.pack32(cred.uid);
        buf.pack32(cred.gid);
        buf.pack_str(cred.host.as_deref());
        Ok(())
    }

    fn unpack(&self, buf: &mut Bytes, _version: ProtocolVersion) -> Result<Credential, AuthError> {
        self.calls.unpack.fetch_add(1, Ordering::SeqCst);
        let uid = buf.safe_unpack32()?;
        let gid = buf.safe_unpack32()?;
        let host = buf.safe_unpack_str()?;
        Ok(Credential::new(self.id, FakeCred { uid, gid, host }))
    }

    fn print(&self, cred: &Credential, out: &mut dyn Write) -> Result<(), AuthError> {
        let cred = self.cred(cred).ok_or(AuthError::InvalidCredential)?;
        writeln!(out, "uid={} gid={}", cred.uid, cred.gid)?;
        Ok(())
    }

    fn errno(&self, cred: &Credential) -> ErrorCode {
        match self.cred(cred) {
            Some(_) => ErrorCode::Success,
            None => ErrorCode::BadArgument,
        }
    }

    fn errstr(&self, code: i32) -> Cow<'static, str> {
        match code {
            FAKE_BAD_TICKET => Cow::Borrowed("fake ticket rejected"),
            _ => Cow::Borrowed("unknown fake error"),
        }
    }

    fn fini(&self) -> Result<(), AuthError> {
        self.calls.fini.fetch_add(1, Ordering::SeqCst);
        if self.fail_fini {
            return Err(AuthError::Teardown("fake fini failure".into()));
        }
        Ok(())
    }
}
