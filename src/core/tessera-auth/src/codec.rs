//! Credential envelope encoding.
//!
//! Every packed credential is preceded by an envelope naming the mechanism
//! that produced it, so the receiver can refuse a credential from another
//! mechanism before its payload ever reaches the local decoder.
//!
//! | Format | Versions | Layout |
//! |---|---|---|
//! | [`WireFormat::MechanismId`] | `>= MECHANISM_ID` | `[u32 id][payload]` |
//! | [`WireFormat::MechanismName`] | `MIN ..< MECHANISM_ID` | `[u32 len][name NUL][u32 0][payload]` |
//!
//! Versions older than [`ProtocolVersion::MIN`] are rejected before any byte
//! is read or written.

use bytes::{Bytes, BytesMut};
use tessera_wire::{PackExt, UnpackExt};
use tracing::error;

use crate::{AuthError, Credential, Provider, ProtocolVersion};

/// Value of the reserved field in the legacy envelope.
///
/// Legacy peers wrote a plugin version here and never checked it on receipt.
pub const LEGACY_RESERVED: u32 = 0;

/// Envelope layout selected by protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    /// Numeric mechanism id.
    MechanismId,
    /// Mechanism name and reserved word.
    MechanismName,
}

impl WireFormat {
    /// Selects the envelope for a negotiated version.
    pub fn for_version(version: ProtocolVersion) -> Result<Self, AuthError> {
        if version >= ProtocolVersion::MECHANISM_ID {
            Ok(Self::MechanismId)
        } else if version >= ProtocolVersion::MIN {
            Ok(Self::MechanismName)
        } else {
            error!(%version, "protocol version not supported");
            Err(AuthError::UnsupportedVersion(version.get()))
        }
    }

    /// Writes the envelope for `provider`, then the mechanism payload.
    ///
    /// Nothing is left in `buf` when the mechanism fails to pack.
    pub fn encode(
        self,
        provider: &Provider,
        cred: &Credential,
        buf: &mut BytesMut,
        version: ProtocolVersion,
    ) -> Result<(), AuthError> {
        let start = buf.len();
        match self {
            Self::MechanismId => buf.pack32(provider.id()),
            Self::MechanismName => {
                buf.pack_str(Some(provider.name()));
                buf.pack32(LEGACY_RESERVED);
            },
        }
        let result = provider.mechanism().pack(cred, buf, version);
        if result.is_err() {
            buf.truncate(start);
        }
        result
    }

    /// Checks the envelope against `provider`, then decodes the payload.
    ///
    /// The mechanism decoder is not invoked when the envelope is malformed or
    /// names another mechanism. Legacy names are compared as raw bytes.
    pub fn decode(
        self,
        provider: &Provider,
        buf: &mut Bytes,
        version: ProtocolVersion,
    ) -> Result<Credential, AuthError> {
        match self {
            Self::MechanismId => {
                let remote = buf.safe_unpack32()?;
                if remote != provider.id() {
                    error!(remote, local = provider.id(), "remote mechanism id mismatch");
                    return Err(AuthError::Mismatch {
                        remote: remote.to_string(),
                        local: provider.id().to_string(),
                    });
                }
            },
            Self::MechanismName => {
                let mut remote = buf.safe_unpack_mem()?;
                if remote.last() == Some(&0) {
                    remote.pop();
                }
                if remote.is_empty() || remote != provider.name().as_bytes() {
                    let remote = if remote.is_empty() {
                        "(none)".to_string()
                    } else {
                        String::from_utf8_lossy(&remote).into_owned()
                    };
                    error!(remote = %remote, local = %provider.name(), "remote mechanism name mismatch");
                    return Err(AuthError::Mismatch {
                        remote,
                        local: provider.name().to_string(),
                    });
                }
                let _reserved = buf.safe_unpack32()?;
            },
        }
        provider.mechanism().unpack(buf, version)
    }
}

/// Packs `cred` for a peer speaking `version`.
pub fn encode_credential(
    provider: &Provider,
    cred: &Credential,
    buf: &mut BytesMut,
    version: ProtocolVersion,
) -> Result<(), AuthError> {
    WireFormat::for_version(version)?.encode(provider, cred, buf, version)
}

/// Unpacks a credential sent by a peer speaking `version`.
pub fn decode_credential(
    provider: &Provider,
    buf: &mut Bytes,
    version: ProtocolVersion,
) -> Result<Credential, AuthError> {
    WireFormat::for_version(version)?.decode(provider, buf, version)
}
