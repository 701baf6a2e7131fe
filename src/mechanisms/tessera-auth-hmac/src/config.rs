//! auth/hmac configuration.

use std::collections::BTreeMap;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use tessera_auth::{Gid, Uid};

use crate::HmacConfigError;

/// Shortest signing key accepted, in bytes.
pub const MIN_KEY_LEN: usize = 32;

/// Default credential lifetime in seconds.
pub const DEFAULT_TTL_SECS: u64 = 300;

/// Numeric identity of a configured user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// User id.
    pub uid: Uid,
    /// Primary group id.
    pub gid: Gid,
}

/// Configuration for the auth/hmac mechanism.
#[derive(Clone, Serialize, Deserialize)]
pub struct HmacConfig {
    /// Base64-encoded shared signing key.
    pub key: String,
    /// Users that may create credentials, by name.
    #[serde(default)]
    pub users: BTreeMap<String, Identity>,
    /// Host recorded in credentials when `auth_info` names none.
    #[serde(default)]
    pub host: Option<String>,
    /// Credential lifetime in seconds.
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,
}

fn default_ttl() -> u64 {
    DEFAULT_TTL_SECS
}

impl std::fmt::Debug for HmacConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacConfig")
            .field("key", &"[REDACTED]")
            .field("users", &self.users)
            .field("host", &self.host)
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

impl HmacConfig {
    /// Creates a configuration from raw key bytes.
    pub fn new(key: &[u8]) -> Self {
        Self {
            key: BASE64.encode(key),
            users: BTreeMap::new(),
            host: None,
            ttl_secs: DEFAULT_TTL_SECS,
        }
    }

    /// Adds a user.
    pub fn with_user(mut self, name: impl Into<String>, uid: Uid, gid: Gid) -> Self {
        self.users.insert(name.into(), Identity { uid, gid });
        self
    }

    /// Reads a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, HmacConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| HmacConfigError::Invalid(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&raw)
            .map_err(|e| HmacConfigError::Invalid(format!("{}: {}", path.display(), e)))
    }

    /// Decodes and checks the signing key.
    pub fn decode_key(&self) -> Result<Zeroizing<Vec<u8>>, HmacConfigError> {
        let key = Zeroizing::new(
            BASE64
                .decode(self.key.trim())
                .map_err(|e| HmacConfigError::KeyEncoding(e.to_string()))?,
        );
        if key.len() < MIN_KEY_LEN {
            return Err(HmacConfigError::KeyTooShort {
                len: key.len(),
                min: MIN_KEY_LEN,
            });
        }
        Ok(key)
    }
}
