//! Authentication configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::AuthError;

/// Environment variable overriding [`AuthConfig::auth_type`].
pub const ENV_AUTH_TYPE: &str = "TESSERA_AUTH_TYPE";

/// Environment variable overriding [`AuthConfig::auth_info`].
pub const ENV_AUTH_INFO: &str = "TESSERA_AUTH_INFO";

/// Mechanism selected when nothing is configured.
pub const DEFAULT_AUTH_TYPE: &str = "auth/none";

/// Which mechanism to load and the options to hand it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Mechanism name, e.g. `auth/hmac`.
    pub auth_type: String,
    /// Mechanism options passed as `auth_info`.
    pub auth_info: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            auth_type: DEFAULT_AUTH_TYPE.to_string(),
            auth_info: None,
        }
    }
}

impl AuthConfig {
    /// Reads a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AuthError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AuthError::Configuration(format!("{}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| AuthError::Configuration(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides from the process environment.
    pub fn apply_env(self) -> Self {
        self.apply_overrides(
            std::env::var(ENV_AUTH_TYPE).ok(),
            std::env::var(ENV_AUTH_INFO).ok(),
        )
    }

    fn apply_overrides(mut self, auth_type: Option<String>, auth_info: Option<String>) -> Self {
        if let Some(auth_type) = auth_type.filter(|t| !t.trim().is_empty()) {
            self.auth_type = auth_type.trim().to_string();
        }
        if let Some(auth_info) = auth_info {
            self.auth_info = Some(auth_info);
        }
        self
    }

    /// Checks the configuration.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.auth_type.trim().is_empty() {
            return Err(AuthError::Configuration("auth_type must not be empty".into()));
        }
        Ok(())
    }
}
