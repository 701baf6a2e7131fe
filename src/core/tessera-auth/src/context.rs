//! Authentication context lifecycle.
//!
//! An [`AuthContext`] holds at most one active [`Provider`]. The first call
//! that needs it loads the configured mechanism; every later call reuses it.
//!
//! The active provider is published through an [`ArcSwapOption`], so readers
//! never take a lock. The one-time load and [`teardown`](AuthContext::teardown)
//! serialize on `init_lock`. Teardown must not race with in-flight dispatch:
//! dispatch holds no lock while it runs mechanism code.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::{AuthConfig, AuthError, Provider, Registry};

/// Process-wide authentication state.
pub struct AuthContext {
    registry: Registry,
    default_mechanism: String,
    active: ArcSwapOption<Provider>,
    init_lock: Mutex<()>,
}

impl AuthContext {
    /// Creates an uninitialized context.
    ///
    /// # Arguments
    ///
    /// * `registry` - Mechanisms that may be selected
    /// * `default_mechanism` - Name loaded when no explicit name is given
    pub fn new(registry: Registry, default_mechanism: impl Into<String>) -> Self {
        Self {
            registry,
            default_mechanism: default_mechanism.into(),
            active: ArcSwapOption::from(None),
            init_lock: Mutex::new(()),
        }
    }

    /// Creates an uninitialized context that defaults to `config.auth_type`.
    pub fn from_config(registry: Registry, config: &AuthConfig) -> Self {
        Self::new(registry, config.auth_type.clone())
    }

    /// Mechanisms this context can load.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Name loaded when no explicit name is given.
    pub fn default_mechanism(&self) -> &str {
        &self.default_mechanism
    }

    /// Whether a provider is active.
    pub fn is_initialized(&self) -> bool {
        self.active.load().is_some()
    }

    /// The active provider, without attempting to load one.
    pub fn active(&self) -> Option<Arc<Provider>> {
        self.active.load_full()
    }

    /// Loads a mechanism unless one is already active.
    ///
    /// `mechanism` takes precedence over the configured default. Once a
    /// provider is active it stays in place; a different name passed later is
    /// ignored. A failed load leaves the context uninitialized so a later call
    /// may retry.
    pub fn ensure_initialized(&self, mechanism: Option<&str>) -> Result<Arc<Provider>, AuthError> {
        if let Some(provider) = self.active.load_full() {
            warn_if_reselected(&provider, mechanism);
            return Ok(provider);
        }

        let _guard = self.init_lock.lock();

        // Another caller may have finished loading while we waited.
        if let Some(provider) = self.active.load_full() {
            warn_if_reselected(&provider, mechanism);
            return Ok(provider);
        }

        let name = mechanism.unwrap_or(&self.default_mechanism);
        let provider = match self.registry.load(name) {
            Ok(provider) => Arc::new(provider),
            Err(e) => {
                error!(mechanism = %name, error = %e, "cannot create auth context");
                return Err(e);
            },
        };

        self.active.store(Some(Arc::clone(&provider)));
        info!(mechanism = %provider.name(), id = provider.id(), "Authentication context initialized");

        Ok(provider)
    }

    /// Releases the active provider and returns to the uninitialized state.
    ///
    /// Succeeds trivially when nothing is loaded. The context ends up
    /// uninitialized even if the provider fails to release.
    pub fn teardown(&self) -> Result<(), AuthError> {
        let _guard = self.init_lock.lock();

        let Some(provider) = self.active.swap(None) else {
            return Ok(());
        };

        if let Err(e) = self.registry.unload(Some(&*provider)) {
            debug!(mechanism = %provider.name(), error = %e, "Mechanism failed to unload");
            return Err(AuthError::Teardown(format!("{}: {}", provider.name(), e)));
        }

        info!(mechanism = %provider.name(), "Authentication context released");
        Ok(())
    }
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("default_mechanism", &self.default_mechanism)
            .field("active", &self.active.load().as_deref().map(Provider::name))
            .finish()
    }
}

fn warn_if_reselected(provider: &Provider, requested: Option<&str>) {
    if let Some(requested) = requested {
        if requested != provider.name() {
            warn!(
                active = %provider.name(),
                requested = %requested,
                "Authentication mechanism already selected, ignoring request"
            );
        }
    }
}
