//! Mechanism registry.
//!
//! Maps mechanism names to factories and turns a selected name into a loaded
//! [`Provider`]. Loading happens once per context; unloading runs the
//! mechanism's [`fini`](Mechanism::fini) hook at most once.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::{AuthError, Mechanism};

/// Builds a mechanism instance on load.
pub type MechanismFactory = Arc<dyn Fn() -> Result<Arc<dyn Mechanism>, AuthError> + Send + Sync>;

/// A loaded mechanism with its identifiers bound at load time.
pub struct Provider {
    id: u32,
    name: String,
    mechanism: Arc<dyn Mechanism>,
    released: AtomicBool,
}

impl Provider {
    /// Numeric mechanism id.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Mechanism name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The mechanism operations.
    pub fn mechanism(&self) -> &dyn Mechanism {
        self.mechanism.as_ref()
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Name-to-factory lookup for authentication mechanisms.
#[derive(Default, Clone)]
pub struct Registry {
    factories: BTreeMap<String, MechanismFactory>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Result<Arc<dyn Mechanism>, AuthError> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
        self
    }

    /// Registers an already-built mechanism under its own name.
    pub fn register_instance(&mut self, mechanism: Arc<dyn Mechanism>) -> &mut Self {
        let name = mechanism.name().to_string();
        self.register(name, move || Ok(Arc::clone(&mechanism)))
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered mechanism names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Resolves `name` and builds its provider.
    ///
    /// Fails with [`AuthError::UnknownMechanism`] if nothing is registered
    /// under `name`, and with [`AuthError::LoadFailed`] if the factory fails
    /// or yields a mechanism that answers to a different name.
    pub fn load(&self, name: &str) -> Result<Provider, AuthError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| AuthError::UnknownMechanism(name.to_string()))?;

        let mechanism = factory().map_err(|e| AuthError::LoadFailed {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

        if mechanism.name() != name {
            return Err(AuthError::LoadFailed {
                name: name.to_string(),
                reason: format!("mechanism identifies itself as {}", mechanism.name()),
            });
        }

        debug!(mechanism = %name, id = mechanism.id(), "Mechanism loaded");

        Ok(Provider {
            id: mechanism.id(),
            name: name.to_string(),
            mechanism,
            released: AtomicBool::new(false),
        })
    }

    /// Releases a provider. `None` and already-released providers succeed.
    pub fn unload(&self, provider: Option<&Provider>) -> Result<(), AuthError> {
        let Some(provider) = provider else {
            return Ok(());
        };

        if provider.released.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        debug!(mechanism = %provider.name, "Unloading mechanism");
        provider.mechanism.fini()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.factories.keys()).finish()
    }
}
