//! Opaque credential handle.

use std::any::Any;
use std::fmt;

/// Numeric user id.
pub type Uid = u32;

/// Numeric group id.
pub type Gid = u32;

/// Identity returned when a uid or gid cannot be established.
pub const NOBODY: u32 = 99;

/// A credential produced by a mechanism.
///
/// The facade moves credentials between callers and the mechanism that made
/// them but never looks inside. Only the owning mechanism knows the concrete
/// type and reaches it through [`Credential::downcast_ref`].
pub struct Credential {
    mechanism_id: u32,
    inner: Box<dyn Any + Send + Sync>,
}

impl Credential {
    /// Wraps mechanism-defined state.
    pub fn new<T: Any + Send + Sync>(mechanism_id: u32, inner: T) -> Self {
        Self {
            mechanism_id,
            inner: Box::new(inner),
        }
    }

    /// Id of the mechanism that created this credential.
    pub fn mechanism_id(&self) -> u32 {
        self.mechanism_id
    }

    /// Borrows the mechanism state if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref()
    }

    /// Takes the mechanism state back if it is a `T`.
    pub fn into_inner<T: Any>(self) -> Result<T, Self> {
        let mechanism_id = self.mechanism_id;
        self.inner
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|inner| Self {
                mechanism_id,
                inner,
            })
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("mechanism_id", &self.mechanism_id)
            .finish_non_exhaustive()
    }
}
