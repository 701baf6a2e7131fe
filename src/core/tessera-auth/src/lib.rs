//! # Tessera Auth
//!
//! Pluggable authentication facade.
//!
//! Callers authenticate peers through one fixed set of operations while the
//! concrete mechanism is chosen by name at startup:
//!
//! - [`Mechanism`]: the operations a mechanism implements
//! - [`Registry`]: name-to-mechanism lookup, load and unload
//! - [`AuthContext`]: single-initialization lifecycle and dispatch
//! - [`codec`]: versioned credential envelopes
//! - [`resolver`]: generic-first error descriptions
//! - [`global`]: the process-wide `auth_*` functions
//!
//! ## Example
//!
//! ```ignore
//! let mut registry = Registry::new();
//! tessera_auth_none::register(&mut registry);
//!
//! let ctx = AuthContext::new(registry, "auth/none");
//! let cred = ctx.create(Some("uid=1000,gid=1000,host=node01"))?;
//!
//! let mut buf = BytesMut::new();
//! ctx.pack(&cred, &mut buf, ProtocolVersion::CURRENT)?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth_info;
pub mod code;
pub mod codec;
pub mod config;
pub mod context;
pub mod credential;
pub mod error;
pub mod facade;
pub mod global;
pub mod mechanism;
pub mod registry;
pub mod resolver;
pub mod version;

#[cfg(test)]
pub(crate) mod testing;

pub use auth_info::AuthInfo;
pub use code::{ErrorCode, FIRST_MECHANISM_ERROR};
pub use codec::WireFormat;
pub use config::AuthConfig;
pub use context::AuthContext;
pub use credential::{Credential, Gid, Uid, NOBODY};
pub use error::AuthError;
pub use mechanism::Mechanism;
pub use registry::{MechanismFactory, Provider, Registry};
pub use version::ProtocolVersion;

pub use bytes;
