//! # userhub-storage
//!
//! Record store abstraction for userhub.
//!
//! The store is an opaque collaborator from the auth core's point of
//! view: it enforces the two uniqueness constraints (username, email)
//! and exposes lookups by id and username. Backends implement
//! [`UserStore`]; [`MemoryUserStore`] is the in-process backend used by
//! tests and single-node deployments.

pub mod error;
pub mod memory;
pub mod store;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryUserStore;
pub use store::{UserFilter, UserStore};
