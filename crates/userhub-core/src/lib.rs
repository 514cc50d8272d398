//! # userhub-core
//!
//! Shared domain types for the userhub account service.
//!
//! This crate provides the [`User`] record and its redacted
//! [`PublicUser`] view. The error taxonomy lives in `userhub-auth`,
//! which owns the HTTP mapping for it.

pub mod user;

pub use user::{PublicUser, User, UserBuilder};
