//! # userhub-auth
//!
//! Authentication and session core for the userhub account service.
//!
//! This crate owns the session protocol: token issuance and renewal,
//! cache-first verification, logout revocation, password-change
//! invalidation, and the admin gate. The record store and the signing
//! primitive are collaborators behind narrow interfaces.
//!
//! ## Modules
//!
//! - [`error`] - Error taxonomy and wire codes
//! - [`token`] - RS256 token codec (mint/verify)
//! - [`password`] - Argon2 password hashing
//! - [`cache`] - External session cache and in-process login cache
//! - [`service`] - [`AuthService`] orchestration layer
//! - [`middleware`] - Axum extractors and error responses

pub mod cache;
pub mod error;
pub mod middleware;
pub mod password;
pub mod service;
pub mod token;

pub use cache::{LoginCache, SessionCache};
pub use error::AuthError;
pub use middleware::{AdminAuth, AuthState, BearerAuth};
pub use service::{AuthService, IssuedToken, LoginOutcome, UserChanges};
pub use token::{Claims, TokenCodec, TokenError};

/// Convenience result alias for auth operations.
pub type AuthResult<T> = Result<T, AuthError>;
