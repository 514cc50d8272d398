//! User record and its public (redacted) view.
//!
//! The password digest lives only on [`User`]; everything that crosses
//! the HTTP boundary goes through [`PublicUser`], which has no digest
//! field at all.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

fn default_datetime() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// A user account record as stored in the record store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier, a UUID string.
    #[serde(default)]
    pub id: String,

    /// Username, globally unique (case-insensitively).
    pub username: String,

    /// Email address, globally unique, stored lowercased.
    pub email: String,

    /// Argon2 PHC-string digest of the password.
    ///
    /// Never expose this via the API; convert to [`PublicUser`] first.
    #[serde(default)]
    pub password_hash: String,

    /// Whether the user may perform administrative operations.
    #[serde(default)]
    pub admin: bool,

    /// Whether the account is active.
    #[serde(default = "default_true")]
    pub active: bool,

    /// When the account was created.
    #[serde(default = "default_datetime", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

fn default_true() -> bool {
    true
}

impl User {
    /// Creates a new user with a fresh UUID, active and non-admin.
    ///
    /// The email is lowercased on construction.
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.into(),
            email: email.into().to_lowercase(),
            password_hash: password_hash.into(),
            admin: false,
            active: true,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    /// Creates a new user builder.
    #[must_use]
    pub fn builder(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> UserBuilder {
        UserBuilder::new(username, email, password_hash)
    }

    /// Returns `true` if the account is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns the redacted view safe for API responses.
    #[must_use]
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            admin: self.admin,
            active: self.active,
            created_at: self.created_at,
        }
    }
}

/// Builder for [`User`] instances.
pub struct UserBuilder {
    user: User,
}

impl UserBuilder {
    fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            user: User::new(username, email, password_hash),
        }
    }

    /// Sets the user ID.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.user.id = id.into();
        self
    }

    /// Sets the admin flag.
    #[must_use]
    pub fn admin(mut self, admin: bool) -> Self {
        self.user.admin = admin;
        self
    }

    /// Sets the active flag.
    #[must_use]
    pub fn active(mut self, active: bool) -> Self {
        self.user.active = active;
        self
    }

    /// Builds the user.
    #[must_use]
    pub fn build(self) -> User {
        self.user
    }
}

/// A user record with the password digest stripped.
///
/// This is the only user shape handlers are allowed to serialize.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublicUser {
    /// Unique identifier.
    pub id: String,

    /// Username.
    pub username: String,

    /// Email address (lowercased).
    pub email: String,

    /// Admin flag.
    pub admin: bool,

    /// Active flag.
    pub active: bool,

    /// Creation timestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
