//! User store trait and list filter.
//!
//! Defines the interface for user persistence. Implementations handle
//! the actual storage; callers never see backend-specific errors.

use async_trait::async_trait;
use serde::Deserialize;
use userhub_core::User;

use crate::error::StorageResult;

/// Filter for listing users.
///
/// All fields are optional; an entirely empty filter is rejected at the
/// HTTP layer rather than returning the whole collection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    /// Exact username match (case-insensitive).
    pub username: Option<String>,

    /// Exact email match (lowercased before comparison).
    pub email: Option<String>,

    /// Admin flag match.
    pub admin: Option<bool>,

    /// Active flag match.
    pub active: Option<bool>,

    /// Maximum number of records to return.
    pub limit: Option<usize>,
}

impl UserFilter {
    /// Returns `true` if no criterion is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.admin.is_none()
            && self.active.is_none()
            && self.limit.is_none()
    }

    /// Returns `true` if the user matches every set criterion.
    #[must_use]
    pub fn matches(&self, user: &User) -> bool {
        if let Some(username) = &self.username {
            if !user.username.eq_ignore_ascii_case(username) {
                return false;
            }
        }
        if let Some(email) = &self.email {
            if user.email != email.to_lowercase() {
                return false;
            }
        }
        if let Some(admin) = self.admin {
            if user.admin != admin {
                return false;
            }
        }
        if let Some(active) = self.active {
            if user.active != active {
                return false;
            }
        }
        true
    }
}

/// Storage operations for user records.
///
/// Backends must enforce username uniqueness case-insensitively and
/// email uniqueness on the lowercased value.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user by their unique ID.
    ///
    /// Returns `None` if the user doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_id(&self, user_id: &str) -> StorageResult<Option<User>>;

    /// Find a user by username, matched case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_username(&self, username: &str) -> StorageResult<Option<User>>;

    /// Find a user by email (compared lowercased).
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_email(&self, email: &str) -> StorageResult<Option<User>>;

    /// Insert a new user.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::Duplicate`] if the username or
    /// email is already taken, or an error if the operation fails.
    async fn insert(&self, user: &User) -> StorageResult<()>;

    /// Replace an existing user record (matched by id).
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::NotFound`] if no record has the
    /// given id, [`crate::StorageError::Duplicate`] if the new email or
    /// username collides with another record.
    async fn update(&self, user: &User) -> StorageResult<()>;

    /// Delete a user by username. Returns the deleted record.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::NotFound`] if no such user exists.
    async fn delete_by_username(&self, username: &str) -> StorageResult<User>;

    /// List users matching the filter, up to `filter.limit`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn list(&self, filter: &UserFilter) -> StorageResult<Vec<User>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter() {
        assert!(UserFilter::default().is_empty());

        let filter = UserFilter {
            admin: Some(true),
            ..Default::default()
        };
        assert!(!filter.is_empty());
    }

    #[test]
    fn test_filter_matching() {
        let user = User::builder("Alice", "alice@example.com", "digest")
            .admin(true)
            .build();

        let filter = UserFilter {
            username: Some("alice".into()),
            admin: Some(true),
            ..Default::default()
        };
        assert!(filter.matches(&user));

        let filter = UserFilter {
            email: Some("Alice@Example.com".into()),
            ..Default::default()
        };
        assert!(filter.matches(&user));

        let filter = UserFilter {
            active: Some(false),
            ..Default::default()
        };
        assert!(!filter.matches(&user));
    }
}
