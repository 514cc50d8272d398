//! In-memory user store.
//!
//! Backed by `DashMap` with secondary indexes for the two unique
//! fields. Suitable for tests and single-node deployments; a durable
//! backend implements the same [`UserStore`] trait.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use userhub_core::User;

use crate::error::{StorageError, StorageResult};
use crate::store::{UserFilter, UserStore};

/// DashMap-backed [`UserStore`].
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    /// Primary records keyed by id.
    users: DashMap<String, User>,
    /// Lowercased username -> id.
    by_username: DashMap<String, String>,
    /// Lowercased email -> id.
    by_email: DashMap<String, String>,
}

impl MemoryUserStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Returns `true` if the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn username_key(username: &str) -> String {
        username.to_lowercase()
    }

    fn email_key(email: &str) -> String {
        email.to_lowercase()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, user_id: &str) -> StorageResult<Option<User>> {
        Ok(self.users.get(user_id).map(|u| u.clone()))
    }

    async fn find_by_username(&self, username: &str) -> StorageResult<Option<User>> {
        let Some(id) = self
            .by_username
            .get(&Self::username_key(username))
            .map(|id| id.clone())
        else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn find_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        let Some(id) = self
            .by_email
            .get(&Self::email_key(email))
            .map(|id| id.clone())
        else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn insert(&self, user: &User) -> StorageResult<()> {
        let uname = Self::username_key(&user.username);
        let email = Self::email_key(&user.email);

        // Reserve the indexes through the entry API so two concurrent
        // inserts cannot both pass a lookup and then both write.
        match self.by_username.entry(uname.clone()) {
            Entry::Occupied(_) => return Err(StorageError::duplicate("username")),
            Entry::Vacant(slot) => {
                slot.insert(user.id.clone());
            }
        }
        match self.by_email.entry(email) {
            Entry::Occupied(_) => {
                // Roll back the username reservation.
                self.by_username.remove(&uname);
                return Err(StorageError::duplicate("email"));
            }
            Entry::Vacant(slot) => {
                slot.insert(user.id.clone());
            }
        }

        self.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> StorageResult<()> {
        let Some(existing) = self.users.get(&user.id).map(|u| u.clone()) else {
            return Err(StorageError::NotFound);
        };

        let old_uname = Self::username_key(&existing.username);
        let old_email = Self::email_key(&existing.email);
        let new_uname = Self::username_key(&user.username);
        let new_email = Self::email_key(&user.email);

        // Reserve the changed index keys first, then drop the old
        // ones, so a concurrent insert or update cannot claim the same
        // key in between.
        let uname_changed = new_uname != old_uname;
        if uname_changed {
            match self.by_username.entry(new_uname.clone()) {
                Entry::Occupied(slot) if *slot.get() != user.id => {
                    return Err(StorageError::duplicate("username"));
                }
                Entry::Occupied(_) => {}
                Entry::Vacant(slot) => {
                    slot.insert(user.id.clone());
                }
            }
        }
        let email_changed = new_email != old_email;
        if email_changed {
            match self.by_email.entry(new_email.clone()) {
                Entry::Occupied(slot) if *slot.get() != user.id => {
                    if uname_changed {
                        self.by_username.remove(&new_uname);
                    }
                    return Err(StorageError::duplicate("email"));
                }
                Entry::Occupied(_) => {}
                Entry::Vacant(slot) => {
                    slot.insert(user.id.clone());
                }
            }
        }

        if uname_changed {
            self.by_username.remove(&old_uname);
        }
        if email_changed {
            self.by_email.remove(&old_email);
        }
        self.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn delete_by_username(&self, username: &str) -> StorageResult<User> {
        let Some((_, id)) = self.by_username.remove(&Self::username_key(username)) else {
            return Err(StorageError::NotFound);
        };
        let Some((_, user)) = self.users.remove(&id) else {
            return Err(StorageError::NotFound);
        };
        self.by_email.remove(&Self::email_key(&user.email));
        Ok(user)
    }

    async fn list(&self, filter: &UserFilter) -> StorageResult<Vec<User>> {
        let limit = filter.limit.unwrap_or(usize::MAX);
        let mut matched: Vec<User> = self
            .users
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        // Deterministic ordering for pagination-style limits.
        matched.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        matched.truncate(limit);
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::Barrier;

    use super::*;

    fn user(name: &str, email: &str) -> User {
        User::new(name, email, "digest")
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = MemoryUserStore::new();
        let alice = user("alice", "alice@example.com");
        store.insert(&alice).await.unwrap();

        let found = store.find_by_id(&alice.id).await.unwrap().unwrap();
        assert_eq!(found.username, "alice");

        // Username lookup is case-insensitive.
        let found = store.find_by_username("ALICE").await.unwrap().unwrap();
        assert_eq!(found.id, alice.id);

        let found = store
            .find_by_email("Alice@Example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, alice.id);
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let store = MemoryUserStore::new();
        store
            .insert(&user("alice", "alice@example.com"))
            .await
            .unwrap();

        let err = store
            .insert(&user("Alice", "other@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Duplicate { ref field } if field == "username"));
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryUserStore::new();
        store
            .insert(&user("alice", "alice@example.com"))
            .await
            .unwrap();

        let err = store
            .insert(&user("bob", "ALICE@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Duplicate { ref field } if field == "email"));
    }

    #[tokio::test]
    async fn test_duplicate_email_releases_username_reservation() {
        let store = MemoryUserStore::new();
        store
            .insert(&user("alice", "alice@example.com"))
            .await
            .unwrap();

        // Rejected on the email, so "bob" must stay claimable.
        let err = store
            .insert(&user("bob", "alice@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Duplicate { ref field } if field == "email"));

        store.insert(&user("bob", "bob@example.com")).await.unwrap();
        assert_eq!(store.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_inserts_admit_one_winner() {
        const TASKS: usize = 8;

        for round in 0..100 {
            let store = Arc::new(MemoryUserStore::new());
            let barrier = Arc::new(Barrier::new(TASKS));

            let mut handles = Vec::with_capacity(TASKS);
            for i in 0..TASKS {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                handles.push(tokio::spawn(async move {
                    let contender = user("alice", &format!("alice{i}@example.com"));
                    barrier.wait().await;
                    store.insert(&contender).await.is_ok()
                }));
            }

            let mut admitted = 0;
            for handle in handles {
                if handle.await.unwrap() {
                    admitted += 1;
                }
            }
            assert_eq!(admitted, 1, "round {round}: username claimed twice");
            assert_eq!(store.len(), 1);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_admit_one_winner() {
        const TASKS: usize = 4;

        for round in 0..100 {
            let store = Arc::new(MemoryUserStore::new());
            let mut contenders = Vec::with_capacity(TASKS);
            for i in 0..TASKS {
                let u = user(&format!("user{i}"), &format!("user{i}@example.com"));
                store.insert(&u).await.unwrap();
                contenders.push(u);
            }

            let barrier = Arc::new(Barrier::new(TASKS));
            let mut handles = Vec::with_capacity(TASKS);
            for mut contender in contenders {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                handles.push(tokio::spawn(async move {
                    contender.email = "shared@example.com".into();
                    barrier.wait().await;
                    store.update(&contender).await.is_ok()
                }));
            }

            let mut admitted = 0;
            for handle in handles {
                if handle.await.unwrap() {
                    admitted += 1;
                }
            }
            assert_eq!(admitted, 1, "round {round}: email claimed twice");
        }
    }

    #[tokio::test]
    async fn test_update_replaces_record() {
        let store = MemoryUserStore::new();
        let mut alice = user("alice", "alice@example.com");
        store.insert(&alice).await.unwrap();

        alice.email = "new@example.com".into();
        store.update(&alice).await.unwrap();

        assert!(
            store
                .find_by_email("alice@example.com")
                .await
                .unwrap()
                .is_none()
        );
        let found = store.find_by_email("new@example.com").await.unwrap();
        assert_eq!(found.unwrap().id, alice.id);
    }

    #[tokio::test]
    async fn test_update_missing_record() {
        let store = MemoryUserStore::new();
        let ghost = user("ghost", "ghost@example.com");
        let err = store.update(&ghost).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn test_update_email_collision() {
        let store = MemoryUserStore::new();
        store
            .insert(&user("alice", "alice@example.com"))
            .await
            .unwrap();
        let mut bob = user("bob", "bob@example.com");
        store.insert(&bob).await.unwrap();

        bob.email = "alice@example.com".into();
        let err = store.update(&bob).await.unwrap_err();
        assert!(matches!(err, StorageError::Duplicate { ref field } if field == "email"));
    }

    #[tokio::test]
    async fn test_delete_by_username() {
        let store = MemoryUserStore::new();
        let alice = user("alice", "alice@example.com");
        store.insert(&alice).await.unwrap();

        let deleted = store.delete_by_username("alice").await.unwrap();
        assert_eq!(deleted.id, alice.id);
        assert!(store.is_empty());
        assert!(
            store
                .find_by_email("alice@example.com")
                .await
                .unwrap()
                .is_none()
        );

        let err = store.delete_by_username("alice").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn test_list_with_filter_and_limit() {
        let store = MemoryUserStore::new();
        store
            .insert(&user("alice", "alice@example.com"))
            .await
            .unwrap();
        store
            .insert(&user("bob", "bob@example.com"))
            .await
            .unwrap();
        let admin = User::builder("root", "root@example.com", "digest")
            .admin(true)
            .build();
        store.insert(&admin).await.unwrap();

        let filter = UserFilter {
            admin: Some(false),
            ..Default::default()
        };
        assert_eq!(store.list(&filter).await.unwrap().len(), 2);

        let filter = UserFilter {
            active: Some(true),
            limit: Some(1),
            ..Default::default()
        };
        assert_eq!(store.list(&filter).await.unwrap().len(), 1);
    }
}
