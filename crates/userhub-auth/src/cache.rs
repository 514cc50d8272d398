//! Session caches.
//!
//! Two independent caches back the session protocol:
//!
//! - [`SessionCache`]: the shared external cache holding both
//!   `token -> userId` and `userId -> token` entries. In Redis mode it
//!   is shared by every server instance; the in-memory mode serves
//!   tests and single-node deployments. Session entries are never
//!   promoted into a per-process tier: logout revokes by deleting the
//!   shared entry, and a warm local copy on another instance would keep
//!   accepting a revoked token.
//! - [`LoginCache`]: a per-process `username -> User` snapshot cache
//!   that saves a record-store round trip right after login. It is
//!   eventually consistent across instances and explicitly invalidated
//!   on password change.
//!
//! All cache faults are logged and swallowed: the cache is an
//! accelerator, never the source of issuance success.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use deadpool_redis::Pool;
use redis::AsyncCommands;
use userhub_core::User;

/// A cached string value with its expiry instant.
#[derive(Clone, Debug)]
pub struct SessionEntry {
    value: String,
    expires_at: Instant,
}

impl SessionEntry {
    fn new(value: String, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Shared external cache for session entries.
///
/// Both entry shapes (`token -> userId`, `userId -> token`) live under
/// one namespace. Writes and deletes are best-effort; a half-written
/// pair decays via TTL.
#[derive(Clone)]
pub enum SessionCache {
    /// Single-instance: in-process map with per-entry TTL.
    Memory(Arc<DashMap<String, SessionEntry>>),

    /// Multi-instance: shared Redis.
    Redis(Pool),
}

/// Key prefix separating session entries from anything else in the
/// shared Redis database.
const NAMESPACE: &str = "session:";

impl SessionCache {
    /// Creates a new in-memory cache.
    #[must_use]
    pub fn new_memory() -> Self {
        Self::Memory(Arc::new(DashMap::new()))
    }

    /// Creates a Redis-backed cache from a connection pool.
    #[must_use]
    pub fn new_redis(pool: Pool) -> Self {
        Self::Redis(pool)
    }

    fn namespaced(key: &str) -> String {
        format!("{NAMESPACE}{key}")
    }

    /// Get a value from the cache.
    pub async fn get(&self, key: &str) -> Option<String> {
        match self {
            Self::Memory(map) => {
                if let Some(entry) = map.get(key) {
                    if !entry.is_expired() {
                        return Some(entry.value.clone());
                    }
                    drop(entry);
                    map.remove(key);
                }
                None
            }
            Self::Redis(pool) => {
                let key = Self::namespaced(key);
                match pool.get().await {
                    Ok(mut conn) => match conn.get::<_, Option<String>>(&key).await {
                        Ok(value) => value,
                        Err(e) => {
                            tracing::warn!(error = %e, "session cache GET error");
                            None
                        }
                    },
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to get Redis connection");
                        None
                    }
                }
            }
        }
    }

    /// Set a value with a TTL. Non-positive TTLs are ignored.
    ///
    /// Redis writes are fire-and-forget: a cache-write failure must not
    /// mask issuance success.
    pub async fn set(&self, key: &str, value: &str, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }
        match self {
            Self::Memory(map) => {
                map.insert(key.to_string(), SessionEntry::new(value.to_string(), ttl));
            }
            Self::Redis(pool) => {
                let pool = pool.clone();
                let key = Self::namespaced(key);
                let value = value.to_string();
                let ttl_secs = ttl.as_secs().max(1);
                tokio::spawn(async move {
                    match pool.get().await {
                        Ok(mut conn) => {
                            if let Err(e) =
                                conn.set_ex::<_, _, ()>(&key, &value, ttl_secs).await
                            {
                                tracing::warn!(error = %e, "session cache SET error");
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "failed to get Redis connection");
                        }
                    }
                });
            }
        }
    }

    /// Delete an entry. Best-effort in Redis mode.
    pub async fn del(&self, key: &str) {
        match self {
            Self::Memory(map) => {
                map.remove(key);
            }
            Self::Redis(pool) => {
                let pool = pool.clone();
                let key = Self::namespaced(key);
                tokio::spawn(async move {
                    match pool.get().await {
                        Ok(mut conn) => {
                            if let Err(e) = conn.del::<_, ()>(&key).await {
                                tracing::warn!(error = %e, "session cache DEL error");
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "failed to get Redis connection");
                        }
                    }
                });
            }
        }
    }
}

/// Per-process `username -> User` snapshot cache.
///
/// Keys are lowercased so lookups match the store's case-insensitive
/// username collation.
#[derive(Clone)]
pub struct LoginCache {
    cache: moka::future::Cache<String, User>,
}

impl LoginCache {
    /// Creates a cache with the given TTL and capacity.
    #[must_use]
    pub fn new(ttl: Duration, capacity: u64) -> Self {
        Self {
            cache: moka::future::Cache::builder()
                .time_to_live(ttl)
                .max_capacity(capacity)
                .build(),
        }
    }

    /// Get a cached record snapshot.
    pub async fn get(&self, username: &str) -> Option<User> {
        self.cache.get(&username.to_lowercase()).await
    }

    /// Cache a record snapshot.
    pub async fn insert(&self, username: &str, user: User) {
        self.cache.insert(username.to_lowercase(), user).await;
    }

    /// Evict the entry for a username.
    ///
    /// Called on password change so a stale digest can never satisfy a
    /// later login check.
    pub async fn invalidate(&self, username: &str) {
        self.cache.invalidate(&username.to_lowercase()).await;
    }
}
