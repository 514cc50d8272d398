//! Session and account orchestration.
//!
//! [`AuthService`] owns the session protocol: it decides when to trust
//! a cached value, when to mint a new token, when to invalidate, and
//! how to map every outcome to a typed error. The store, the codec and
//! the caches are injected handles; there is no ambient global state.
//!
//! Consistency notes:
//! - The two external-cache directions are written as independent
//!   idempotent upserts; a crash between them leaves a half-entry that
//!   decays via TTL.
//! - A cache-hit renewal extends the *perceived* expiry (`expires_at` is
//!   always now + window) even though the signed token's embedded expiry
//!   does not move. Accepted approximation.
//! - Revocation lives entirely in the external cache; the signed token
//!   itself stays valid until its embedded expiry. Verification always
//!   consults the cache first, and logout leaves a tombstone there so
//!   the codec fallback cannot re-accept a logged-out token.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use time::{Duration, OffsetDateTime};
use userhub_core::User;
use userhub_storage::{StorageError, UserFilter, UserStore};

use crate::AuthResult;
use crate::cache::{LoginCache, SessionCache};
use crate::error::AuthError;
use crate::password::{hash_password, verify_password};
use crate::token::{Claims, TokenCodec};

/// Default validity window for freshly minted tokens.
pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::days(14);

/// Cache value marking a logged-out token. Cannot collide with a user
/// id, which is always a UUID.
const REVOKED: &str = "__revoked__";

/// A minted (or cache-reused) session token with its perceived expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// The bearer token string.
    pub token: String,

    /// Absolute expiry from the caller's perspective.
    pub expires_at: OffsetDateTime,
}

/// Result of a successful login, registration, or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    /// Subject id of the authenticated user.
    pub user_id: String,

    /// The bearer token.
    pub token: String,

    /// Absolute expiry of the session.
    pub expires_at: OffsetDateTime,
}

/// Requested changes for a user update.
///
/// Only email and password may be changed through this path.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    /// New email address, lowercased before storage.
    pub email: Option<String>,

    /// New plaintext password; re-hashed before storage.
    pub password: Option<String>,
}

impl UserChanges {
    /// Returns `true` if no change is requested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.password.is_none()
    }
}

/// The authentication/session core.
pub struct AuthService {
    store: Arc<dyn UserStore>,
    codec: Arc<TokenCodec>,
    sessions: SessionCache,
    login_cache: LoginCache,
    token_lifetime: Duration,
}

impl AuthService {
    /// Creates a new service with the default 14-day token lifetime.
    #[must_use]
    pub fn new(
        store: Arc<dyn UserStore>,
        codec: Arc<TokenCodec>,
        sessions: SessionCache,
        login_cache: LoginCache,
    ) -> Self {
        Self {
            store,
            codec,
            sessions,
            login_cache,
            token_lifetime: DEFAULT_TOKEN_LIFETIME,
        }
    }

    /// Overrides the token validity window.
    #[must_use]
    pub fn with_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.token_lifetime = lifetime;
        self
    }

    fn lifetime_std(&self) -> StdDuration {
        StdDuration::from_secs(self.token_lifetime.whole_seconds().max(0) as u64)
    }

    /// Issues a session token for `user_id`.
    ///
    /// With `force_renew` false, an existing cached token for the
    /// subject is reused without re-signing; otherwise a fresh token is
    /// minted. Both cache directions are written with a TTL equal to
    /// the validity window. `expires_at` is always now + window,
    /// independent of which path produced the token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::TokenCreationFailed`] if the subject id is
    /// blank or signing fails. Cache faults never fail issuance.
    pub async fn issue_token(&self, user_id: &str, force_renew: bool) -> AuthResult<IssuedToken> {
        if user_id.is_empty() {
            return Err(AuthError::token_creation_failed("missing subject id"));
        }

        let cached = if force_renew {
            None
        } else {
            self.sessions.get(user_id).await
        };

        let token = match cached {
            Some(token) => token,
            None => {
                let claims = Claims::new(user_id, self.token_lifetime);
                self.codec
                    .encode(&claims)
                    .map_err(|e| AuthError::token_creation_failed(e.to_string()))?
            }
        };

        let expires_at = OffsetDateTime::now_utc() + self.token_lifetime;
        let ttl = self.lifetime_std();
        self.sessions.set(&token, user_id, ttl).await;
        self.sessions.set(user_id, &token, ttl).await;

        Ok(IssuedToken { token, expires_at })
    }

    /// Authenticates a username/password pair and starts a session.
    ///
    /// The record is located via the login cache first, then the store.
    /// An unknown username and a wrong password produce the identical
    /// [`AuthError::InvalidCredentials`] so callers cannot enumerate
    /// usernames. Login always mints a fresh token.
    ///
    /// # Errors
    ///
    /// `invalid_request` for blank input, `invalid_credentials` on
    /// mismatch, `internal_server_error` for store faults.
    pub async fn login(&self, username: &str, password: &str) -> AuthResult<LoginOutcome> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::invalid_request(
                "Username or password fields can't be blank",
            ));
        }

        let user = match self.login_cache.get(username).await {
            Some(user) => Some(user),
            None => self
                .store
                .find_by_username(username)
                .await
                .map_err(internal_store_error)?,
        };

        let Some(user) = user else {
            return Err(AuthError::InvalidCredentials);
        };

        // An unreadable digest is indistinguishable from a mismatch.
        let password_valid = verify_password(password, &user.password_hash).unwrap_or(false);
        if !password_valid {
            return Err(AuthError::InvalidCredentials);
        }

        let issued = self.issue_token(&user.id, true).await?;
        self.login_cache.insert(&user.username, user.clone()).await;

        tracing::debug!(user_id = %user.id, "login succeeded");
        Ok(LoginOutcome {
            user_id: user.id,
            token: issued.token,
            expires_at: issued.expires_at,
        })
    }

    /// Verifies a bearer header value and returns the subject id.
    ///
    /// Cache-first: a `token -> userId` hit short-circuits signature
    /// verification entirely. On a miss the codec verifies signature
    /// and expiry, and the mapping is backfilled with the token's
    /// remaining validity as TTL.
    ///
    /// # Errors
    ///
    /// Every rejection and capability fault surfaces as
    /// [`AuthError::Unauthorized`]; the cause is client-supplied input
    /// and must never look like a server error.
    pub async fn verify(&self, bearer: &str) -> AuthResult<String> {
        let token = bearer.strip_prefix("Bearer ").unwrap_or(bearer).trim();
        if token.is_empty() {
            return Err(AuthError::unauthorized("Missing bearer token"));
        }

        if let Some(user_id) = self.sessions.get(token).await {
            if user_id == REVOKED {
                return Err(AuthError::unauthorized("Token revoked"));
            }
            return Ok(user_id);
        }

        let claims = self
            .codec
            .decode(token)
            .map_err(|_| AuthError::unauthorized("Authorization failed"))?;

        let remaining = claims.remaining_seconds();
        if remaining > 0 {
            self.sessions
                .set(token, &claims.sub, StdDuration::from_secs(remaining as u64))
                .await;
        }

        Ok(claims.sub)
    }

    /// Ends the session for `user_id`.
    ///
    /// The `userId -> token` entry is deleted; the `token -> userId`
    /// entry is replaced by a revocation marker that lives for the
    /// token's remaining validity, so the verify path rejects the token
    /// before its codec fallback could re-accept it. Revocation only
    /// covers tokens whose cache entry still exists.
    ///
    /// Returns a zero-validity sentinel token so the caller can respond
    /// with a clearly stale credential instead of an empty body.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::TokenCreationFailed`] if the sentinel
    /// cannot be signed.
    pub async fn logout(&self, user_id: &str) -> AuthResult<String> {
        self.revoke_session(user_id).await;

        let claims = Claims::new(user_id, Duration::ZERO);
        self.codec
            .encode(&claims)
            .map_err(|e| AuthError::token_creation_failed(e.to_string()))
    }

    /// Drops the `userId -> token` entry and tombstones the token.
    async fn revoke_session(&self, user_id: &str) {
        if let Some(token) = self.sessions.get(user_id).await {
            let remaining = self
                .codec
                .decode(&token)
                .map(|claims| claims.remaining_seconds())
                .unwrap_or(0);
            if remaining > 0 {
                self.sessions
                    .set(&token, REVOKED, StdDuration::from_secs(remaining as u64))
                    .await;
            } else {
                self.sessions.del(&token).await;
            }
        }
        self.sessions.del(user_id).await;
    }

    /// Returns the admin flag for `user_id`.
    ///
    /// # Errors
    ///
    /// `not_found_error` if the user does not exist,
    /// `internal_server_error` for store faults.
    pub async fn is_admin(&self, user_id: &str) -> AuthResult<bool> {
        let user = self
            .store
            .find_by_id(user_id)
            .await
            .map_err(internal_store_error)?
            .ok_or_else(|| AuthError::not_found("User not found"))?;
        Ok(user.admin)
    }

    /// Registers a new account and immediately logs it in.
    ///
    /// # Errors
    ///
    /// `invalid_request` for blank fields, `duplicate_key` for a taken
    /// username or email, `internal_server_error` otherwise.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> AuthResult<LoginOutcome> {
        if username.is_empty() || email.is_empty() || password.is_empty() {
            return Err(AuthError::invalid_request(
                "Required fields can not be blank",
            ));
        }

        let digest = hash_password(password)
            .map_err(|e| AuthError::internal(format!("password hashing failed: {e}")))?;
        let user = User::new(username, email, digest);
        self.store.insert(&user).await.map_err(map_store_error)?;

        tracing::info!(user_id = %user.id, username = %user.username, "user registered");
        self.login(username, password).await
    }

    /// Applies an email and/or password change to a user.
    ///
    /// A password change re-derives the digest, evicts the login-cache
    /// snapshot for the (old) username, and forces token renewal on the
    /// issuance that follows.
    ///
    /// # Errors
    ///
    /// `validation_error` for an empty change set, `not_found_error` if
    /// the user is gone, `duplicate_key` if the new email is taken.
    pub async fn update(&self, user_id: &str, changes: &UserChanges) -> AuthResult<LoginOutcome> {
        if changes.is_empty() {
            return Err(AuthError::validation("Nothing found to update"));
        }

        let mut user = self
            .store
            .find_by_id(user_id)
            .await
            .map_err(internal_store_error)?
            .ok_or_else(|| AuthError::not_found("User not found"))?;

        if let Some(email) = &changes.email {
            user.email = email.to_lowercase();
        }
        let password_changed = match &changes.password {
            Some(password) => {
                user.password_hash = hash_password(password)
                    .map_err(|e| AuthError::internal(format!("password hashing failed: {e}")))?;
                true
            }
            None => false,
        };

        self.store.update(&user).await.map_err(map_store_error)?;

        if password_changed {
            self.login_cache.invalidate(&user.username).await;
        }

        let issued = self.issue_token(user_id, password_changed).await?;
        Ok(LoginOutcome {
            user_id: user_id.to_string(),
            token: issued.token,
            expires_at: issued.expires_at,
        })
    }

    /// Fetches a user by id.
    ///
    /// # Errors
    ///
    /// `not_found_error` if absent.
    pub async fn get_by_id(&self, user_id: &str) -> AuthResult<User> {
        self.store
            .find_by_id(user_id)
            .await
            .map_err(internal_store_error)?
            .ok_or_else(|| AuthError::not_found("User not found"))
    }

    /// Fetches a user by username.
    ///
    /// # Errors
    ///
    /// `not_found_error` if absent.
    pub async fn get_by_username(&self, username: &str) -> AuthResult<User> {
        self.store
            .find_by_username(username)
            .await
            .map_err(internal_store_error)?
            .ok_or_else(|| AuthError::not_found("User not found"))
    }

    /// Lists users matching a filter.
    ///
    /// # Errors
    ///
    /// `internal_server_error` for store faults.
    pub async fn list(&self, filter: &UserFilter) -> AuthResult<Vec<User>> {
        self.store.list(filter).await.map_err(internal_store_error)
    }

    /// Deletes a user by username and revokes their session.
    ///
    /// # Errors
    ///
    /// `not_found_error` if no such user exists.
    pub async fn delete(&self, username: &str) -> AuthResult<User> {
        let user = self
            .store
            .delete_by_username(username)
            .await
            .map_err(map_store_error)?;

        // Drop any live session and snapshot for the removed account.
        self.revoke_session(&user.id).await;
        self.login_cache.invalidate(&user.username).await;

        tracing::info!(user_id = %user.id, username = %user.username, "user deleted");
        Ok(user)
    }
}

/// Maps storage faults that can carry domain meaning.
fn map_store_error(err: StorageError) -> AuthError {
    match err {
        StorageError::Duplicate { field } => AuthError::duplicate_key(field),
        StorageError::NotFound => AuthError::not_found("User not found"),
        StorageError::Unavailable { message } => AuthError::internal(message),
    }
}

/// Maps storage faults where duplicates/not-found cannot occur.
fn internal_store_error(err: StorageError) -> AuthError {
    match err {
        StorageError::NotFound => AuthError::not_found("User not found"),
        other => AuthError::internal(other.to_string()),
    }
}
