//! Axum extractors and HTTP error responses.
//!
//! [`BearerAuth`] authenticates a request and hands the handler the
//! subject id. [`AdminAuth`] additionally gates on the admin flag.
//! [`AuthError`] implements `IntoResponse` so extractors and handlers
//! can return it directly; every error kind maps to a fixed status and
//! a structured JSON envelope.

use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::AuthError;
use crate::service::AuthService;

/// State required by the authentication extractors.
///
/// Include this in the application state and expose it via `FromRef`.
#[derive(Clone)]
pub struct AuthState {
    /// The shared auth core.
    pub service: Arc<AuthService>,
}

impl AuthState {
    /// Creates a new auth state.
    #[must_use]
    pub fn new(service: Arc<AuthService>) -> Self {
        Self { service }
    }
}

/// Extractor that authenticates the request's bearer token.
///
/// Yields the authenticated user id. Missing header, malformed token,
/// expired token and revoked session all reject with `unauthorized`.
pub struct BearerAuth(pub String);

impl<S> FromRequestParts<S> for BearerAuth
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AuthError::unauthorized("Missing Authorization header"))?;

        let user_id = auth_state.service.verify(header).await?;
        Ok(BearerAuth(user_id))
    }
}

/// Extractor that authenticates and requires the admin flag.
///
/// A valid session without the flag is rejected with `unauthorized`,
/// not `not_found`: the caller is known, just not permitted.
pub struct AdminAuth(pub String);

impl<S> FromRequestParts<S> for AdminAuth
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let BearerAuth(user_id) = BearerAuth::from_request_parts(parts, state).await?;

        let auth_state = AuthState::from_ref(state);
        if !auth_state.service.is_admin(&user_id).await? {
            tracing::debug!(user_id = %user_id, "admin gate rejected non-admin user");
            return Err(AuthError::unauthorized("Admin privileges required"));
        }

        Ok(AdminAuth(user_id))
    }
}

/// Maps an error kind to its HTTP status.
fn status_for(error: &AuthError) -> StatusCode {
    match error {
        AuthError::InvalidRequest { .. } | AuthError::ValidationError { .. } => {
            StatusCode::BAD_REQUEST
        }
        // Failed logins report 404, not 401; see DESIGN.md.
        AuthError::InvalidCredentials | AuthError::NotFound { .. } => StatusCode::NOT_FOUND,
        AuthError::DuplicateKey { .. } => StatusCode::CONFLICT,
        AuthError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
        AuthError::TokenCreationFailed { .. } | AuthError::Internal { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Builds the `error` object for the response envelope.
fn error_details(error: &AuthError) -> serde_json::Value {
    match error {
        // Internal faults are masked; the reason goes in a separate
        // field and the message stays generic.
        AuthError::Internal { reason } => json!({
            "type": error.error_type(),
            "message": "Internal Server Error",
            "reason": reason,
        }),
        other => json!({
            "type": other.error_type(),
            "message": other.to_string(),
        }),
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = status_for(&self);

        if self.is_server_error() {
            tracing::error!(error = %self, "request failed with server error");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }

        let body = json!({ "error": error_details(&self) });
        (status, Json(body)).into_response()
    }
}
