//! Request handlers.
//!
//! Handlers stay thin: parse input, call the auth core, serialize the
//! result. All error mapping lives in the `AuthError` response impl.

pub mod delete;
pub mod login;
pub mod logout;
pub mod me;
pub mod register;
pub mod update;
pub mod users;

use axum::{
    Json,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use userhub_auth::AuthError;

/// Header carrying the session's absolute expiry as an ISO-8601
/// timestamp.
pub const EXPIRES_AFTER: &str = "X-Expires-After";

/// Builds the `{userId, token}` session body with the expiry header.
fn session_response(
    user_id: &str,
    token: &str,
    expires_at: OffsetDateTime,
) -> Result<Response, AuthError> {
    let expiry = expires_at
        .format(&Rfc3339)
        .map_err(|e| AuthError::internal(format!("expiry formatting failed: {e}")))?;
    let header = HeaderValue::from_str(&expiry)
        .map_err(|e| AuthError::internal(format!("expiry header invalid: {e}")))?;

    let body = json!({ "userId": user_id, "token": token });
    let mut response = (StatusCode::OK, Json(body)).into_response();
    response.headers_mut().insert(EXPIRES_AFTER, header);
    Ok(response)
}
