//! GET /logout

use axum::{extract::State, response::Response};
use time::OffsetDateTime;

use crate::state::AppState;
use userhub_auth::{AuthError, BearerAuth};

use super::session_response;

/// Revokes the caller's session.
///
/// The response carries the zero-validity sentinel token and an expiry
/// header set to now, so clients see an unambiguously dead credential.
pub async fn logout(
    State(state): State<AppState>,
    BearerAuth(user_id): BearerAuth,
) -> Result<Response, AuthError> {
    let token = state.service().logout(&user_id).await?;
    session_response(&user_id, &token, OffsetDateTime::now_utc())
}
