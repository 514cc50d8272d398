//! PATCH /update

use axum::{Json, extract::State, response::Response};
use serde::Deserialize;

use crate::state::AppState;
use userhub_auth::{AuthError, BearerAuth, UserChanges};

use super::session_response;

/// Allowed update fields. Anything else in the body is ignored.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Applies an email and/or password change to the caller's account.
///
/// A password change invalidates cached snapshots and forces a fresh
/// token, so the response always carries the session to use from now
/// on.
pub async fn update(
    State(state): State<AppState>,
    BearerAuth(user_id): BearerAuth,
    Json(body): Json<UpdateRequest>,
) -> Result<Response, AuthError> {
    let changes = UserChanges {
        email: body.email,
        password: body.password,
    };
    if changes.is_empty() {
        // The wire contract reports an empty change set as a missing
        // resource, not a validation failure.
        return Err(AuthError::not_found("Nothing found to update"));
    }

    let outcome = state.service().update(&user_id, &changes).await?;
    session_response(&outcome.user_id, &outcome.token, outcome.expires_at)
}
