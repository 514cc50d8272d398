//! POST /register

use axum::{Json, extract::State, response::Response};
use serde::Deserialize;

use crate::state::AppState;
use userhub_auth::AuthError;

use super::session_response;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Creates an account and starts a session in one call.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Response, AuthError> {
    let outcome = state
        .service()
        .register(&body.username, &body.email, &body.password)
        .await?;
    session_response(&outcome.user_id, &outcome.token, outcome.expires_at)
}
