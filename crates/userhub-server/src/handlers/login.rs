//! POST /login

use axum::{Json, extract::State, response::Response};
use serde::Deserialize;

use crate::state::AppState;
use userhub_auth::AuthError;

use super::session_response;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Response, AuthError> {
    let outcome = state
        .service()
        .login(&body.username, &body.password)
        .await?;
    session_response(&outcome.user_id, &outcome.token, outcome.expires_at)
}
