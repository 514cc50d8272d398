//! DELETE /delete

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::state::AppState;
use userhub_auth::{AdminAuth, AuthError};

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub username: String,
}

/// Deletes a user by username. Admin only, and never the caller's own
/// account.
pub async fn delete_user(
    State(state): State<AppState>,
    AdminAuth(admin_id): AdminAuth,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<Value>, AuthError> {
    if query.username.is_empty() {
        return Err(AuthError::invalid_request("Missing username"));
    }

    let target = state.service().get_by_username(&query.username).await?;

    let admin = state.service().get_by_id(&admin_id).await?;
    if admin.username.eq_ignore_ascii_case(&target.username) {
        return Err(AuthError::invalid_request("Cannot delete own user"));
    }

    state.service().delete(&target.username).await?;
    tracing::info!(admin_id = %admin_id, username = %target.username, "user deleted by admin");
    Ok(Json(json!({ "message": "User deleted successfully" })))
}
