//! GET /me

use axum::{Json, extract::State};
use userhub_auth::{AuthError, BearerAuth};
use userhub_core::PublicUser;

use crate::state::AppState;

/// Returns the authenticated caller's record, digest excluded.
pub async fn who_am_i(
    State(state): State<AppState>,
    BearerAuth(user_id): BearerAuth,
) -> Result<Json<PublicUser>, AuthError> {
    let user = state.service().get_by_id(&user_id).await?;
    Ok(Json(user.to_public()))
}
