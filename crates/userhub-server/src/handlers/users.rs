//! GET /users

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use userhub_auth::{AuthError, BearerAuth};
use userhub_core::PublicUser;
use userhub_storage::UserFilter;

use crate::state::AppState;

/// Raw query parameters, before validation.
///
/// Values arrive as strings so blank values can be rejected with a
/// clear error rather than a deserializer failure. Unknown parameters
/// are ignored; only this allow-list participates in filtering.
#[derive(Debug, Default, Deserialize)]
pub struct UsersQuery {
    pub username: Option<String>,
    pub email: Option<String>,
    pub admin: Option<String>,
    pub active: Option<String>,
    pub limit: Option<String>,
}

impl UsersQuery {
    fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.admin.is_none()
            && self.active.is_none()
            && self.limit.is_none()
    }

    fn into_filter(self) -> Result<UserFilter, AuthError> {
        Ok(UserFilter {
            username: non_blank("username", self.username)?,
            email: non_blank("email", self.email)?,
            admin: parse_flag("admin", self.admin)?,
            active: parse_flag("active", self.active)?,
            limit: parse_limit(self.limit)?,
        })
    }
}

fn non_blank(name: &str, value: Option<String>) -> Result<Option<String>, AuthError> {
    match value {
        Some(v) if v.is_empty() => Err(AuthError::invalid_request(format!(
            "Query parameter '{name}' can't be blank"
        ))),
        other => Ok(other),
    }
}

fn parse_flag(name: &str, value: Option<String>) -> Result<Option<bool>, AuthError> {
    match non_blank(name, value)? {
        Some(v) => v.parse::<bool>().map(Some).map_err(|_| {
            AuthError::invalid_request(format!("Query parameter '{name}' must be true or false"))
        }),
        None => Ok(None),
    }
}

fn parse_limit(value: Option<String>) -> Result<Option<usize>, AuthError> {
    match non_blank("limit", value)? {
        Some(v) => v.parse::<usize>().map(Some).map_err(|_| {
            AuthError::invalid_request("Query parameter 'limit' must be a positive integer")
        }),
        None => Ok(None),
    }
}

/// Lists users matching the query filter.
///
/// An empty filter is rejected rather than dumping the collection, and
/// an empty result set is a 404 like any other missing resource.
pub async fn users(
    State(state): State<AppState>,
    BearerAuth(_user_id): BearerAuth,
    Query(query): Query<UsersQuery>,
) -> Result<Json<Vec<PublicUser>>, AuthError> {
    if query.is_empty() {
        return Err(AuthError::not_found("Invalid or empty query"));
    }

    let filter = query.into_filter()?;
    let matches = state.service().list(&filter).await?;
    if matches.is_empty() {
        return Err(AuthError::not_found("No users matched the query"));
    }

    Ok(Json(matches.iter().map(|u| u.to_public()).collect()))
}
