//! Shared application state.

use std::sync::Arc;

use axum::extract::FromRef;
use userhub_auth::{AuthService, AuthState};

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthState,
}

impl AppState {
    #[must_use]
    pub fn new(service: Arc<AuthService>) -> Self {
        Self {
            auth: AuthState::new(service),
        }
    }

    /// The shared auth core.
    #[must_use]
    pub fn service(&self) -> &Arc<AuthService> {
        &self.auth.service
    }
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}
