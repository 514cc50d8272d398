//! # userhub-server
//!
//! HTTP surface for the userhub account service: configuration,
//! tracing bootstrap, the axum router, and the request handlers.

pub mod config;
pub mod handlers;
pub mod observability;
pub mod routes;
pub mod state;

pub use config::AppConfig;
pub use routes::build_router;
pub use state::AppState;
