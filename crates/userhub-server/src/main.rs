use std::{env, sync::Arc};

use userhub_auth::{AuthService, LoginCache, SessionCache, TokenCodec};
use userhub_server::config::loader::load_config;
use userhub_server::{AppState, build_router, observability};
use userhub_storage::MemoryUserStore;

#[tokio::main]
async fn main() {
    // Load .env if present; absence is not an error.
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    observability::init_tracing();

    let config_path = resolve_config_path();
    let cfg = match load_config(Some(&config_path)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };
    tracing::info!(path = %config_path, "Configuration loaded");
    if !observability::apply_logging_level(&cfg.logging.level) {
        tracing::debug!("Configured log level not applied, RUST_LOG is in effect");
    }

    let codec = match build_codec(&cfg) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Token codec initialization failed: {e}");
            std::process::exit(2);
        }
    };

    let sessions = match build_session_cache(&cfg) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Session cache initialization failed: {e}");
            std::process::exit(2);
        }
    };

    let login_cache = LoginCache::new(cfg.cache.login_ttl, cfg.cache.login_capacity);
    let store = Arc::new(MemoryUserStore::new());
    let lifetime = time::Duration::seconds(cfg.auth.token_lifetime.as_secs() as i64);
    let service = Arc::new(
        AuthService::new(store, Arc::new(codec), sessions, login_cache)
            .with_token_lifetime(lifetime),
    );

    let app = build_router(AppState::new(service));

    let addr = cfg.addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind {addr}: {e}");
            std::process::exit(2);
        }
    };

    tracing::info!(%addr, "userhub server listening");
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        eprintln!("Server error: {e}");
    }
}

/// Config path from `--config <path>`, then `USERHUB_CONFIG`, then the
/// default `userhub.toml`.
fn resolve_config_path() -> String {
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            if let Some(path) = args.next() {
                return path;
            }
        }
    }
    if let Ok(path) = env::var("USERHUB_CONFIG") {
        if !path.is_empty() {
            return path;
        }
    }
    "userhub.toml".to_string()
}

/// Loads the RS256 keypair from the configured PEM files, or generates
/// an ephemeral one when no files are configured.
fn build_codec(cfg: &userhub_server::AppConfig) -> Result<TokenCodec, String> {
    match (&cfg.auth.private_key_file, &cfg.auth.public_key_file) {
        (Some(private_path), Some(public_path)) => {
            let private_pem = std::fs::read(private_path)
                .map_err(|e| format!("reading {private_path}: {e}"))?;
            let public_pem =
                std::fs::read(public_path).map_err(|e| format!("reading {public_path}: {e}"))?;
            TokenCodec::from_pem(&private_pem, &public_pem).map_err(|e| e.to_string())
        }
        _ => {
            tracing::warn!(
                "no signing key files configured, using an ephemeral keypair; \
                 sessions will not survive a restart"
            );
            TokenCodec::generate().map_err(|e| e.to_string())
        }
    }
}

fn build_session_cache(cfg: &userhub_server::AppConfig) -> Result<SessionCache, String> {
    match &cfg.cache.redis_url {
        Some(url) => {
            let pool = deadpool_redis::Config::from_url(url)
                .create_pool(Some(deadpool_redis::Runtime::Tokio1))
                .map_err(|e| format!("creating Redis pool: {e}"))?;
            tracing::info!("session cache backed by Redis");
            Ok(SessionCache::new_redis(pool))
        }
        None => {
            tracing::info!("session cache running in-process");
            Ok(SessionCache::new_memory())
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install shutdown signal handler");
        return;
    }
    tracing::info!("shutdown signal received");
}
