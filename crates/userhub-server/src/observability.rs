//! Tracing initialization with a configurable, reloadable log level.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

static LOG_RELOAD_HANDLE: OnceLock<reload::Handle<EnvFilter, tracing_subscriber::Registry>> =
    OnceLock::new();

/// Whether the active filter was taken from `RUST_LOG`.
static ENV_FILTER_ACTIVE: AtomicBool = AtomicBool::new(false);

pub fn init_tracing() {
    init_tracing_with_level("info");
}

pub fn init_tracing_with_level(level: &str) {
    // RUST_LOG from the environment wins over the configured level.
    let env_filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|_| EnvFilter::try_from_default_env().ok());
    ENV_FILTER_ACTIVE.store(env_filter.is_some(), Ordering::Relaxed);

    let base_filter = env_filter.unwrap_or_else(|| EnvFilter::new(level));
    let (reload_layer, handle) = reload::Layer::new(base_filter);
    let _ = LOG_RELOAD_HANDLE.set(handle);

    let _ = tracing_subscriber::registry()
        .with(reload_layer)
        .with(fmt::layer())
        .try_init();
}

/// Applies a new logging level at runtime.
///
/// Skipped when the active filter came from `RUST_LOG`, so the
/// environment keeps precedence over configuration. Returns whether
/// the level was applied.
pub fn apply_logging_level(level: &str) -> bool {
    if ENV_FILTER_ACTIVE.load(Ordering::Relaxed) {
        return false;
    }
    let Some(handle) = LOG_RELOAD_HANDLE.get() else {
        return false;
    };
    handle
        .modify(|filter| {
            *filter = EnvFilter::new(level);
        })
        .is_ok()
}
