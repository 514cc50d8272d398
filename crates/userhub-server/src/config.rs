//! Server configuration.
//!
//! Layered loading: an optional TOML file (default `userhub.toml`)
//! overridden by `USERHUB__`-prefixed environment variables, e.g.
//! `USERHUB__SERVER__PORT=9090`.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.auth.token_lifetime.is_zero() {
            return Err("auth.token_lifetime must be > 0".into());
        }
        // Key files must come as a pair; one alone cannot mint and verify.
        if self.auth.private_key_file.is_some() != self.auth.public_key_file.is_some() {
            return Err(
                "auth.private_key_file and auth.public_key_file must both be set or both unset"
                    .into(),
            );
        }
        if self.cache.login_ttl.is_zero() {
            return Err("cache.login_ttl must be > 0".into());
        }
        if self.cache.login_capacity == 0 {
            return Err("cache.login_capacity must be > 0".into());
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    3000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    /// Session token validity window.
    #[serde(default = "default_token_lifetime", with = "humantime_serde")]
    pub token_lifetime: Duration,

    /// PEM file with the RS256 private (signing) key. When unset an
    /// ephemeral keypair is generated and sessions die with the process.
    #[serde(default)]
    pub private_key_file: Option<String>,

    /// PEM file with the RS256 public (verification) key.
    #[serde(default)]
    pub public_key_file: Option<String>,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            token_lifetime: default_token_lifetime(),
            private_key_file: None,
            public_key_file: None,
        }
    }
}

fn default_token_lifetime() -> Duration {
    Duration::from_secs(14 * 24 * 60 * 60)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Redis URL for the shared session cache. When unset the session
    /// cache runs in-process, suitable only for a single instance.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// TTL for the in-process login snapshot cache.
    #[serde(default = "default_login_ttl", with = "humantime_serde")]
    pub login_ttl: Duration,

    /// Max entries in the login snapshot cache.
    #[serde(default = "default_login_capacity")]
    pub login_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            login_ttl: default_login_ttl(),
            login_capacity: default_login_capacity(),
        }
    }
}

fn default_login_ttl() -> Duration {
    Duration::from_secs(60)
}
fn default_login_capacity() -> u64 {
    10_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or("userhub.toml"));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // Environment overrides, e.g. USERHUB__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("USERHUB")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}
