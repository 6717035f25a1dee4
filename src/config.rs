//! Runtime configuration
//!
//! Defaults match the public deployment. A TOML file can provide a base
//! configuration which command-line flags and environment variables then
//! override (see [`crate::cli`]).

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::http::HeaderValue;
use clap::ValueEnum;
use serde::Deserialize;
use thiserror::Error;

use crate::cache::DEFAULT_TTL_SECS;
use crate::data::violations::DEFAULT_BASE_URL;

/// What to do when refreshing a year fails but older records are cached
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum StalePolicy {
    /// Serve the expired records and report status `stale`
    #[default]
    ServeStale,
    /// Fail the request with the upstream error
    Fail,
}

/// Error types for loading and validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Service configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Listening address
    pub host: String,
    /// Listening port
    pub port: u16,
    /// Socrata dataset endpoint
    pub upstream_url: String,
    /// Optional Socrata application token
    pub app_token: Option<String>,
    /// How long a year's records stay fresh, in seconds
    pub cache_ttl_secs: u64,
    /// Upper bound on each upstream request, in seconds
    pub request_timeout_secs: u64,
    /// Behaviour when a refresh fails over an existing entry
    pub stale_policy: StalePolicy,
    /// Front-end origins allowed by CORS
    pub allowed_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            upstream_url: DEFAULT_BASE_URL.to_string(),
            app_token: None,
            cache_ttl_secs: DEFAULT_TTL_SECS,
            request_timeout_secs: 60,
            stale_policy: StalePolicy::default(),
            allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://localhost:3000".to_string(),
            ],
        }
    }
}

impl Config {
    /// Loads a configuration from a TOML file; missing keys take defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(toml::from_str(&contents)?)
    }

    /// Checks values that serde alone cannot
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.upstream_url.trim().is_empty() {
            return Err(ConfigError::Invalid("upstream_url must not be empty".to_string()));
        }
        for origin in &self.allowed_origins {
            if origin == "*" || HeaderValue::from_str(origin).is_err() {
                return Err(ConfigError::Invalid(format!(
                    "allowed origin '{}' is not a valid origin",
                    origin
                )));
            }
        }
        self.socket_addr().map(|_| ())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("invalid listen address: {}", e)))
    }

    pub fn cache_ttl(&self) -> chrono::Duration {
        i64::try_from(self.cache_ttl_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
