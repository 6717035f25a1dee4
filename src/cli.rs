//! Command-line interface parsing
//!
//! Every flag can also be given through an `MTA_*` environment variable.
//! Values given here override the optional `--config` file.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{Config, ConfigError, StalePolicy};

/// Caching proxy for MTA bus lane violation records
#[derive(Parser, Debug)]
#[command(name = "mta-violations")]
#[command(about = "Caching proxy for MTA bus lane violation records")]
#[command(version)]
pub struct Cli {
    /// TOML configuration file used as the base configuration
    #[arg(short, long, value_name = "FILE", env = "MTA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Listening IP address
    #[arg(short = 'H', long, value_name = "IP", env = "MTA_HOST")]
    pub host: Option<String>,

    /// Listening port
    #[arg(short, long, value_name = "PORT", env = "MTA_PORT")]
    pub port: Option<u16>,

    /// Socrata dataset endpoint
    #[arg(long, value_name = "URL", env = "MTA_UPSTREAM_URL")]
    pub upstream_url: Option<String>,

    /// Socrata application token
    #[arg(long, value_name = "TOKEN", env = "MTA_APP_TOKEN")]
    pub app_token: Option<String>,

    /// Seconds a year's records stay fresh
    #[arg(long = "cache-ttl", value_name = "SECS", env = "MTA_CACHE_TTL")]
    pub cache_ttl_secs: Option<u64>,

    /// Timeout for each upstream request, in seconds
    #[arg(long = "timeout", value_name = "SECS", env = "MTA_TIMEOUT")]
    pub request_timeout_secs: Option<u64>,

    /// What to serve when a refresh fails over cached records
    #[arg(long, value_enum, env = "MTA_STALE_POLICY")]
    pub stale_policy: Option<StalePolicy>,

    /// Allowed CORS origin; repeat for several. Replaces the configured list
    #[arg(long = "allowed-origin", value_name = "ORIGIN")]
    pub allowed_origins: Vec<String>,

    /// Log level
    #[arg(short = 'l', long, default_value = "info", env = "MTA_LOG_LEVEL")]
    pub log_level: String,
}

impl Cli {
    /// Resolves the effective configuration: file (or defaults), then flags
    ///
    /// # Returns
    /// The validated configuration, or an error if the config file cannot be
    /// read or the merged values are invalid
    pub fn to_config(&self) -> Result<Config, ConfigError> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        if let Some(ref host) = self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(ref url) = self.upstream_url {
            config.upstream_url = url.clone();
        }
        if self.app_token.is_some() {
            config.app_token = self.app_token.clone();
        }
        if let Some(ttl) = self.cache_ttl_secs {
            config.cache_ttl_secs = ttl;
        }
        if let Some(timeout) = self.request_timeout_secs {
            config.request_timeout_secs = timeout;
        }
        if let Some(policy) = self.stale_policy {
            config.stale_policy = policy;
        }
        if !self.allowed_origins.is_empty() {
            config.allowed_origins = self.allowed_origins.clone();
        }

        config.validate()?;
        Ok(config)
    }

    /// Default `tracing` filter for the chosen log level
    pub fn log_filter(&self) -> String {
        if self.log_level == "trace" {
            format!("mta_violations={},tower_http=trace", self.log_level)
        } else {
            format!("mta_violations={},tower_http=info", self.log_level)
        }
    }
}
