//! Configuration management using Figment
//!
//! Configuration is loaded from the following sources, highest precedence first:
//! 1. Environment variables (prefix: `ACTON_JSONAPI_`, nested keys split on `__`)
//! 2. A TOML file: `./jsonapi.toml`, or the path given to [`Config::load_from`]
//! 3. Default values
//!
//! ```toml
//! server_protocol = "https"
//! server_name = "api.example.com"
//!
//! [pagination]
//! default_size = 20
//! max_size = 50
//! ```

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "jsonapi.toml";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "ACTON_JSONAPI_";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Scheme used when building absolute URLs (self links, `Location`)
    #[serde(default = "default_server_protocol")]
    pub server_protocol: String,

    /// Host used in absolute URLs instead of the request's `Host` header
    #[serde(default)]
    pub server_name: Option<String>,

    /// Log level filter handed to the tracing subscriber
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Largest request body accepted by POST and PATCH
    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,

    /// Page/size pagination limits
    #[serde(default)]
    pub pagination: PaginationConfig,
}

/// Limits for `page[number]` / `page[size]` pagination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Page size used when `page[size]` is absent
    #[serde(default = "default_page_size")]
    pub default_size: u64,

    /// Page sizes above this value are clamped
    #[serde(default = "default_max_page_size")]
    pub max_size: u64,
}

fn default_server_protocol() -> String {
    "https".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_body_limit_bytes() -> usize {
    2 * 1024 * 1024
}

fn default_page_size() -> u64 {
    10
}

fn default_max_page_size() -> u64 {
    100
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_protocol: default_server_protocol(),
            server_name: None,
            log_level: default_log_level(),
            body_limit_bytes: default_body_limit_bytes(),
            pagination: PaginationConfig::default(),
        }
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_size: default_page_size(),
            max_size: default_max_page_size(),
        }
    }
}

impl Config {
    /// Load configuration from `./jsonapi.toml` (if present) and the environment
    pub fn load() -> Result<Self> {
        let path = Path::new(DEFAULT_CONFIG_FILE);
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if path.exists() {
            tracing::info!("Loading configuration from: {}", path.display());
            figment = figment.merge(Toml::file(path));
        } else {
            tracing::debug!("No {} found, using defaults and environment", DEFAULT_CONFIG_FILE);
        }

        let config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    ///
    /// Environment variables still override values from the file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("Loading configuration from: {}", path.display());

        let config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        Ok(config)
    }
}
