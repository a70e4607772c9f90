//! Server configuration

use detection::DetectorConfig;
use serde::{Deserialize, Serialize};

use crate::rate_limit::RateLimitConfig;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub bind_addr: String,

    /// Max accepted request body (bytes)
    pub max_upload_bytes: usize,

    /// Detection collaborator settings
    pub detector: DetectorConfig,

    /// Per-IP rate limiting
    pub rate_limit: RateLimitConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
            detector: DetectorConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load from an optional `traffic.toml` plus `TRAFFIC_*` env overrides
    pub fn load() -> Result<Self, ::config::ConfigError> {
        ::config::Config::builder()
            .add_source(::config::File::with_name("traffic").required(false))
            .add_source(::config::Environment::with_prefix("TRAFFIC").separator("__"))
            .build()?
            .try_deserialize()
    }
}
