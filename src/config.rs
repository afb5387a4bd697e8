//! Client configuration
//!
//! `ClientConfig` can be built in code, deserialized from YAML, or read from
//! the environment:
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `KV_COLLECTIONS_URL` | `url` | `redis://127.0.0.1:6379` |
//! | `KV_COLLECTIONS_TIMEOUT_MS` | `response_timeout_ms` | `5000` |
//! | `KV_COLLECTIONS_DB` | `database` | `0` |

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ClientError, ClientResult};

pub const ENV_URL: &str = "KV_COLLECTIONS_URL";
pub const ENV_TIMEOUT_MS: &str = "KV_COLLECTIONS_TIMEOUT_MS";
pub const ENV_DATABASE: &str = "KV_COLLECTIONS_DB";

/// Connection settings for [`RedisClient`](crate::RedisClient)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server URL (`redis://host:port`)
    pub url: String,
    /// Per-command response timeout in milliseconds
    pub response_timeout_ms: u64,
    /// Logical database selected on every connection
    pub database: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            response_timeout_ms: 5000,
            database: 0,
        }
    }
}

impl ClientConfig {
    /// Config for the given URL with default timeout and database
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Parse a YAML document; missing fields take their defaults
    pub fn from_yaml_str(yaml: &str) -> ClientResult<Self> {
        let config: ClientConfig =
            serde_yaml::from_str(yaml).map_err(|e| ClientError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read overrides from the environment on top of the defaults
    pub fn from_env() -> ClientResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> ClientResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(url) = lookup(ENV_URL) {
            config.url = url;
        }
        if let Some(timeout) = lookup(ENV_TIMEOUT_MS) {
            config.response_timeout_ms = timeout
                .parse()
                .map_err(|e| ClientError::Config(format!("{}: {}", ENV_TIMEOUT_MS, e)))?;
        }
        if let Some(db) = lookup(ENV_DATABASE) {
            config.database = db
                .parse()
                .map_err(|e| ClientError::Config(format!("{}: {}", ENV_DATABASE, e)))?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no connection could use
    pub fn validate(&self) -> ClientResult<()> {
        if self.url.trim().is_empty() {
            return Err(ClientError::Config("url must not be empty".to_string()));
        }
        if self.response_timeout_ms == 0 {
            return Err(ClientError::Config(
                "response_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}
