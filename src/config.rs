//! Configuration Module
//!
//! Loads cache, remote store and server settings from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Cache and server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// Default TTL in seconds for entries without explicit TTL
    pub default_ttl: u64,
    /// Base URL of the remote store (e.g. `http://127.0.0.1:3000/api/v2`).
    /// `None` runs the cache without a remote.
    pub remote_base_url: Option<String>,
    /// Upper bound for every remote call, in milliseconds
    pub remote_timeout_ms: u64,
    /// Bearer token sent to the remote store
    pub remote_auth_token: Option<String>,
    /// HTTP server port
    pub server_port: u16,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum cache entries (default: 100)
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - `REMOTE_BASE_URL` - Remote store base URL (default: unset)
    /// - `REMOTE_TIMEOUT_MS` - Remote call timeout (default: 10000)
    /// - `REMOTE_AUTH_TOKEN` - Bearer token for the remote (default: unset)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 1)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: parse_var("MAX_ENTRIES").unwrap_or(defaults.max_entries),
            default_ttl: parse_var("DEFAULT_TTL").unwrap_or(defaults.default_ttl),
            remote_base_url: non_empty_var("REMOTE_BASE_URL"),
            remote_timeout_ms: parse_var("REMOTE_TIMEOUT_MS")
                .unwrap_or(defaults.remote_timeout_ms),
            remote_auth_token: non_empty_var("REMOTE_AUTH_TOKEN"),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            cleanup_interval: parse_var("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
        }
    }

    /// Rejects values the cache cannot operate with.
    pub fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            return Err(CacheError::InvalidConfig(
                "max_entries must be at least 1".to_string(),
            ));
        }
        if self.default_ttl == 0 {
            return Err(CacheError::InvalidConfig(
                "default_ttl must be at least 1 second".to_string(),
            ));
        }
        if self.remote_timeout_ms == 0 {
            return Err(CacheError::InvalidConfig(
                "remote_timeout_ms must be positive".to_string(),
            ));
        }
        if self.cleanup_interval == 0 {
            return Err(CacheError::InvalidConfig(
                "cleanup_interval must be at least 1 second".to_string(),
            ));
        }
        Ok(())
    }

    /// Remote call bound as a Duration.
    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 100,
            default_ttl: 300,
            remote_base_url: None,
            remote_timeout_ms: 10_000,
            remote_auth_token: None,
            server_port: 3000,
            cleanup_interval: 1,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
