//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of items the cache can hold
    pub max_items: usize,
    /// Default TTL in seconds for items set without an explicit TTL
    pub default_ttl: u64,
    /// Default priority for items set without an explicit priority
    pub default_priority: i64,
    /// HTTP server port
    pub server_port: u16,
    /// Background cleanup task interval in seconds, 0 disables the task
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ITEMS` - Cache capacity (default: 1000)
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - `DEFAULT_PRIORITY` - Default item priority (default: 0)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 1)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_items: env_or("MAX_ITEMS", defaults.max_items),
            default_ttl: env_or("DEFAULT_TTL", defaults.default_ttl),
            default_priority: env_or("DEFAULT_PRIORITY", defaults.default_priority),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
        }
    }
}

/// Parses `name` from the environment, falling back to `default` when unset or invalid.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_items: 1000,
            default_ttl: 300,
            default_priority: 0,
            server_port: 3000,
            cleanup_interval: 1,
        }
    }
}
