//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;

use crate::error::{CacheError, Result};

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP listener port
    pub port: u16,
    /// Maximum number of entries the cache can hold
    pub max_items: usize,
    /// Expiration sweep interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_PORT` - TCP listener port (default: 5050)
    /// - `CACHE_MAX_ITEMS` - Maximum cache entries (default: 100)
    /// - `CACHE_CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        Self {
            port: env::var("CACHE_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5050),
            max_items: env::var("CACHE_MAX_ITEMS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(100),
            cleanup_interval: env::var("CACHE_CLEANUP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
        }
    }

    /// Validates the configuration.
    ///
    /// A capacity of zero cannot back a bounded cache and is fatal at startup.
    pub fn validate(&self) -> Result<()> {
        if self.max_items == 0 {
            return Err(CacheError::InvalidCapacity(self.max_items));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5050,
            max_items: 100,
            cleanup_interval: 60,
        }
    }
}
