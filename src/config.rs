//! Configuration Module
//!
//! Handles loading cache configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::error::{CacheError, Result};

const DEFAULT_TTL_VAR: &str = "CACHE_DEFAULT_TTL_MS";
const SWEEP_INTERVAL_VAR: &str = "CACHE_SWEEP_INTERVAL_MS";

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// TTL for entries written with `Ttl::Default`; zero = never expire
    pub default_ttl: Duration,
    /// Period of the background sweeper; zero = no sweeper
    pub sweep_interval: Duration,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// Missing or unparsable values fall back to the defaults.
    ///
    /// # Environment Variables
    /// - `CACHE_DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 300000)
    /// - `CACHE_SWEEP_INTERVAL_MS` - Sweep frequency in milliseconds (default: 1000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_ttl: env_millis(DEFAULT_TTL_VAR).unwrap_or(defaults.default_ttl),
            sweep_interval: env_millis(SWEEP_INTERVAL_VAR).unwrap_or(defaults.sweep_interval),
        }
    }

    /// Like [`CacheConfig::from_env`], but a set variable that does not parse
    /// is an error instead of being ignored.
    pub fn try_from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let read = |name: &str, fallback: Duration| match lookup(name) {
            None => Ok(fallback),
            Some(raw) => parse_millis(&raw).ok_or_else(|| {
                CacheError::InvalidConfig(format!(
                    "{name} must be a non-negative integer of milliseconds, got {raw:?}"
                ))
            }),
        };

        Ok(Self {
            default_ttl: read(DEFAULT_TTL_VAR, defaults.default_ttl)?,
            sweep_interval: read(SWEEP_INTERVAL_VAR, defaults.sweep_interval)?,
        })
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(300),
            sweep_interval: Duration::from_secs(1),
        }
    }
}

fn env_millis(name: &str) -> Option<Duration> {
    env::var(name).ok().and_then(|v| parse_millis(&v))
}

fn parse_millis(raw: &str) -> Option<Duration> {
    raw.trim().parse().ok().map(Duration::from_millis)
}
