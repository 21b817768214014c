//! Configuration module for the recency demo.
//!
//! Loads configuration from environment variables (and `.env` if present).

use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::cache::{CacheConfig, CacheError};

/// Errors raised while reading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{var} is not a valid number: {value:?}")]
    Invalid { var: &'static str, value: String },

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// User cache configuration (`CACHE_CAPACITY`).
    pub cache: CacheConfig,

    // Load demo
    pub workers: usize,
    pub requests_per_worker: usize,
    /// Number of distinct user ids the load demo requests.
    pub user_space: u64,
    /// Simulated latency of the backing user directory.
    pub lookup_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheConfig::with_capacity(1024),
            workers: 8,
            requests_per_worker: 200,
            user_space: 2048,
            lookup_delay: Duration::from_millis(2),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unset variables fall back to [`Config::default`].
    ///
    /// # Errors
    /// Returns an error if a variable is not a number or `CACHE_CAPACITY`
    /// is not positive.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        // Parsed signed so that "0" and "-3" both surface as invalid capacities.
        let cache = match parse_var::<i64, _>(&lookup, "CACHE_CAPACITY")? {
            Some(capacity) => CacheConfig::from_signed(capacity)?,
            None => defaults.cache,
        };

        let lookup_delay = parse_var::<u64, _>(&lookup, "DEMO_LOOKUP_DELAY_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.lookup_delay);

        Ok(Self {
            cache,
            workers: parse_var(&lookup, "DEMO_WORKERS")?.unwrap_or(defaults.workers),
            requests_per_worker: parse_var(&lookup, "DEMO_REQUESTS_PER_WORKER")?
                .unwrap_or(defaults.requests_per_worker),
            user_space: parse_var(&lookup, "DEMO_USER_SPACE")?.unwrap_or(defaults.user_space),
            lookup_delay,
        })
    }
}

fn parse_var<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    value
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::Invalid { var, value })
}
