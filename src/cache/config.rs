//! Cache configuration.

use std::num::NonZeroUsize;

use super::error::{CacheError, Result};

/// Configuration for a cache instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of entries in the cache. Must be positive.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { capacity: 10_000 }
    }
}

impl CacheConfig {
    /// Create a new cache config with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { capacity }
    }

    /// Create a config from a signed capacity, as read from env or user input.
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` if `capacity <= 0`.
    pub fn from_signed(capacity: i64) -> Result<Self> {
        if capacity <= 0 {
            return Err(CacheError::invalid_capacity(capacity));
        }
        let capacity =
            usize::try_from(capacity).map_err(|_| CacheError::invalid_capacity(capacity))?;
        Ok(Self { capacity })
    }

    /// Set capacity for cache (builder pattern).
    #[must_use]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Check the config and return the capacity as a non-zero value.
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` if the capacity is zero.
    pub fn validate(&self) -> Result<NonZeroUsize> {
        NonZeroUsize::new(self.capacity).ok_or_else(|| CacheError::invalid_capacity(0))
    }
}
