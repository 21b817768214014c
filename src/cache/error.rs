//! Cache error types.

use thiserror::Error;

/// Errors produced by the cache layer.
///
/// A miss is never an error: lookups return `Option` and `delete` returns
/// `bool`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Capacity must be a positive integer.
    #[error("invalid cache configuration: capacity must be positive, got {capacity}")]
    InvalidConfiguration { capacity: i64 },

    /// Index and recency order diverged. Always a bug in this crate.
    #[error("internal inconsistency: {0}")]
    InternalInconsistency(String),

    /// A named cache exists in the registry with different key/value types.
    #[error("cache '{name}' type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, CacheError>;

impl CacheError {
    /// Build an `InvalidConfiguration` from any signed or unsigned capacity.
    pub fn invalid_capacity(capacity: impl TryInto<i64>) -> Self {
        Self::InvalidConfiguration {
            capacity: capacity.try_into().unwrap_or(i64::MAX),
        }
    }
}
