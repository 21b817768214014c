//! Hit/miss/eviction counters.

use serde::Serialize;

/// Read-only snapshot of cache statistics.
///
/// Only `get` counts hits and misses. `peek` and `contains` are out-of-band
/// reads and leave these counters alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl CacheStats {
    /// Hit rate in `[0.0, 1.0]`. Returns 0.0 if there were no lookups.
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_lookups();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Total number of `get` calls (hits + misses).
    pub fn total_lookups(&self) -> u64 {
        self.hits + self.misses
    }
}
