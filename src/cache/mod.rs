//! Cache module - Fixed-capacity LRU caching.
//!
//! This module provides a strict LRU cache plus a registry-based layer that
//! lets components create and share their own named caches.
//!
//! ## Architecture
//!
//! - `LruCache` - The cache itself: a hash index over an arena-backed
//!   recency list, all behind one read/write lock
//! - `TypedCache` - Named, cheaply cloneable handle with cache-aside helpers
//! - `CacheRegistry` - Central registry holding all named caches
//!
//! ## Usage
//!
//! ```rust
//! use recency::cache::LruCache;
//!
//! let cache = LruCache::new(3).unwrap();
//! cache.put("a", 1);
//! cache.put("b", 2);
//! cache.put("c", 3);
//! assert_eq!(cache.keys(), vec!["c", "b", "a"]);
//!
//! cache.get(&"a");
//! cache.put("d", 4); // evicts "b"
//! assert_eq!(cache.keys(), vec!["d", "a", "c"]);
//! ```

mod config;
mod error;
mod list;
mod lru;
mod registry;
mod stats;
mod typed;

pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use lru::{EvictionListener, LruCache};
pub use registry::CacheRegistry;
pub use stats::CacheStats;
pub use typed::TypedCache;
