//! Recency - Fixed-capacity, thread-safe LRU caching
//!
//! ## Architecture
//!
//! - `cache` - The LRU cache, named cache handles and the cache registry
//! - `config` - Environment configuration for the demo binary
//! - `demo` - Walkthrough and concurrent cache-aside load demo

pub mod cache;
pub mod config;
pub mod demo;

pub use cache::{CacheConfig, CacheError, CacheRegistry, CacheStats, LruCache, TypedCache};
