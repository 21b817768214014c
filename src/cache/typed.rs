//! Named, clone-friendly handle over [`LruCache`].

use std::hash::Hash;
use std::sync::Arc;

use tracing::trace;

use super::error::Result;
use super::lru::EvictionListener;
use super::{CacheConfig, CacheStats, LruCache};

/// A typed cache handle that provides a clean API over [`LruCache`].
///
/// This cache is:
/// - Thread-safe (one lock per cache, shared through `Arc`)
/// - Strictly LRU with a fixed capacity
/// - Clone-friendly (cloning is cheap, shares the same underlying cache)
pub struct TypedCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    inner: Arc<LruCache<K, V>>,
    name: Arc<str>,
}

// Cloning shares the underlying cache rather than copying entries
impl<K, V> Clone for TypedCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            name: Arc::clone(&self.name),
        }
    }
}

impl<K, V> TypedCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a new typed cache with the given name and config.
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` if the configured capacity is zero.
    pub fn new(name: impl Into<Arc<str>>, config: CacheConfig) -> Result<Self> {
        Self::build(name, config, None)
    }

    /// Create a new typed cache that reports evicted entries to `listener`.
    ///
    /// The listener must not call back into this cache.
    pub fn with_eviction_listener<F>(
        name: impl Into<Arc<str>>,
        config: CacheConfig,
        listener: F,
    ) -> Result<Self>
    where
        F: Fn(&K, &V) + Send + Sync + 'static,
    {
        Self::build(name, config, Some(Arc::new(listener)))
    }

    fn build(
        name: impl Into<Arc<str>>,
        config: CacheConfig,
        listener: Option<EvictionListener<K, V>>,
    ) -> Result<Self> {
        Ok(Self {
            inner: Arc::new(LruCache::build(config.capacity, listener)?),
            name: name.into(),
        })
    }

    /// Get the name of this cache.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert a key-value pair into the cache.
    pub fn insert(&self, key: K, value: V) {
        self.inner.put(key, value);
    }

    /// Get a value from the cache, marking it most-recently used.
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.get(key)
    }

    /// Get a value without affecting eviction order.
    pub fn peek(&self, key: &K) -> Option<V> {
        self.inner.peek(key)
    }

    /// Check if a key exists in the cache.
    pub fn contains(&self, key: &K) -> bool {
        self.inner.contains(key)
    }

    /// Remove a key from the cache.
    ///
    /// Returns `true` if the key was present.
    pub fn invalidate(&self, key: &K) -> bool {
        self.inner.delete(key)
    }

    /// Remove all entries from the cache.
    pub fn invalidate_all(&self) {
        self.inner.clear();
    }

    /// Get the number of entries in the cache.
    pub fn entry_count(&self) -> usize {
        self.inner.len()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    /// Keys from most- to least-recently used.
    pub fn keys(&self) -> Vec<K> {
        self.inner.keys()
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.stats()
    }

    /// See [`LruCache::check_invariants`].
    pub fn check_invariants(&self) -> Result<()> {
        self.inner.check_invariants()
    }

    /// Get or insert a value using a closure.
    ///
    /// If the key exists, returns the cached value.
    /// Otherwise, calls the closure to compute the value, inserts it, and returns it.
    /// The closure runs outside the lock, so two concurrent misses on the same
    /// key may both compute; the later insert wins.
    pub fn get_or_insert_with<F>(&self, key: K, f: F) -> V
    where
        F: FnOnce() -> V,
    {
        if let Some(value) = self.inner.get(&key) {
            return value;
        }
        trace!(cache = %self.name, "Cache miss, computing value");
        let value = f();
        self.inner.put(key, value.clone());
        value
    }

    /// Get or try to insert a value using a fallible closure.
    ///
    /// Returns `Ok(value)` if found or successfully computed.
    /// Returns `Err(e)` if the closure fails; nothing is cached in that case.
    pub fn get_or_try_insert_with<F, E>(&self, key: K, f: F) -> std::result::Result<V, E>
    where
        F: FnOnce() -> std::result::Result<V, E>,
    {
        if let Some(value) = self.inner.get(&key) {
            return Ok(value);
        }
        trace!(cache = %self.name, "Cache miss, computing value");
        let value = f()?;
        self.inner.put(key, value.clone());
        Ok(value)
    }
}

impl<K, V> std::fmt::Debug for TypedCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedCache")
            .field("name", &self.name)
            .field("entry_count", &self.inner.len())
            .field("capacity", &self.inner.capacity())
            .finish()
    }
}
