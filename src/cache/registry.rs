//! Cache registry - Central management for named caches.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use super::error::{CacheError, Result};
use super::{CacheConfig, TypedCache};

/// Central registry for managing multiple typed caches.
///
/// The registry is an ordinary value: construct it once and pass it (or an
/// `Arc` of it) to whoever needs a cache. Each component looks its cache up
/// by name, which keeps caches isolated from each other.
///
/// ## Example
///
/// ```rust
/// use recency::cache::{CacheConfig, CacheRegistry, TypedCache};
///
/// let registry = CacheRegistry::new();
///
/// // Create a cache for user names
/// let users: TypedCache<u64, String> =
///     registry.create("users", CacheConfig::with_capacity(100)).unwrap();
///
/// // Later, retrieve the same cache
/// let same: Option<TypedCache<u64, String>> = registry.get("users").unwrap();
/// assert!(same.is_some());
/// ```
#[derive(Clone)]
pub struct CacheRegistry {
    caches: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

/// Internal cache entry storing type-erased cache.
struct CacheEntry {
    cache: Box<dyn Any + Send + Sync>,
    type_id: TypeId,
    type_name: &'static str,
}

impl CacheEntry {
    fn downcast<K, V>(&self, name: &str) -> Result<TypedCache<K, V>>
    where
        K: Hash + Eq + Clone + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        let mismatch = || CacheError::TypeMismatch {
            name: name.to_string(),
            expected: std::any::type_name::<TypedCache<K, V>>(),
            found: self.type_name,
        };
        if self.type_id != TypeId::of::<TypedCache<K, V>>() {
            return Err(mismatch());
        }
        self.cache
            .downcast_ref::<TypedCache<K, V>>()
            .cloned()
            .ok_or_else(mismatch)
    }
}

impl CacheRegistry {
    /// Create a new empty cache registry.
    pub fn new() -> Self {
        info!("Cache registry initialized");
        Self {
            caches: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a new typed cache and register it.
    ///
    /// If a cache with the same name and types exists, that cache is
    /// returned instead and `config` is ignored.
    ///
    /// # Errors
    /// - `TypeMismatch` if the name is taken by a cache with other types.
    /// - `InvalidConfiguration` if `config` has zero capacity.
    pub fn create<K, V>(&self, name: &str, config: CacheConfig) -> Result<TypedCache<K, V>>
    where
        K: Hash + Eq + Clone + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        let mut caches = self.caches.write();

        if let Some(existing) = caches.get(name) {
            return existing.downcast(name);
        }

        let cache = TypedCache::new(name, config)?;
        debug!(name, capacity = cache.capacity(), "Creating cache");

        caches.insert(
            name.to_string(),
            CacheEntry {
                cache: Box::new(cache.clone()),
                type_id: TypeId::of::<TypedCache<K, V>>(),
                type_name: std::any::type_name::<TypedCache<K, V>>(),
            },
        );

        Ok(cache)
    }

    /// Get an existing cache by name.
    ///
    /// Returns `Ok(None)` if the cache doesn't exist.
    ///
    /// # Errors
    /// Returns `TypeMismatch` if the cache exists but with different types.
    pub fn get<K, V>(&self, name: &str) -> Result<Option<TypedCache<K, V>>>
    where
        K: Hash + Eq + Clone + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        let caches = self.caches.read();
        caches.get(name).map(|entry| entry.downcast(name)).transpose()
    }

    /// Get an existing cache or create a new one if it doesn't exist.
    ///
    /// This is the recommended way for components to obtain their cache.
    pub fn get_or_create<K, V>(&self, name: &str, config: CacheConfig) -> Result<TypedCache<K, V>>
    where
        K: Hash + Eq + Clone + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        if let Some(cache) = self.get(name)? {
            return Ok(cache);
        }
        self.create(name, config)
    }

    /// Check if a cache with the given name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.caches.read().contains_key(name)
    }

    /// Remove a cache from the registry.
    ///
    /// Returns `true` if the cache was removed. Handles already given out
    /// keep working; they just stop being reachable by name.
    pub fn remove(&self, name: &str) -> bool {
        let removed = self.caches.write().remove(name).is_some();
        if removed {
            debug!(name, "Removed cache");
        }
        removed
    }

    /// Get the number of registered caches.
    pub fn len(&self) -> usize {
        self.caches.read().len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.caches.read().is_empty()
    }

    /// Get a sorted list of all registered cache names.
    pub fn cache_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.caches.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for CacheRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CacheRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let caches = self.caches.read();
        f.debug_struct("CacheRegistry")
            .field("cache_count", &caches.len())
            .field("cache_names", &caches.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_get_share_cache() {
        let registry = CacheRegistry::new();
        let users: TypedCache<u64, String> = registry
            .create("users", CacheConfig::with_capacity(8))
            .unwrap();
        users.insert(1, "alice".into());

        let again: TypedCache<u64, String> = registry.get("users").unwrap().unwrap();
        assert_eq!(again.get(&1), Some("alice".to_string()));
        assert!(registry.contains("users"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_get_missing() {
        let registry = CacheRegistry::new();
        let missing: Option<TypedCache<u64, u64>> = registry.get("nope").unwrap();
        assert!(missing.is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_type_mismatch_is_an_error() {
        let registry = CacheRegistry::new();
        let _: TypedCache<u64, String> = registry
            .get_or_create("users", CacheConfig::with_capacity(8))
            .unwrap();

        let err = registry.get::<u64, u64>("users").unwrap_err();
        assert!(matches!(err, CacheError::TypeMismatch { ref name, .. } if name == "users"));

        let err = registry
            .create::<String, String>("users", CacheConfig::default())
            .unwrap_err();
        assert!(matches!(err, CacheError::TypeMismatch { .. }));
    }

    #[test]
    fn test_create_existing_keeps_original_capacity() {
        let registry = CacheRegistry::new();
        let first: TypedCache<u32, u32> = registry
            .create("c", CacheConfig::with_capacity(2))
            .unwrap();
        let second: TypedCache<u32, u32> = registry
            .create("c", CacheConfig::with_capacity(50))
            .unwrap();

        assert_eq!(first.capacity(), 2);
        assert_eq!(second.capacity(), 2);
    }

    #[test]
    fn test_invalid_config_is_not_registered() {
        let registry = CacheRegistry::new();
        let err = registry
            .get_or_create::<u32, u32>("zero", CacheConfig::with_capacity(0))
            .unwrap_err();
        assert!(matches!(err, CacheError::InvalidConfiguration { .. }));
        assert!(!registry.contains("zero"));
    }

    #[test]
    fn test_remove_and_names() {
        let registry = CacheRegistry::default();
        let _: TypedCache<u32, u32> = registry.create("b", CacheConfig::default()).unwrap();
        let _: TypedCache<u32, u32> = registry.create("a", CacheConfig::default()).unwrap();

        assert_eq!(registry.cache_names(), vec!["a".to_string(), "b".to_string()]);
        assert!(registry.remove("a"));
        assert!(!registry.remove("a"));
        assert_eq!(registry.cache_names(), vec!["b".to_string()]);
    }
}
