//! Thread-safe LRU cache.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use super::error::{CacheError, Result};
use super::list::{RecencyList, SlotId};
use super::{CacheConfig, CacheStats};

/// Callback invoked with each entry displaced by capacity eviction.
///
/// Runs synchronously while the cache's write lock is held, before the entry
/// that caused the eviction becomes visible. It must not call back into the
/// same cache: doing so deadlocks.
pub type EvictionListener<K, V> = Arc<dyn Fn(&K, &V) + Send + Sync>;

/// Upper bound on the up-front allocation. Capacity is an eviction limit,
/// not a reservation; storage beyond this grows on demand.
const PREALLOC_LIMIT: usize = 1024;

/// Everything guarded by the lock.
struct Inner<K, V> {
    index: HashMap<K, SlotId>,
    order: RecencyList<K, V>,
    stats: CacheStats,
}

impl<K, V> Inner<K, V> {
    fn new(capacity: usize) -> Self {
        let reserve = capacity.min(PREALLOC_LIMIT);
        Self {
            index: HashMap::with_capacity(reserve),
            order: RecencyList::with_capacity(reserve),
            stats: CacheStats::default(),
        }
    }

    fn clear(&mut self) {
        self.index.clear();
        self.order.clear();
        self.stats = CacheStats::default();
    }
}

/// A fixed-capacity cache that evicts the least-recently used entry on
/// overflow.
///
/// All state sits behind one `parking_lot::RwLock`:
/// - `get`, `put`, `delete` and `clear` take the write lock for the whole
///   compound operation (lookup + relink, or lookup + evict + insert).
/// - `peek`, `len`, `keys`, `contains` and `stats` take the read lock and may
///   run in parallel with each other.
///
/// Values are handed out as clones. Store `Arc<T>` to share large values.
pub struct LruCache<K, V> {
    capacity: NonZeroUsize,
    inner: RwLock<Inner<K, V>>,
    listener: Option<EvictionListener<K, V>>,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Create a cache holding at most `capacity` entries.
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        Self::build(capacity, None)
    }

    /// Create a cache that reports every evicted entry to `listener`.
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` if `capacity` is zero.
    pub fn with_eviction_listener<F>(capacity: usize, listener: F) -> Result<Self>
    where
        F: Fn(&K, &V) + Send + Sync + 'static,
    {
        Self::build(capacity, Some(Arc::new(listener)))
    }

    /// Create a cache from a [`CacheConfig`].
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        Self::build(config.capacity, None)
    }

    pub(crate) fn build(capacity: usize, listener: Option<EvictionListener<K, V>>) -> Result<Self> {
        let capacity = CacheConfig::with_capacity(capacity).validate()?;
        Ok(Self {
            capacity,
            inner: RwLock::new(Inner::new(capacity.get())),
            listener,
        })
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Look up `key` and mark it most-recently used.
    ///
    /// Counts a hit or a miss. A miss changes nothing else.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.write();
        match inner.index.get(key).copied() {
            Some(id) => {
                inner.order.move_to_front(id);
                inner.stats.hits += 1;
                Some(inner.order.value(id).clone())
            }
            None => {
                inner.stats.misses += 1;
                None
            }
        }
    }

    /// Look up `key` without touching recency order or statistics.
    pub fn peek(&self, key: &K) -> Option<V> {
        let inner = self.inner.read();
        inner
            .index
            .get(key)
            .map(|&id| inner.order.value(id).clone())
    }

    /// Check whether `key` is cached, without touching recency order or
    /// statistics.
    pub fn contains(&self, key: &K) -> bool {
        self.inner.read().index.contains_key(key)
    }

    /// Insert or update `key`, making it most-recently used.
    ///
    /// Updating an existing key never evicts. Inserting a new key into a full
    /// cache evicts the least-recently used entry first.
    pub fn put(&self, key: K, value: V) {
        let mut inner = self.inner.write();

        if let Some(&id) = inner.index.get(&key) {
            *inner.order.value_mut(id) = value;
            inner.order.move_to_front(id);
            return;
        }

        if inner.index.len() >= self.capacity.get() {
            self.evict_lru(&mut inner);
        }

        let id = inner.order.push_front(key.clone(), value);
        inner.index.insert(key, id);
    }

    /// Remove `key`. Returns `true` if an entry was removed.
    pub fn delete(&self, key: &K) -> bool {
        let mut inner = self.inner.write();
        match inner.index.remove(key) {
            Some(id) => {
                inner.order.remove(id);
                true
            }
            None => false,
        }
    }

    /// Remove every entry and reset statistics.
    ///
    /// The capacity and eviction listener are kept, so the cache behaves
    /// like a freshly constructed one.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        let dropped = inner.index.len();
        inner.clear();
        debug!(dropped, "Cache cleared");
    }

    /// Current number of entries.
    pub fn len(&self) -> usize {
        self.inner.read().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all keys from most- to least-recently used.
    pub fn keys(&self) -> Vec<K> {
        let inner = self.inner.read();
        inner.order.iter().map(|(_, key)| key.clone()).collect()
    }

    /// Snapshot of hit/miss/eviction counters.
    pub fn stats(&self) -> CacheStats {
        self.inner.read().stats
    }

    /// Verify that the index and the recency order agree.
    ///
    /// This is a linear walk meant for tests and diagnostics. Any error it
    /// returns is a bug in this crate.
    pub fn check_invariants(&self) -> Result<()> {
        let inner = self.inner.read();
        let inconsistent = |msg: String| CacheError::InternalInconsistency(msg);

        inner.order.check_links().map_err(inconsistent)?;

        if inner.index.len() != inner.order.len() {
            return Err(inconsistent(format!(
                "index holds {} keys, order holds {}",
                inner.index.len(),
                inner.order.len()
            )));
        }
        if inner.index.len() > self.capacity.get() {
            return Err(inconsistent(format!(
                "{} entries exceed capacity {}",
                inner.index.len(),
                self.capacity
            )));
        }
        for (id, key) in inner.order.iter() {
            if inner.index.get(key) != Some(&id) {
                return Err(inconsistent(format!(
                    "slot {id} is in the order but not indexed under its key"
                )));
            }
        }
        for &id in inner.index.values() {
            let key = inner.order.key(id);
            if inner.index.get(key) != Some(&id) {
                return Err(inconsistent(format!("slot {id} is indexed under a different key")));
            }
        }
        Ok(())
    }

    fn evict_lru(&self, inner: &mut Inner<K, V>) {
        let Some((key, value)) = inner.order.pop_back() else {
            return;
        };
        if inner.index.remove(&key).is_none() {
            panic!("internal inconsistency: evicted entry was not indexed");
        }
        inner.stats.evictions += 1;
        trace!(remaining = inner.index.len(), "Evicted least-recently used entry");

        if let Some(listener) = &self.listener {
            listener(&key, &value);
        }
    }
}

impl<K, V> fmt::Debug for LruCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("LruCache")
            .field("capacity", &self.capacity)
            .field("len", &inner.index.len())
            .field("stats", &inner.stats)
            .field("has_listener", &self.listener.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::thread;

    fn abc() -> LruCache<&'static str, i32> {
        let cache = LruCache::new(3).unwrap();
        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("c", 3);
        cache
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let err = LruCache::<String, i32>::new(0).unwrap_err();
        assert_eq!(err, CacheError::InvalidConfiguration { capacity: 0 });
    }

    #[test]
    fn test_from_config() {
        let cache = LruCache::<u32, u32>::from_config(&CacheConfig::with_capacity(7)).unwrap();
        assert_eq!(cache.capacity(), 7);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_recency_order() {
        let cache = abc();
        assert_eq!(cache.keys(), vec!["c", "b", "a"]);

        assert_eq!(cache.get(&"a"), Some(1));
        assert_eq!(cache.keys(), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_eviction_removes_lru() {
        let cache = abc();
        cache.get(&"a");
        cache.put("d", 4);

        assert_eq!(cache.keys(), vec!["d", "a", "c"]);
        assert_eq!(cache.get(&"b"), None);
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.stats().evictions, 1);
        assert!(cache.check_invariants().is_ok());
    }

    #[test]
    fn test_update_in_place() {
        let cache = abc();
        cache.put("a", 100);

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.keys(), vec!["a", "c", "b"]);
        assert_eq!(cache.get(&"a"), Some(100));
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_peek_does_not_reorder_or_count() {
        let cache = abc();
        let before = cache.keys();

        assert_eq!(cache.peek(&"a"), Some(1));
        assert_eq!(cache.peek(&"zzz"), None);
        assert!(cache.contains(&"b"));

        assert_eq!(cache.keys(), before);
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn test_get_counts_hits_and_misses() {
        let cache = abc();
        cache.get(&"a");
        cache.get(&"b");
        cache.get(&"nope");

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_miss_does_not_reorder() {
        let cache = abc();
        cache.get(&"nope");
        assert_eq!(cache.keys(), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_delete() {
        let cache = abc();

        assert!(cache.delete(&"b"));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.keys(), vec!["c", "a"]);
        assert_eq!(cache.get(&"b"), None);

        assert!(!cache.delete(&"b"));
        assert_eq!(cache.keys(), vec!["c", "a"]);
        assert!(cache.check_invariants().is_ok());
    }

    #[test]
    fn test_delete_then_fill_reuses_space() {
        let cache = abc();
        cache.delete(&"c");
        cache.put("d", 4);

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.stats().evictions, 0);
        assert_eq!(cache.keys(), vec!["d", "b", "a"]);
    }

    #[test]
    fn test_clear_resets_to_fresh_state() {
        let cache = abc();
        cache.get(&"a");
        cache.clear();

        assert_eq!(cache.len(), 0);
        assert!(cache.keys().is_empty());
        assert_eq!(cache.stats(), CacheStats::default());
        assert_eq!(cache.capacity(), 3);

        cache.put("x", 1);
        cache.put("y", 2);
        cache.put("z", 3);
        cache.put("w", 4);
        assert_eq!(cache.keys(), vec!["w", "z", "y"]);
        assert!(cache.check_invariants().is_ok());
    }

    #[test]
    fn test_huge_capacity_does_not_preallocate() {
        let cache = LruCache::new(usize::MAX).unwrap();
        assert_eq!(cache.capacity(), usize::MAX);

        for i in 0..10u64 {
            cache.put(i, i + 1);
        }
        assert_eq!(cache.get(&3), Some(4));
        assert_eq!(cache.len(), 10);

        cache.clear();
        assert!(cache.is_empty());
        cache.put(42, 1);
        assert_eq!(cache.keys(), vec![42]);
        assert!(cache.check_invariants().is_ok());
    }

    #[test]
    fn test_round_trip() {
        let cache = LruCache::new(1).unwrap();
        for i in 0..50 {
            cache.put(i, i * 10);
            assert_eq!(cache.get(&i), Some(i * 10));
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_capacity_bound_holds_after_every_put() {
        let cache = LruCache::new(4).unwrap();
        for i in 0..100u32 {
            cache.put(i % 13, i);
            assert!(cache.len() <= 4);
        }
        assert!(cache.check_invariants().is_ok());
    }

    #[test]
    fn test_returned_value_is_a_copy() {
        let cache = LruCache::new(1).unwrap();
        cache.put("k", vec![1, 2, 3]);

        let mut v = cache.get(&"k").unwrap();
        v.push(4);

        assert_eq!(cache.peek(&"k"), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_eviction_listener_sees_evicted_entry() {
        let evicted = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&evicted);
        let cache = LruCache::with_eviction_listener(2, move |k: &&'static str, v: &i32| {
            sink.lock().unwrap().push((*k, *v));
        })
        .unwrap();

        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("a", 10);
        cache.put("c", 3);
        cache.delete(&"a");
        cache.clear();

        assert_eq!(*evicted.lock().unwrap(), vec![("b", 2)]);
    }

    #[test]
    fn test_concurrent_distinct_keys() {
        const THREADS: usize = 8;
        const OPS: usize = 250;

        let cache = Arc::new(LruCache::new(THREADS * OPS).unwrap());
        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..OPS {
                        let key = t * OPS + i;
                        cache.put(key, key * 2);
                        assert_eq!(cache.get(&key), Some(key * 2));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), THREADS * OPS);
        assert!(cache.check_invariants().is_ok());
        for key in 0..THREADS * OPS {
            assert_eq!(cache.peek(&key), Some(key * 2));
        }
    }

    #[test]
    fn test_concurrent_contention_keeps_invariants() {
        let cache = Arc::new(LruCache::new(16).unwrap());
        let handles: Vec<_> = (0..6u64)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..2_000u64 {
                        let key = (i * 7 + t) % 40;
                        match i % 5 {
                            0 => {
                                cache.delete(&key);
                            }
                            1 => {
                                cache.get(&key);
                            }
                            2 => {
                                cache.peek(&key);
                                cache.keys();
                            }
                            _ => cache.put(key, i),
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert!(cache.len() <= 16);
        assert!(cache.check_invariants().is_ok());
        let keys = cache.keys();
        let mut dedup = keys.clone();
        dedup.sort_unstable();
        dedup.dedup();
        assert_eq!(dedup.len(), keys.len());
    }
}
