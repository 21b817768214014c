//! Step-by-step tour of the cache on a capacity-3 instance.

use tracing::info;

use crate::cache::{LruCache, Result};

/// Run the tour, logging the recency order after each step.
///
/// Returns the keys observed after each step, MRU first.
pub fn run() -> Result<Vec<Vec<&'static str>>> {
    let cache = LruCache::new(3)?;
    let mut steps = Vec::new();
    let mut snapshot = |label: &str, cache: &LruCache<&'static str, i32>| {
        let keys = cache.keys();
        info!(step = label, ?keys, size = cache.len());
        steps.push(keys);
    };

    info!("=== Basic operations ===");
    cache.put("a", 1);
    cache.put("b", 2);
    cache.put("c", 3);
    snapshot("after put a, b, c", &cache);

    let a = cache.get(&"a");
    info!(value = ?a, "get a");
    snapshot("after get a", &cache);

    cache.put("d", 4);
    snapshot("after put d", &cache);
    info!(value = ?cache.get(&"b"), "get evicted b");

    info!("=== Update existing key ===");
    cache.put("a", 100);
    info!(value = ?cache.get(&"a"), "updated a");
    snapshot("after update a", &cache);

    info!("=== Peek vs get ===");
    cache.put("x", 99);
    cache.put("y", 98);
    snapshot("before peek", &cache);
    cache.peek(&"a");
    snapshot("after peek a", &cache);
    cache.get(&"a");
    snapshot("after get a", &cache);

    info!("=== Delete ===");
    info!(deleted = cache.delete(&"x"), "delete x");
    snapshot("after delete x", &cache);

    info!("=== Clear ===");
    cache.clear();
    snapshot("after clear", &cache);

    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walkthrough_steps() {
        let steps = run().unwrap();

        assert_eq!(steps[0], vec!["c", "b", "a"]);
        assert_eq!(steps[1], vec!["a", "c", "b"]);
        assert_eq!(steps[2], vec!["d", "a", "c"]);
        assert_eq!(steps[3], vec!["a", "d", "c"]);
        // x and y push out c and d
        assert_eq!(steps[4], vec!["y", "x", "a"]);
        // peek leaves the order alone, get promotes
        assert_eq!(steps[5], steps[4]);
        assert_eq!(steps[6], vec!["a", "y", "x"]);
        assert_eq!(steps[7], vec!["a", "y"]);
        assert!(steps[8].is_empty());
    }
}
