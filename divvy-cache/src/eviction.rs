//! Capacity-bounded LRU eviction.

use divvy_core::ResourceKey;

use crate::store::CacheStore;

/// Evicts least-recently-used keys until the store fits its capacity.
///
/// Evaluated only after a load settles; reads and `touch` never evict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LruEvictionPolicy {
    capacity: usize,
}

impl LruEvictionPolicy {
    /// A policy keeping at most `capacity` keys. A capacity of zero is raised
    /// to one so the key that just settled is never evicted by its own load.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_over_capacity(&self, len: usize) -> bool {
        len > self.capacity
    }

    /// Remove LRU entries while the store is over capacity, returning the
    /// evicted keys oldest first.
    pub fn evict<T>(&self, store: &mut CacheStore<T>) -> Vec<ResourceKey> {
        let mut evicted = Vec::new();
        while self.is_over_capacity(store.len()) {
            match store.pop_lru() {
                Some((key, _)) => evicted.push(key),
                None => break,
            }
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::CacheEntry;

    fn key(value: i64) -> ResourceKey {
        ResourceKey::new(value).unwrap()
    }

    fn filled(keys: impl IntoIterator<Item = i64>) -> CacheStore<i64> {
        let mut store = CacheStore::new();
        for value in keys {
            store.put(
                key(value),
                CacheEntry {
                    items: vec![value],
                    ..CacheEntry::default()
                },
            );
        }
        store
    }

    #[test]
    fn test_no_eviction_within_capacity() {
        let mut store = filled(1..=3);
        let evicted = LruEvictionPolicy::new(3).evict(&mut store);
        assert!(evicted.is_empty());
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_evicts_oldest_first() {
        let mut store = filled(1..=5);
        let evicted = LruEvictionPolicy::new(3).evict(&mut store);
        assert_eq!(evicted, vec![key(1), key(2)]);
        assert_eq!(store.keys(), vec![key(3), key(4), key(5)]);
    }

    #[test]
    fn test_recent_access_saves_key() {
        let mut store = filled(1..=4);
        store.mark_accessed(key(1));
        let evicted = LruEvictionPolicy::new(3).evict(&mut store);
        assert_eq!(evicted, vec![key(2)]);
        assert!(store.contains(key(1)));
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let policy = LruEvictionPolicy::new(0);
        assert_eq!(policy.capacity(), 1);
        let mut store = filled(1..=2);
        policy.evict(&mut store);
        assert_eq!(store.keys(), vec![key(2)]);
    }
}
