//! Recency tracking for LRU eviction.

use divvy_core::ResourceKey;
use std::collections::{HashMap, VecDeque};

/// Slack allowed before stale queue slots are compacted away.
const COMPACTION_SLACK: usize = 16;

/// Keys ordered from least to most recently used, without duplicates.
///
/// Re-accessing a key pushes a new stamped slot to the tail and leaves the
/// old slot behind; slots whose stamp no longer matches are skipped and
/// periodically compacted, which keeps `mark_accessed` O(1) amortized.
#[derive(Debug, Default)]
pub struct AccessOrder {
    stamps: HashMap<ResourceKey, u64>,
    queue: VecDeque<(u64, ResourceKey)>,
    clock: u64,
}

impl AccessOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move `key` to the most-recently-used position, inserting it if absent.
    pub fn mark_accessed(&mut self, key: ResourceKey) {
        self.clock += 1;
        self.stamps.insert(key, self.clock);
        self.queue.push_back((self.clock, key));
        self.compact_if_sparse();
    }

    /// Forget `key`. Returns whether it was tracked.
    pub fn remove(&mut self, key: ResourceKey) -> bool {
        let removed = self.stamps.remove(&key).is_some();
        if removed {
            self.compact_if_sparse();
        }
        removed
    }

    pub fn contains(&self, key: ResourceKey) -> bool {
        self.stamps.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }

    /// Remove and return the least-recently-used key.
    pub fn pop_lru(&mut self) -> Option<ResourceKey> {
        while let Some((stamp, key)) = self.queue.pop_front() {
            if self.is_live(stamp, key) {
                self.stamps.remove(&key);
                return Some(key);
            }
        }
        None
    }

    /// The least-recently-used key, if any.
    pub fn peek_lru(&self) -> Option<ResourceKey> {
        self.live_slots().next()
    }

    /// Keys from least to most recently used.
    pub fn keys(&self) -> Vec<ResourceKey> {
        self.live_slots().collect()
    }

    fn live_slots(&self) -> impl Iterator<Item = ResourceKey> + '_ {
        self.queue
            .iter()
            .filter(|(stamp, key)| self.is_live(*stamp, *key))
            .map(|(_, key)| *key)
    }

    fn is_live(&self, stamp: u64, key: ResourceKey) -> bool {
        self.stamps.get(&key) == Some(&stamp)
    }

    fn compact_if_sparse(&mut self) {
        if self.queue.len() > self.stamps.len() * 2 + COMPACTION_SLACK {
            let stamps = &self.stamps;
            self.queue
                .retain(|(stamp, key)| stamps.get(key) == Some(stamp));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(value: i64) -> ResourceKey {
        ResourceKey::new(value).unwrap()
    }

    fn raw(keys: Vec<ResourceKey>) -> Vec<u64> {
        keys.into_iter().map(ResourceKey::get).collect()
    }

    #[test]
    fn test_insertion_order_is_recency_order() {
        let mut order = AccessOrder::new();
        order.mark_accessed(key(1));
        order.mark_accessed(key(2));
        order.mark_accessed(key(3));
        assert_eq!(raw(order.keys()), vec![1, 2, 3]);
        assert_eq!(order.peek_lru(), Some(key(1)));
    }

    #[test]
    fn test_mark_accessed_moves_to_tail_without_duplicates() {
        let mut order = AccessOrder::new();
        order.mark_accessed(key(1));
        order.mark_accessed(key(2));
        order.mark_accessed(key(1));
        order.mark_accessed(key(1));
        assert_eq!(raw(order.keys()), vec![2, 1]);
        assert_eq!(order.len(), 2);
    }

    #[test]
    fn test_pop_lru_skips_stale_slots() {
        let mut order = AccessOrder::new();
        order.mark_accessed(key(1));
        order.mark_accessed(key(2));
        order.mark_accessed(key(1));
        assert_eq!(order.pop_lru(), Some(key(2)));
        assert_eq!(order.pop_lru(), Some(key(1)));
        assert_eq!(order.pop_lru(), None);
        assert!(order.is_empty());
    }

    #[test]
    fn test_remove_forgets_key() {
        let mut order = AccessOrder::new();
        order.mark_accessed(key(1));
        order.mark_accessed(key(2));
        assert!(order.remove(key(1)));
        assert!(!order.remove(key(1)));
        assert!(!order.contains(key(1)));
        assert_eq!(raw(order.keys()), vec![2]);
    }

    #[test]
    fn test_repeated_access_stays_compact() {
        let mut order = AccessOrder::new();
        for _ in 0..10_000 {
            order.mark_accessed(key(1));
            order.mark_accessed(key(2));
        }
        assert_eq!(order.len(), 2);
        assert!(order.queue.len() <= 2 * 2 + COMPACTION_SLACK + 1);
        assert_eq!(raw(order.keys()), vec![1, 2]);
    }
}
