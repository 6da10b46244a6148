//! Cache store: the single source of truth for cached partitions.

use divvy_core::ResourceKey;
use std::collections::HashMap;

use crate::entry::{CacheEntry, LoadStatus};
use crate::order::AccessOrder;

/// Mapping from key to entry, kept in lockstep with its [`AccessOrder`].
///
/// Every insertion of a new key also records it as most recently used and
/// every removal forgets it, so the set of keys in the access order always
/// equals the set of keys in the store.
#[derive(Debug)]
pub struct CacheStore<T> {
    entries: HashMap<ResourceKey, CacheEntry<T>>,
    order: AccessOrder,
}

impl<T> Default for CacheStore<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            order: AccessOrder::new(),
        }
    }
}

impl<T> CacheStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: ResourceKey) -> Option<&CacheEntry<T>> {
        self.entries.get(&key)
    }

    pub fn contains(&self, key: ResourceKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Status of `key`; absent keys are idle.
    pub fn status(&self, key: ResourceKey) -> LoadStatus {
        self.entries
            .get(&key)
            .map(|entry| entry.status)
            .unwrap_or_default()
    }

    /// Insert or replace the entry for `key`.
    ///
    /// A new key becomes the most recently used; replacing an existing entry
    /// leaves its recency untouched.
    pub fn put(&mut self, key: ResourceKey, entry: CacheEntry<T>) {
        if self.entries.insert(key, entry).is_none() {
            self.order.mark_accessed(key);
        }
    }

    /// Flip `key` to `Loading`, keeping its items visible, creating the entry
    /// if needed.
    pub fn begin_load(&mut self, key: ResourceKey) {
        match self.entries.get_mut(&key) {
            Some(entry) => entry.status = LoadStatus::Loading,
            None => self.put(
                key,
                CacheEntry {
                    status: LoadStatus::Loading,
                    ..CacheEntry::default()
                },
            ),
        }
    }

    /// Refresh the recency of a cached key. Unknown keys are ignored.
    pub fn mark_accessed(&mut self, key: ResourceKey) -> bool {
        if self.entries.contains_key(&key) {
            self.order.mark_accessed(key);
            true
        } else {
            false
        }
    }

    pub fn remove(&mut self, key: ResourceKey) -> Option<CacheEntry<T>> {
        self.order.remove(key);
        self.entries.remove(&key)
    }

    /// Remove the least-recently-used entry.
    pub fn pop_lru(&mut self) -> Option<(ResourceKey, CacheEntry<T>)> {
        let key = self.order.pop_lru()?;
        self.entries.remove(&key).map(|entry| (key, entry))
    }

    /// Keys from least to most recently used.
    pub fn recency(&self) -> Vec<ResourceKey> {
        self.order.keys()
    }

    /// All cached keys, ascending.
    pub fn keys(&self) -> Vec<ResourceKey> {
        let mut keys: Vec<ResourceKey> = self.entries.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    /// Entries in ascending key order.
    pub fn iter_sorted(&self) -> impl Iterator<Item = (ResourceKey, &CacheEntry<T>)> + '_ {
        self.keys()
            .into_iter()
            .filter_map(move |key| self.entries.get(&key).map(|entry| (key, entry)))
    }
}

impl<T: Clone> CacheStore<T> {
    /// A copy of the entry for `key`, or a virgin entry if absent.
    pub fn snapshot(&self, key: ResourceKey) -> CacheEntry<T> {
        self.entries.get(&key).cloned().unwrap_or_default()
    }
}
