//! Derived views: read-only projections of the current store.
//!
//! Every view reads the store at call time and keeps nothing of its own, so
//! an evicted or never-loaded key always reads as a virgin idle entry. Use
//! [`ResourceCache::subscribe`] to learn when to read again.

use divvy_core::{IntoResourceKey, ItemId, ResourceKey, Timestamp};
use std::cmp::Ordering;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::coordinator::{Inner, ResourceCache};
use crate::domain::Domain;
use crate::entry::{CacheEntry, LoadStatus};

// ============================================================================
// PURE PROJECTIONS
// ============================================================================

/// Items whose search text contains `needle`, ignoring case. An empty or
/// blank needle matches everything.
pub fn filter_text<D: Domain>(items: &[D::Item], needle: &str) -> Vec<D::Item> {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return items.to_vec();
    }
    items
        .iter()
        .filter(|item| D::search_text(item).to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// Sum of `value` over `items`.
pub fn sum_by<T>(items: &[T], value: impl Fn(&T) -> f64) -> f64 {
    items.iter().map(value).sum()
}

/// A sorted copy of `items`. The sort is stable.
pub fn sorted_by<T: Clone>(items: &[T], compare: impl FnMut(&T, &T) -> Ordering) -> Vec<T> {
    let mut sorted = items.to_vec();
    sorted.sort_by(compare);
    sorted
}

/// The item with identity `id`.
pub fn find_by_id<D: Domain>(items: &[D::Item], id: ItemId) -> Option<D::Item> {
    items.iter().find(|item| D::item_id(item) == id).cloned()
}

// ============================================================================
// PER-KEY VIEWS ON THE CACHE
// ============================================================================

impl<D: Domain> Inner<D> {
    fn read<R>(&self, key: ResourceKey, f: impl FnOnce(Option<&CacheEntry<D::Item>>) -> R) -> R {
        let state = self.state();
        f(state.store.get(key))
    }
}

impl<D: Domain> ResourceCache<D> {
    fn read<R>(
        &self,
        key: impl IntoResourceKey,
        f: impl FnOnce(Option<&CacheEntry<D::Item>>) -> R,
    ) -> R {
        match key.into_resource_key() {
            Ok(key) => self.inner.read(key, f),
            Err(_) => f(None),
        }
    }

    /// A copy of the entry for `key`.
    pub fn entry(&self, key: impl IntoResourceKey) -> CacheEntry<D::Item> {
        self.read(key, |entry| entry.cloned().unwrap_or_default())
    }

    pub fn items(&self, key: impl IntoResourceKey) -> Vec<D::Item> {
        self.read(key, |entry| entry.map(|e| e.items.clone()).unwrap_or_default())
    }

    pub fn status(&self, key: impl IntoResourceKey) -> LoadStatus {
        self.read(key, |entry| entry.map(|e| e.status).unwrap_or_default())
    }

    pub fn is_idle(&self, key: impl IntoResourceKey) -> bool {
        self.status(key).is_idle()
    }

    pub fn is_loading(&self, key: impl IntoResourceKey) -> bool {
        self.status(key).is_loading()
    }

    pub fn is_success(&self, key: impl IntoResourceKey) -> bool {
        self.status(key).is_success()
    }

    pub fn is_error(&self, key: impl IntoResourceKey) -> bool {
        self.status(key).is_error()
    }

    pub fn last_loaded_at(&self, key: impl IntoResourceKey) -> Option<Timestamp> {
        self.read(key, |entry| entry.and_then(|e| e.last_loaded_at))
    }

    pub fn has_more(&self, key: impl IntoResourceKey) -> bool {
        self.read(key, |entry| entry.is_some_and(|e| e.has_more))
    }

    pub fn count(&self, key: impl IntoResourceKey) -> usize {
        self.read(key, |entry| entry.map_or(0, |e| e.items.len()))
    }

    /// Pure lookup of one item, no I/O.
    pub fn find_by_id(&self, key: impl IntoResourceKey, id: ItemId) -> Option<D::Item> {
        self.read(key, |entry| entry.and_then(|e| find_by_id::<D>(&e.items, id)))
    }

    pub fn filter_text(&self, key: impl IntoResourceKey, needle: &str) -> Vec<D::Item> {
        filter_text::<D>(&self.items(key), needle)
    }

    /// Callbacks run on a copy of the items, outside the cache lock, so they
    /// may read the cache themselves.
    pub fn sum_by(&self, key: impl IntoResourceKey, value: impl Fn(&D::Item) -> f64) -> f64 {
        sum_by(&self.items(key), value)
    }

    pub fn sorted_by(
        &self,
        key: impl IntoResourceKey,
        compare: impl FnMut(&D::Item, &D::Item) -> Ordering,
    ) -> Vec<D::Item> {
        sorted_by(&self.items(key), compare)
    }

    /// All cached keys, ascending.
    pub fn cached_keys(&self) -> Vec<ResourceKey> {
        self.inner.state().store.keys()
    }

    /// Items of every cached key, concatenated in ascending key order.
    pub fn all_items(&self) -> Vec<D::Item> {
        let state = self.inner.state();
        state
            .store
            .iter_sorted()
            .flat_map(|(_, entry)| entry.items.iter().cloned())
            .collect()
    }

    /// The view handle for `key`.
    ///
    /// Handles of cached keys are built once and dropped when the key is
    /// evicted; handles of uncached keys are not retained.
    pub fn view(&self, key: ResourceKey) -> KeyView<D> {
        let mut state = self.inner.state();
        if !state.store.contains(key) {
            return KeyView::new(key, Arc::downgrade(&self.inner));
        }
        state
            .views
            .entry(key)
            .or_insert_with(|| KeyView::new(key, Arc::downgrade(&self.inner)))
            .clone()
    }

    /// Number of view handles currently retained.
    pub fn retained_views(&self) -> usize {
        self.inner.state().views.len()
    }
}

// ============================================================================
// KEY VIEW HANDLE
// ============================================================================

/// A read-only handle bound to one key of one cache.
///
/// Holds no data: every accessor reads the live store. Once the cache is
/// dropped every accessor returns the virgin default.
pub struct KeyView<D: Domain> {
    key: ResourceKey,
    cache: Weak<Inner<D>>,
}

impl<D: Domain> Clone for KeyView<D> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            cache: Weak::clone(&self.cache),
        }
    }
}

impl<D: Domain> fmt::Debug for KeyView<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyView")
            .field("domain", &D::NAME)
            .field("key", &self.key)
            .finish()
    }
}

impl<D: Domain> KeyView<D> {
    fn new(key: ResourceKey, cache: Weak<Inner<D>>) -> Self {
        Self { key, cache }
    }

    fn read<R>(&self, f: impl FnOnce(Option<&CacheEntry<D::Item>>) -> R) -> R {
        match self.cache.upgrade() {
            Some(inner) => inner.read(self.key, f),
            None => f(None),
        }
    }

    pub fn key(&self) -> ResourceKey {
        self.key
    }

    pub fn entry(&self) -> CacheEntry<D::Item> {
        self.read(|entry| entry.cloned().unwrap_or_default())
    }

    pub fn items(&self) -> Vec<D::Item> {
        self.read(|entry| entry.map(|e| e.items.clone()).unwrap_or_default())
    }

    pub fn status(&self) -> LoadStatus {
        self.read(|entry| entry.map(|e| e.status).unwrap_or_default())
    }

    pub fn is_idle(&self) -> bool {
        self.status().is_idle()
    }

    pub fn is_loading(&self) -> bool {
        self.status().is_loading()
    }

    pub fn is_success(&self) -> bool {
        self.status().is_success()
    }

    pub fn is_error(&self) -> bool {
        self.status().is_error()
    }

    pub fn last_loaded_at(&self) -> Option<Timestamp> {
        self.read(|entry| entry.and_then(|e| e.last_loaded_at))
    }

    pub fn count(&self) -> usize {
        self.read(|entry| entry.map_or(0, |e| e.items.len()))
    }

    pub fn find(&self, id: ItemId) -> Option<D::Item> {
        self.read(|entry| entry.and_then(|e| find_by_id::<D>(&e.items, id)))
    }

    pub fn filter(&self, needle: &str) -> Vec<D::Item> {
        filter_text::<D>(&self.items(), needle)
    }

    pub fn sum(&self, value: impl Fn(&D::Item) -> f64) -> f64 {
        sum_by(&self.items(), value)
    }
}
