//! In-flight load tracking for request coalescing.

use divvy_core::ResourceKey;
use std::collections::HashMap;

/// Runs a closure when dropped.
///
/// Used to clear a pending entry on every exit path of a load, including
/// unwinding and task abort at runtime shutdown.
pub struct CallOnDrop {
    f: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl CallOnDrop {
    pub fn new<F: FnOnce() + Send + 'static>(f: F) -> Self {
        Self {
            f: Some(Box::new(f)),
        }
    }
}

impl Drop for CallOnDrop {
    fn drop(&mut self) {
        if let Some(f) = self.f.take() {
            f();
        }
    }
}

#[derive(Debug)]
struct PendingLoad<F> {
    ticket: u64,
    future: F,
}

/// Key to in-flight load, at most one per key.
///
/// Every insertion carries a ticket; removal only succeeds for the ticket
/// that inserted the entry, so a late cleanup can never drop a newer load
/// issued for the same key.
#[derive(Debug)]
pub struct PendingRequestTable<F> {
    loads: HashMap<ResourceKey, PendingLoad<F>>,
    next_ticket: u64,
}

impl<F> Default for PendingRequestTable<F> {
    fn default() -> Self {
        Self {
            loads: HashMap::new(),
            next_ticket: 0,
        }
    }
}

impl<F: Clone> PendingRequestTable<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle to the load in flight for `key`, if any.
    pub fn get(&self, key: ResourceKey) -> Option<F> {
        self.loads.get(&key).map(|load| load.future.clone())
    }

    pub fn contains(&self, key: ResourceKey) -> bool {
        self.loads.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.loads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loads.is_empty()
    }

    /// Reserve the ticket for the next insertion.
    pub fn issue_ticket(&mut self) -> u64 {
        self.next_ticket += 1;
        self.next_ticket
    }

    /// Register the load for `key`. Returns `false` and leaves the table
    /// untouched if a load is already in flight.
    pub fn insert(&mut self, key: ResourceKey, ticket: u64, future: F) -> bool {
        if self.loads.contains_key(&key) {
            return false;
        }
        self.loads.insert(key, PendingLoad { ticket, future });
        true
    }

    /// Remove the entry for `key` if it was inserted with `ticket`.
    pub fn remove(&mut self, key: ResourceKey, ticket: u64) -> bool {
        match self.loads.get(&key) {
            Some(load) if load.ticket == ticket => {
                self.loads.remove(&key);
                true
            }
            _ => false,
        }
    }

    /// Keys with a load in flight, ascending.
    pub fn keys(&self) -> Vec<ResourceKey> {
        let mut keys: Vec<ResourceKey> = self.loads.keys().copied().collect();
        keys.sort_unstable();
        keys
    }
}
