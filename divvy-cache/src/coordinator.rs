//! Load coordination: validate, coalesce, fetch, transform, then commit or
//! recover.
//!
//! All shared state sits behind one mutex that is never held across an
//! await; the only suspension point of a load is the transport call. Loads
//! are spawned eagerly on the current Tokio runtime, so a load runs to
//! completion even if every caller stops waiting for it.

use chrono::Utc;
use divvy_core::{IntoResourceKey, LoadError, ResourceKey, TransportError};
use futures_util::future::{self, BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{oneshot, watch};

use crate::config::CacheConfig;
use crate::domain::Domain;
use crate::entry::{CacheEntry, LoadStatus};
use crate::eviction::LruEvictionPolicy;
use crate::pending::{CallOnDrop, PendingRequestTable};
use crate::recovery;
use crate::reporter::{ErrorReport, Reporter};
use crate::stats::CacheStats;
use crate::store::CacheStore;
use crate::transport::{PageRequest, Transport};
use crate::views::KeyView;

/// The settled result of a load.
pub type LoadOutcome<T> = Result<Loaded<T>, LoadError>;

/// A handle to a load, shared by every caller that asked for the same key
/// while it was in flight.
pub type LoadFuture<T> = Shared<BoxFuture<'static, LoadOutcome<T>>>;

/// Items returned by a settled load.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded<T> {
    /// Everything cached for the key after the load settled, including
    /// previously loaded pages.
    pub items: Vec<T>,
    /// Number of items the transport returned. Zero after a rollback.
    pub fetched: usize,
    pub has_more: bool,
    /// Set when a transient failure left the previous items in place.
    pub stale: Option<LoadError>,
}

impl<T> Loaded<T> {
    pub fn is_stale(&self) -> bool {
        self.stale.is_some()
    }
}

// ============================================================================
// SHARED STATE
// ============================================================================

pub(crate) struct CacheState<D: Domain> {
    pub(crate) store: CacheStore<D::Item>,
    pub(crate) pending: PendingRequestTable<LoadFuture<D::Item>>,
    pub(crate) views: HashMap<ResourceKey, KeyView<D>>,
    pub(crate) last_error: Option<String>,
    pub(crate) stats: CacheStats,
}

impl<D: Domain> Default for CacheState<D> {
    fn default() -> Self {
        Self {
            store: CacheStore::new(),
            pending: PendingRequestTable::new(),
            views: HashMap::new(),
            last_error: None,
            stats: CacheStats::default(),
        }
    }
}

pub(crate) struct Inner<D: Domain> {
    config: CacheConfig,
    eviction: LruEvictionPolicy,
    transport: Arc<dyn Transport<D>>,
    reporter: Arc<dyn Reporter>,
    state: Mutex<CacheState<D>>,
    changes: watch::Sender<u64>,
}

impl<D: Domain> Inner<D> {
    /// Lock the shared state. Every critical section leaves the state
    /// consistent, so a poisoned lock is still usable.
    pub(crate) fn state(&self) -> MutexGuard<'_, CacheState<D>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bump_version(&self) {
        self.changes.send_modify(|version| *version += 1);
    }

    fn report(&self, key: Option<ResourceKey>, failure: &LoadError) {
        self.reporter.report_error(&ErrorReport {
            domain: D::NAME,
            key,
            message: failure.user_message(),
            details: failure.clone(),
        });
    }

    async fn run_load(
        self: Arc<Self>,
        key: ResourceKey,
        page: PageRequest,
        ticket: u64,
        prior: CacheEntry<D::Item>,
    ) -> LoadOutcome<D::Item> {
        let weak = Arc::downgrade(&self);
        let _clear_pending = CallOnDrop::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.state().pending.remove(key, ticket);
            }
        });

        tracing::debug!(
            domain = D::NAME,
            key = key.get(),
            limit = ?page.limit,
            offset = page.offset,
            "fetching"
        );

        match self.transport.fetch(key, page).await {
            Ok(raw) => Ok(self.commit(key, page, ticket, D::transform(raw))),
            Err(error) => self.fail(key, ticket, prior, error),
        }
    }

    fn commit(
        &self,
        key: ResourceKey,
        page: PageRequest,
        ticket: u64,
        fetched: Vec<D::Item>,
    ) -> Loaded<D::Item> {
        let returned = fetched.len();
        let has_more = page.has_more(returned);

        let (items, evicted) = {
            let mut state = self.state();
            state.pending.remove(key, ticket);

            // The key was evicted mid-flight: a later page alone is not the list.
            if page.appends() && !state.store.contains(key) {
                drop(state);
                tracing::debug!(
                    domain = D::NAME,
                    key = key.get(),
                    offset = page.offset,
                    "discarding page of evicted key"
                );
                return Loaded {
                    items: fetched,
                    fetched: returned,
                    has_more,
                    stale: None,
                };
            }

            let mut items = if page.appends() {
                state
                    .store
                    .get(key)
                    .map(|entry| entry.items.clone())
                    .unwrap_or_default()
            } else {
                Vec::with_capacity(returned)
            };
            items.extend(fetched);

            state.store.put(
                key,
                CacheEntry {
                    items: items.clone(),
                    status: LoadStatus::Success,
                    last_loaded_at: Some(Utc::now()),
                    has_more,
                },
            );
            state.store.mark_accessed(key);
            state.last_error = None;
            state.stats.commits += 1;
            let evicted = self.evict(&mut state);
            (items, evicted)
        };

        self.bump_version();
        self.reporter.clear_error();
        tracing::debug!(
            domain = D::NAME,
            key = key.get(),
            returned,
            cached = items.len(),
            has_more,
            evicted = evicted.len(),
            "load committed"
        );

        Loaded {
            items,
            fetched: returned,
            has_more,
            stale: None,
        }
    }

    fn fail(
        &self,
        key: ResourceKey,
        ticket: u64,
        prior: CacheEntry<D::Item>,
        error: TransportError,
    ) -> LoadOutcome<D::Item> {
        let failure = recovery::classify::<D>(error);

        let outcome = {
            let mut state = self.state();
            state.pending.remove(key, ticket);

            // An evicted key restarts cold; its pre-eviction items are gone.
            let recovered = if state.store.contains(key) {
                recovery::recover(prior, &failure)
            } else {
                CacheEntry::failed()
            };
            let outcome = if recovered.status.is_success() {
                state.stats.rollbacks += 1;
                Ok(Loaded {
                    items: recovered.items.clone(),
                    fetched: 0,
                    has_more: recovered.has_more,
                    stale: Some(failure.clone()),
                })
            } else {
                Err(failure.clone())
            };

            match failure {
                LoadError::NotFound { .. } => state.stats.not_found_failures += 1,
                _ => state.stats.transient_failures += 1,
            }
            state.store.put(key, recovered);
            state.last_error = Some(failure.user_message());
            self.evict(&mut state);
            outcome
        };

        self.bump_version();
        self.report(Some(key), &failure);
        tracing::warn!(
            domain = D::NAME,
            key = key.get(),
            kind = ?failure.kind(),
            rolled_back = outcome.is_ok(),
            error = ?failure.details(),
            "load failed"
        );

        outcome
    }

    fn evict(&self, state: &mut CacheState<D>) -> Vec<ResourceKey> {
        let evicted = self.eviction.evict(&mut state.store);
        for key in &evicted {
            state.views.remove(key);
            tracing::debug!(domain = D::NAME, key = key.get(), "evicted");
        }
        state.stats.evictions += evicted.len() as u64;
        evicted
    }
}

// ============================================================================
// RESOURCE CACHE
// ============================================================================

/// A keyed cache for one domain.
///
/// Cheap to clone; clones share the same store. Construct one per domain and
/// pass it to whoever needs it.
pub struct ResourceCache<D: Domain> {
    pub(crate) inner: Arc<Inner<D>>,
}

impl<D: Domain> Clone for ResourceCache<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: Domain> fmt::Debug for ResourceCache<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state();
        f.debug_struct("ResourceCache")
            .field("domain", &D::NAME)
            .field("len", &state.store.len())
            .field("capacity", &self.inner.eviction.capacity())
            .field("pending", &state.pending.len())
            .finish()
    }
}

impl<D: Domain> ResourceCache<D> {
    pub fn new(
        config: CacheConfig,
        transport: Arc<dyn Transport<D>>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                eviction: LruEvictionPolicy::new(config.capacity),
                config,
                transport,
                reporter,
                state: Mutex::new(CacheState::default()),
                changes,
            }),
        }
    }

    /// Load a page of the partition for `key`.
    ///
    /// An invalid key fails immediately, before any I/O, and the failure is
    /// already reported when this returns. A load already in flight for the
    /// key is shared as is, ignoring `page`. Otherwise the entry flips to
    /// `Loading` with its items still visible and the transport is called.
    ///
    /// A transient failure after a successful load resolves to the previous
    /// items with [`Loaded::stale`] set; every other failure resolves to
    /// `Err`.
    pub fn load(&self, key: impl IntoResourceKey, page: PageRequest) -> LoadFuture<D::Item> {
        let key = match recovery::validate_key::<D>(key) {
            Ok(key) => key,
            Err(failure) => return self.reject(failure),
        };
        let page = PageRequest {
            limit: page.limit.or(self.inner.config.default_limit),
            ..page
        };

        let mut state = self.inner.state();
        if let Some(in_flight) = state.pending.get(key) {
            state.stats.coalesced += 1;
            tracing::debug!(domain = D::NAME, key = key.get(), "joining in-flight load");
            return in_flight;
        }

        let prior = state.store.snapshot(key);
        state.store.begin_load(key);
        state.stats.transport_calls += 1;
        let ticket = state.pending.issue_ticket();
        let load = self.spawn_load(key, page, ticket, prior);
        state.pending.insert(key, ticket, load.clone());
        drop(state);

        self.inner.bump_version();
        load
    }

    /// Reload the first page of `key`, replacing any appended pages.
    pub fn refresh(&self, key: impl IntoResourceKey) -> LoadFuture<D::Item> {
        self.load(key, PageRequest::first())
    }

    /// Refresh the recency of a cached key without loading it. Never evicts.
    pub fn touch(&self, key: impl IntoResourceKey) -> bool {
        match key.into_resource_key() {
            Ok(key) => self.inner.state().store.mark_accessed(key),
            Err(_) => false,
        }
    }

    /// The last user-visible error raised by this instance, cleared by the
    /// next successful commit.
    pub fn error(&self) -> Option<String> {
        self.inner.state().last_error.clone()
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.state().stats
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    pub fn capacity(&self) -> usize {
        self.inner.eviction.capacity()
    }

    /// Number of cached keys, including keys with a first load in flight.
    pub fn len(&self) -> usize {
        self.inner.state().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.state().store.is_empty()
    }

    /// Whether a load for `key` is in flight.
    pub fn is_pending(&self, key: impl IntoResourceKey) -> bool {
        key.into_resource_key()
            .map(|key| self.inner.state().pending.contains(key))
            .unwrap_or(false)
    }

    /// Keys from least to most recently used.
    pub fn recency(&self) -> Vec<ResourceKey> {
        self.inner.state().store.recency()
    }

    /// Monotonic counter bumped on every change visible through a view or
    /// through [`ResourceCache::error`].
    pub fn version(&self) -> u64 {
        *self.inner.changes.borrow()
    }

    /// Watch the version counter to re-evaluate views after changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.changes.subscribe()
    }

    fn reject(&self, failure: LoadError) -> LoadFuture<D::Item> {
        {
            let mut state = self.inner.state();
            state.last_error = Some(failure.user_message());
            state.stats.validation_failures += 1;
        }
        self.inner.bump_version();
        self.inner.report(None, &failure);
        tracing::warn!(domain = D::NAME, error = %failure, "rejected load");
        future::ready(Err(failure)).boxed().shared()
    }

    fn spawn_load(
        &self,
        key: ResourceKey,
        page: PageRequest,
        ticket: u64,
        prior: CacheEntry<D::Item>,
    ) -> LoadFuture<D::Item> {
        let weak = Arc::downgrade(&self.inner);
        let computation = async move {
            let Some(inner) = weak.upgrade() else {
                return Err(aborted::<D>("cache dropped before the load started"));
            };
            let fallback = prior.clone();
            let settled = AssertUnwindSafe(Arc::clone(&inner).run_load(key, page, ticket, prior))
                .catch_unwind()
                .await;
            match settled {
                Ok(outcome) => outcome,
                // A panicking transport or transform settles like a network failure.
                Err(_) => {
                    inner.fail(key, ticket, fallback, TransportError::network("load panicked"))
                }
            }
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let (sender, receiver) = oneshot::channel();
                handle.spawn(async move {
                    // Nobody waiting is fine: the store is already updated.
                    sender.send(computation.await).ok();
                });
                receiver
                    .map(|received| {
                        received.unwrap_or_else(|_| Err(aborted::<D>("load task was cancelled")))
                    })
                    .boxed()
                    .shared()
            }
            // Outside a runtime the load is driven by whoever awaits it.
            Err(_) => computation.boxed().shared(),
        }
    }
}

fn aborted<D: Domain>(reason: &str) -> LoadError {
    LoadError::Transient {
        message: D::LOAD_FAILED_MESSAGE.to_string(),
        details: TransportError::network(reason),
    }
}
