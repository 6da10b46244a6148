//! Divvy Cache - Keyed Resource Cache Engine
//!
//! One generic engine behind every domain cache of the admin client. A cache
//! instance loads partitions of a domain scoped by a positive integer key,
//! shares concurrent loads of the same key, keeps at most a fixed number of
//! keys by evicting the least recently used, and keeps already-visible data
//! when a refresh fails transiently.
//!
//! # Example
//!
//! ```ignore
//! let balances = ResourceCache::<Balances>::new(
//!     CacheConfig::default(),
//!     Arc::new(transport),
//!     Arc::new(TracingReporter),
//! );
//!
//! // Concurrent loads of group 1 share one transport call.
//! let (a, b) = tokio::join!(
//!     balances.load(1, PageRequest::first()),
//!     balances.load(1, PageRequest::first()),
//! );
//! assert_eq!(a, b);
//!
//! // Views read the live store; evicted keys read as idle and empty.
//! let total = balances.sum_by(1, |b| b.balance);
//! ```

pub mod config;
pub mod coordinator;
pub mod domain;
pub mod entry;
pub mod eviction;
pub mod order;
pub mod pending;
pub mod recovery;
pub mod reporter;
pub mod stats;
pub mod store;
pub mod transport;
pub mod views;

pub use config::{CacheConfig, DEFAULT_CAPACITY};
pub use coordinator::{LoadFuture, LoadOutcome, Loaded, ResourceCache};
pub use domain::Domain;
pub use entry::{CacheEntry, LoadStatus};
pub use eviction::LruEvictionPolicy;
pub use order::AccessOrder;
pub use pending::{CallOnDrop, PendingRequestTable};
pub use reporter::{ErrorReport, ErrorSignal, FanoutReporter, Reporter, TracingReporter};
pub use stats::CacheStats;
pub use store::CacheStore;
pub use transport::{PageRequest, Transport};
pub use views::KeyView;

// Re-exported so domain crates need only one import path.
pub use divvy_core::{
    FailureKind, IntoResourceKey, ItemId, LoadError, ResourceKey, TransportError,
};
