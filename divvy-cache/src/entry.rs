//! Per-key cache entries and their load status.

use divvy_core::Timestamp;

/// Load status of one key.
///
/// ```text
/// Idle -> Loading -> Success | Error
/// Success -> Loading -> Success (replace/append) | Success (rollback) | Error
/// Error -> Loading -> Success | Error
/// ```
///
/// Eviction returns a key to the implicit state before `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

impl LoadStatus {
    pub fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_loading(self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn is_error(self) -> bool {
        matches!(self, Self::Error)
    }
}

/// Cached state of one partition.
///
/// `items` keep the order of the last successful fetch, extended in order by
/// appended pages. An absent key reads as `CacheEntry::default()`.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    pub items: Vec<T>,
    pub status: LoadStatus,
    pub last_loaded_at: Option<Timestamp>,
    /// Whether the last fetched page was full.
    pub has_more: bool,
}

impl<T> Default for CacheEntry<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            status: LoadStatus::Idle,
            last_loaded_at: None,
            has_more: false,
        }
    }
}

impl<T> CacheEntry<T> {
    /// An entry in the error state with no data.
    pub fn failed() -> Self {
        Self {
            status: LoadStatus::Error,
            ..Self::default()
        }
    }
}
