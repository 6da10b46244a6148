//! Transport collaborator: fetches one partition of raw data.

use async_trait::async_trait;
use divvy_core::{ResourceKey, TransportError};

use crate::domain::Domain;

/// Pagination forwarded opaquely to the transport.
///
/// An `offset` of zero replaces the cached list; any other offset appends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageRequest {
    pub limit: Option<usize>,
    pub offset: usize,
}

impl PageRequest {
    /// First page with the cache's default limit.
    pub fn first() -> Self {
        Self::default()
    }

    /// First page of at most `limit` items.
    pub fn limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            offset: 0,
        }
    }

    /// A page of at most `limit` items starting at `offset`.
    pub fn page(limit: usize, offset: usize) -> Self {
        Self {
            limit: Some(limit),
            offset,
        }
    }

    /// True if the fetched items are appended to the cached list.
    pub fn appends(&self) -> bool {
        self.offset > 0
    }

    /// Whether a response with `returned` items suggests further pages.
    pub fn has_more(&self, returned: usize) -> bool {
        self.limit.is_some_and(|limit| returned >= limit)
    }
}

/// Fetches raw payloads for a domain.
///
/// Implementations own headers, retries, timeouts and connection pooling.
/// Failures must be reported as [`TransportError`] with the HTTP status when
/// a response was received, so the cache can classify them.
#[async_trait]
pub trait Transport<D: Domain>: Send + Sync {
    async fn fetch(&self, key: ResourceKey, page: PageRequest) -> Result<D::Raw, TransportError>;
}
