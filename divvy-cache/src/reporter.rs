//! Reporter collaborator: the side channel for classified failures.

use divvy_core::{LoadError, ResourceKey};
use std::sync::Arc;
use tokio::sync::watch;

/// One classified failure.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorReport {
    /// Domain of the cache that failed.
    pub domain: &'static str,
    /// `None` when the key itself was rejected.
    pub key: Option<ResourceKey>,
    /// The user-visible message.
    pub message: String,
    /// The classified error, carrying the unredacted transport failure.
    pub details: LoadError,
}

/// Receives failures and successes from cache instances.
///
/// `report_error` is called exactly once per classified failure and
/// `clear_error` once per successful commit. Both are called without any
/// cache lock held.
pub trait Reporter: Send + Sync {
    fn report_error(&self, report: &ErrorReport);

    fn clear_error(&self);
}

/// Logs failures through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report_error(&self, report: &ErrorReport) {
        match report.details.details() {
            Some(transport) => tracing::error!(
                domain = report.domain,
                key = ?report.key.map(ResourceKey::get),
                kind = ?report.details.kind(),
                status = ?transport.status,
                error = %transport,
                "{}",
                report.message
            ),
            None => tracing::error!(
                domain = report.domain,
                kind = ?report.details.kind(),
                "{}",
                report.message
            ),
        }
    }

    fn clear_error(&self) {}
}

/// The shared, user-visible last-error signal.
///
/// Clones observe the same value; share one signal between caches to get a
/// single error banner.
#[derive(Debug, Clone)]
pub struct ErrorSignal {
    sender: Arc<watch::Sender<Option<String>>>,
}

impl Default for ErrorSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorSignal {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// The current message, if an error is showing.
    pub fn current(&self) -> Option<String> {
        self.sender.borrow().clone()
    }

    /// Watch the signal for changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.sender.subscribe()
    }

    /// Dismiss the current message.
    pub fn dismiss(&self) {
        self.sender.send_replace(None);
    }
}

impl Reporter for ErrorSignal {
    fn report_error(&self, report: &ErrorReport) {
        self.sender.send_replace(Some(report.message.clone()));
    }

    fn clear_error(&self) {
        self.sender.send_if_modified(|current| current.take().is_some());
    }
}

/// Forwards every call to each inner reporter, in order.
#[derive(Clone, Default)]
pub struct FanoutReporter {
    reporters: Vec<Arc<dyn Reporter>>,
}

impl FanoutReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a reporter.
    pub fn with(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporters.push(reporter);
        self
    }

    pub fn len(&self) -> usize {
        self.reporters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reporters.is_empty()
    }
}

impl std::fmt::Debug for FanoutReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanoutReporter")
            .field("reporters", &self.reporters.len())
            .finish()
    }
}

impl Reporter for FanoutReporter {
    fn report_error(&self, report: &ErrorReport) {
        for reporter in &self.reporters {
            reporter.report_error(report);
        }
    }

    fn clear_error(&self) {
        for reporter in &self.reporters {
            reporter.clear_error();
        }
    }
}
