//! Notification list for the admin client.

use chrono::{DateTime, Utc};
use divvy_cache::{ErrorReport, Reporter};
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// Notifications kept before the oldest are dropped.
pub const DEFAULT_HISTORY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
    Success,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    /// Domain of the cache that raised it, if any.
    pub source: Option<&'static str>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            source: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_source(mut self, source: &'static str) -> Self {
        self.source = Some(source);
        self
    }
}

/// Bounded history of notifications, fed by cache failures.
///
/// Successful commits do not add entries; the list is a log, the current
/// error lives in [`divvy_cache::ErrorSignal`].
#[derive(Debug)]
pub struct NotificationCenter {
    history: usize,
    entries: Mutex<VecDeque<Notification>>,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::with_history(DEFAULT_HISTORY)
    }
}

impl NotificationCenter {
    pub fn with_history(history: usize) -> Self {
        let history = history.max(1);
        Self {
            history,
            entries: Mutex::new(VecDeque::with_capacity(history)),
        }
    }

    pub fn notify(&self, notification: Notification) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.len() == self.history {
            entries.pop_front();
        }
        entries.push_back(notification);
    }

    /// Notifications, oldest first.
    pub fn all(&self) -> Vec<Notification> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn latest(&self) -> Option<Notification> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .back()
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl Reporter for NotificationCenter {
    fn report_error(&self, report: &ErrorReport) {
        let notification = Notification::new(NotificationLevel::Error, report.message.as_str())
            .with_source(report.domain);
        self.notify(notification);
    }

    fn clear_error(&self) {}
}
