//! User-facing notices
//!
//! Failures that the messaging layer absorbs (a list that failed to load, a
//! pin that failed to save) surface here as dismissible notices instead of
//! errors.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::broadcast;

use super::error::ServiceError;

/// Notices kept for late readers
const MAX_ACTIVE_NOTICES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub id: u64,
    pub level: NoticeLevel,
    pub code: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Broadcasts notices and keeps the undismissed ones
#[derive(Debug, Clone)]
pub struct NoticeCenter {
    inner: Arc<NoticeInner>,
}

#[derive(Debug)]
struct NoticeInner {
    tx: broadcast::Sender<Notice>,
    next_id: AtomicU64,
    active: Mutex<VecDeque<Notice>>,
}

impl NoticeCenter {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(NoticeInner {
                tx,
                next_id: AtomicU64::new(1),
                active: Mutex::new(VecDeque::new()),
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.inner.tx.subscribe()
    }

    pub fn info(&self, code: impl Into<String>, message: impl Into<String>) -> Notice {
        self.push(NoticeLevel::Info, code.into(), message.into())
    }

    pub fn error(&self, code: impl Into<String>, message: impl Into<String>) -> Notice {
        self.push(NoticeLevel::Error, code.into(), message.into())
    }

    /// Error notice for a failed operation, without infrastructure details
    pub fn from_error(&self, err: &ServiceError) -> Notice {
        let code = err.error_code().to_string();
        let message = if err.is_transient() {
            "Something went wrong. Please try again.".to_string()
        } else {
            err.to_string()
        };
        self.push(NoticeLevel::Error, code, message)
    }

    /// Undismissed notices, oldest first
    pub fn active(&self) -> Vec<Notice> {
        self.inner.active.lock().iter().cloned().collect()
    }

    /// Dismiss a notice; returns false when it was already gone
    pub fn dismiss(&self, id: u64) -> bool {
        let mut active = self.inner.active.lock();
        let before = active.len();
        active.retain(|n| n.id != id);
        active.len() != before
    }

    pub fn clear(&self) {
        self.inner.active.lock().clear();
    }

    fn push(&self, level: NoticeLevel, code: String, message: String) -> Notice {
        let notice = Notice {
            id: self.inner.next_id.fetch_add(1, Ordering::Relaxed),
            level,
            code,
            message,
            created_at: Utc::now(),
        };
        {
            let mut active = self.inner.active.lock();
            if active.len() == MAX_ACTIVE_NOTICES {
                active.pop_front();
            }
            active.push_back(notice.clone());
        }
        // No receivers is fine; `active` keeps it
        let _ = self.inner.tx.send(notice.clone());
        notice
    }
}

impl Default for NoticeCenter {
    fn default() -> Self {
        Self::new()
    }
}
