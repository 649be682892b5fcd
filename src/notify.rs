//! User-visible transient notifications

use chrono::{DateTime, Duration, Utc};
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

/// How a notification should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Neutral information
    Default,
    /// Something failed
    Destructive,
}

/// A transient, auto-dismissed message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub severity: Severity,
}

impl Notification {
    pub fn info(title: &str, body: &str) -> Self {
        Self {
            title: title.to_string(),
            body: body.to_string(),
            severity: Severity::Default,
        }
    }

    pub fn error(title: &str, body: &str) -> Self {
        Self {
            title: title.to_string(),
            body: body.to_string(),
            severity: Severity::Destructive,
        }
    }
}

/// Surface for user-visible messages. Must not block.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// A notification currently on screen
#[derive(Debug, Clone)]
pub struct Toast {
    pub id: Uuid,
    pub notification: Notification,
    pub expires_at: DateTime<Utc>,
}

/// In-memory notifier that keeps toasts until dismissed or expired
#[derive(Debug)]
pub struct ToastQueue {
    duration: Duration,
    toasts: Mutex<Vec<Toast>>,
}

impl ToastQueue {
    pub fn new(duration: std::time::Duration) -> Self {
        Self {
            duration: Duration::from_std(duration).unwrap_or_else(|_| Duration::seconds(5)),
            toasts: Mutex::new(Vec::new()),
        }
    }

    /// Show a notification at `now`, returning its id. Toasts expired by
    /// `now` are dropped.
    pub fn push_at(&self, notification: Notification, now: DateTime<Utc>) -> Uuid {
        let id = Uuid::new_v4();
        let mut toasts = self.toasts.lock().unwrap_or_else(PoisonError::into_inner);
        toasts.retain(|t| t.expires_at > now);
        toasts.push(Toast {
            id,
            notification,
            expires_at: now + self.duration,
        });
        id
    }

    /// Remove a toast before it expires
    pub fn dismiss(&self, id: Uuid) -> bool {
        let mut toasts = self.toasts.lock().unwrap_or_else(PoisonError::into_inner);
        let before = toasts.len();
        toasts.retain(|t| t.id != id);
        toasts.len() != before
    }

    /// Toasts still visible at `now`; expired ones are dropped
    pub fn active(&self, now: DateTime<Utc>) -> Vec<Toast> {
        let mut toasts = self.toasts.lock().unwrap_or_else(PoisonError::into_inner);
        toasts.retain(|t| t.expires_at > now);
        toasts.clone()
    }
}

impl Notifier for ToastQueue {
    fn notify(&self, notification: Notification) {
        log::debug!("toast: {} - {}", notification.title, notification.body);
        self.push_at(notification, Utc::now());
    }
}
