//! Transient toasts for the notification collaborator.

use std::{
    sync::{Mutex, PoisonError},
    time::Duration,
};

use shared::domain::Severity;
use tokio::time::Instant;
use tracing::debug;

use crate::view::Notifier;

pub const DEFAULT_TOAST_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub severity: Severity,
    pub raised_at: Instant,
}

/// Fire-and-forget toast sink; entries disappear once their TTL has elapsed.
#[derive(Debug)]
pub struct ToastBoard {
    ttl: Duration,
    toasts: Mutex<Vec<Toast>>,
}

impl Default for ToastBoard {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_TTL)
    }
}

impl ToastBoard {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            toasts: Mutex::new(Vec::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Visible toasts, oldest first. Expired entries are dropped on the way.
    pub fn active(&self) -> Vec<Toast> {
        let mut toasts = self.toasts.lock().unwrap_or_else(PoisonError::into_inner);
        self.prune(&mut toasts, Instant::now());
        toasts.clone()
    }

    fn prune(&self, toasts: &mut Vec<Toast>, now: Instant) {
        toasts.retain(|toast| now.duration_since(toast.raised_at) < self.ttl);
    }
}

impl Notifier for ToastBoard {
    fn notify(&self, message: &str, severity: Severity) {
        debug!(severity = severity.as_str(), "toast: raised");
        let now = Instant::now();
        let mut toasts = self.toasts.lock().unwrap_or_else(PoisonError::into_inner);
        self.prune(&mut toasts, now);
        toasts.push(Toast {
            message: message.to_string(),
            severity,
            raised_at: now,
        });
    }
}
