//! Fire-and-forget notification hub.
//!
//! In-memory `Mutex<Vec>` buffer in the same shape as an audit buffer:
//! cascades push, the UI polls and marks read. Entries are session-scoped
//! and never persisted. A failed push is surfaced to the caller as a
//! degraded-success warning rather than dropped silently.

use std::sync::Mutex;

use crate::models::enums::NotificationKind;
use crate::models::Notification;

/// Buffer cap: beyond this, the oldest read entries are evicted first.
const NOTIFICATION_BUFFER_CAPACITY: usize = 256;

pub struct NotificationHub {
    buffer: Mutex<Vec<Notification>>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Notification buffer lock poisoned")]
    LockPoisoned,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self {
            buffer: Mutex::new(Vec::new()),
        }
    }

    /// Push a notification. Evicts the oldest read entries when full so an
    /// unread backlog is kept as long as possible.
    pub fn push(
        &self,
        kind: NotificationKind,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<(), NotifyError> {
        let mut buf = self.buffer.lock().map_err(|_| NotifyError::LockPoisoned)?;
        if buf.len() >= NOTIFICATION_BUFFER_CAPACITY {
            if let Some(pos) = buf.iter().position(|n| n.read) {
                buf.remove(pos);
            } else {
                buf.remove(0);
            }
        }
        buf.push(Notification::new(kind, title, body));
        Ok(())
    }

    /// Snapshot of all buffered notifications, newest last.
    pub fn entries(&self) -> Vec<Notification> {
        self.buffer
            .lock()
            .map(|buf| buf.clone())
            .unwrap_or_default()
    }

    /// Number of unread notifications.
    pub fn unread_count(&self) -> usize {
        self.buffer
            .lock()
            .map(|buf| buf.iter().filter(|n| !n.read).count())
            .unwrap_or(0)
    }

    /// Mark everything read (the UI opened the notification panel).
    pub fn mark_all_read(&self) {
        if let Ok(mut buf) = self.buffer.lock() {
            for n in buf.iter_mut() {
                n.read = true;
            }
        }
    }

    /// Drain all buffered notifications.
    pub fn drain(&self) -> Vec<Notification> {
        self.buffer
            .lock()
            .map(|mut buf| buf.drain(..).collect())
            .unwrap_or_default()
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}
