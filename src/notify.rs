// User-facing notifications.
//
// The controller reports capability, permission, and recognition failures
// as notifications; nothing is rendered here. Consumers (the dashboard,
// the SSE endpoint) subscribe and present them however they like.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::warn;

/// Category of a user-facing notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// The host has no speech recognition capability
    BrowserUnsupported,
    /// The microphone permission request was refused
    PermissionDenied,
    /// The recognition engine failed to start or failed mid-session
    RecognitionError,
}

/// User-facing notification published by the controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl Notification {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            at: Utc::now(),
        }
    }
}

/// Broadcast fan-out for notifications.
///
/// Publishing never fails: a send with no subscribers drops the
/// notification, and repeated failures each publish afresh (no dedup).
#[derive(Debug, Clone)]
pub struct NotificationHub {
    tx: broadcast::Sender<Notification>,
}

impl NotificationHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish a notification to all current subscribers
    pub fn publish(&self, kind: NotificationKind, message: impl Into<String>) {
        let notification = Notification::new(kind, message);
        warn!(
            "Notification ({:?}): {}",
            notification.kind, notification.message
        );
        let _ = self.tx.send(notification);
    }

    /// Subscribe to notifications published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new(32)
    }
}
