//! Transient user-facing notifications.
//!
//! Inject an [`Arc<dyn Notifier>`] into [`crate::session::Session`] to receive
//! the short success/error messages a UI shows as toasts. The library never
//! prints anything itself: a terminal shell prints a coloured line, a GUI
//! pops a toast, a test records the events.
//!
//! # Example
//!
//! ```rust
//! use edgequake_askpdf::{Notification, Notifier};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct CountingNotifier {
//!     errors: AtomicUsize,
//! }
//!
//! impl Notifier for CountingNotifier {
//!     fn notify(&self, notification: Notification) {
//!         if notification.is_error() {
//!             self.errors.fetch_add(1, Ordering::SeqCst);
//!         }
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Error,
}

/// A single transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }
}

/// Receives notifications from a [`crate::session::Session`].
///
/// Implementations must be `Send + Sync`: upload and ask may complete on
/// different tasks.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Discards every notification. The default when none is configured.
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _notification: Notification) {}
}

/// Keeps every notification in memory, in arrival order.
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    events: Mutex<Vec<Notification>>,
}

impl CollectingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Snapshot of everything received so far.
    pub fn events(&self) -> Vec<Notification> {
        self.events
            .lock()
            .map(|e| e.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, notification: Notification) {
        if let Ok(mut events) = self.events.lock() {
            events.push(notification);
        }
    }
}

/// Convenience alias matching the type stored in [`crate::session::Session`].
pub type SharedNotifier = Arc<dyn Notifier>;
