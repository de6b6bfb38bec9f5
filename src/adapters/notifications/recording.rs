//! Recording notifier for tests.
//!
//! # Panics
//!
//! Methods may panic if the internal lock is poisoned. Test use only.

use std::sync::Mutex;

use crate::ports::{Notification, Notifier};

/// Captures every notification for later assertions.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// All notifications so far, oldest first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .expect("RecordingNotifier: lock poisoned")
            .clone()
    }

    /// Titles only, oldest first.
    pub fn titles(&self) -> Vec<String> {
        self.notifications().into_iter().map(|n| n.title).collect()
    }

    pub fn count(&self) -> usize {
        self.notifications
            .lock()
            .expect("RecordingNotifier: lock poisoned")
            .len()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.notifications
            .lock()
            .expect("RecordingNotifier: lock poisoned")
            .push(notification);
    }
}
