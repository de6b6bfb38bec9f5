//! Notifier that writes notifications to the log.
//!
//! Used by the headless console binary, where there is no toast surface.

use crate::ports::{Notification, NotificationLevel, Notifier};

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl TracingNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Error => tracing::warn!(
                title = %notification.title,
                "{}",
                notification.description
            ),
            level => tracing::info!(
                level = %level,
                title = %notification.title,
                "{}",
                notification.description
            ),
        }
    }
}
