//! Notification adapters.
//!
//! The terminal build has no system tray, so notifications are emitted as
//! structured `tracing` events on a dedicated target.

use tracing::info;

use crate::domain::ports::{Notification, NotificationSink, TapTarget};

/// `tracing` target used for posted notifications.
pub const NOTIFICATION_TARGET: &str = "food_tracker::notification";

/// [`NotificationSink`] that logs each notification as one event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotificationSink;

impl NotificationSink for TracingNotificationSink {
    fn post(&self, notification: &Notification) {
        let tap_target = match notification.tap_target {
            TapTarget::MainView => "main_view",
        };
        info!(
            target: NOTIFICATION_TARGET,
            channel_id = notification.channel.id,
            channel_name = notification.channel.name,
            title = %notification.title,
            body = %notification.body,
            tap_target,
            "notification"
        );
    }
}
