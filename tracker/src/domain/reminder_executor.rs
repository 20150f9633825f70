//! Renders due reminders into notifications.
//!
//! The executor only ever sees the payload captured at schedule time; it
//! never reads the product store, so a reminder fires with the data the user
//! had when it was scheduled even if the product changed since.

use std::sync::Arc;

use tracing::info;

use crate::domain::ReminderPayload;
use crate::domain::ports::{Notification, NotificationChannel, NotificationSink, TapTarget};

/// Build the notification for `payload`.
///
/// # Examples
/// ```
/// use food_tracker::domain::{ReminderPayload, render_notification};
///
/// let notification = render_notification(&ReminderPayload {
///     product_name: "Soda".to_owned(),
///     quantity: 3,
///     eta: "7 days".to_owned(),
/// });
/// assert_eq!(notification.title, "You have 3 Soda left!");
/// assert_eq!(notification.body, "Expiring in 7 days");
/// ```
pub fn render_notification(payload: &ReminderPayload) -> Notification {
    Notification {
        channel: NotificationChannel::EXPIRY_REMINDERS,
        title: format!("You have {} {} left!", payload.quantity, payload.product_name),
        body: format!("Expiring in {}", payload.eta),
        tap_target: TapTarget::MainView,
    }
}

/// Posts rendered reminders to a [`NotificationSink`].
#[derive(Clone)]
pub struct ReminderExecutor {
    sink: Arc<dyn NotificationSink>,
}

impl ReminderExecutor {
    /// Build an executor posting to `sink`.
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    /// Fire one reminder. Always succeeds.
    pub fn execute(&self, payload: &ReminderPayload) -> Notification {
        let notification = render_notification(payload);
        self.sink.post(&notification);
        info!(
            product = %payload.product_name,
            eta = %payload.eta,
            channel = notification.channel.id,
            "expiry reminder posted"
        );
        notification
    }
}
