//! Driven port for posting user-visible notifications.

/// Identifier of the channel expiry reminders are posted on.
pub const EXPIRY_CHANNEL_ID: &str = "VERBOSE_NOTIFICATION";
/// Display name of the expiry reminder channel.
pub const EXPIRY_CHANNEL_NAME: &str = "Expiration Reminders";
/// Description shown alongside the channel in system settings.
pub const EXPIRY_CHANNEL_DESCRIPTION: &str = "Shows reminders about soon-to-expire products";

/// Where tapping the notification takes the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapTarget {
    /// The application's main product view.
    MainView,
}

/// Notification channel metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationChannel {
    /// Stable channel identifier.
    pub id: &'static str,
    /// Name shown in notification settings.
    pub name: &'static str,
    /// Description shown in notification settings.
    pub description: &'static str,
}

impl NotificationChannel {
    /// Channel used for expiry reminders.
    pub const EXPIRY_REMINDERS: Self = Self {
        id: EXPIRY_CHANNEL_ID,
        name: EXPIRY_CHANNEL_NAME,
        description: EXPIRY_CHANNEL_DESCRIPTION,
    };
}

/// A rendered notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Channel the notification is posted on.
    pub channel: NotificationChannel,
    /// Headline text.
    pub title: String,
    /// Body text.
    pub body: String,
    /// Tap destination.
    pub tap_target: TapTarget,
}

/// Port for the platform notification surface.
///
/// Posting is fire-and-forget; adapters log their own failures.
#[cfg_attr(test, mockall::automock)]
pub trait NotificationSink: Send + Sync {
    /// Show `notification` to the user.
    fn post(&self, notification: &Notification);
}
