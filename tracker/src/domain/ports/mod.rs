//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod food_facts_source;
mod notification_sink;
mod product_repository;
mod reminder_queue;

#[cfg(test)]
pub use food_facts_source::MockFoodFactsSource;
pub use food_facts_source::{
    FixtureFoodFactsSource, FoodFactsProduct, FoodFactsSource, FoodFactsSourceError,
};
#[cfg(test)]
pub use notification_sink::MockNotificationSink;
pub use notification_sink::{
    EXPIRY_CHANNEL_DESCRIPTION, EXPIRY_CHANNEL_ID, EXPIRY_CHANNEL_NAME, Notification,
    NotificationChannel, NotificationSink, TapTarget,
};
#[cfg(test)]
pub use product_repository::MockProductRepository;
pub use product_repository::{ProductRepository, ProductRepositoryError};
#[cfg(test)]
pub use reminder_queue::MockReminderQueue;
pub use reminder_queue::{PendingReminder, ReminderQueue, ReminderQueueError};
