//! In-process adapters.
//!
//! Both adapters keep their state behind a `tokio` mutex and are suitable for
//! tests and short-lived tools that do not need durable storage.

mod product_repository;
mod reminder_queue;

pub use product_repository::InMemoryProductRepository;
pub use reminder_queue::InMemoryReminderQueue;
