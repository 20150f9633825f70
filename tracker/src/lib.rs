//! Grocery tracking core.
//!
//! Products live in a persistent store with live queries; expiry reminders are
//! computed from each product's expiry date and handed to a durable queue that
//! a dispatcher drains into user notifications. [`domain::PantryService`]
//! keeps the two in step.

pub mod config;
pub mod domain;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::TrackerSettings;
