//! Domain port describing the durable one-shot reminder queue.
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{ReminderKey, ReminderPayload};

use super::define_port_error;

define_port_error! {
    /// Errors surfaced by the reminder queue adapter.
    pub enum ReminderQueueError {
        /// Queue infrastructure is unavailable.
        Unavailable { message: String } => "reminder queue is unavailable: {message}",
        /// The entry could not be persisted or acknowledged.
        Rejected { message: String } => "reminder was rejected: {message}",
    }
}

/// A reminder waiting in the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReminder {
    /// Unique key.
    pub key: ReminderKey,
    /// Payload captured at schedule time.
    pub payload: ReminderPayload,
    /// Instant the reminder becomes due.
    pub fire_at: DateTime<Utc>,
}

/// Durable scheduler for one-shot reminders.
///
/// Entries outlive the process that scheduled them; a dispatcher drains due
/// entries with [`ReminderQueue::take_due`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReminderQueue: Send + Sync {
    /// Schedule `payload` to fire after `delay`, replacing any pending entry
    /// with the same key.
    async fn schedule_once(
        &self,
        key: &ReminderKey,
        payload: &ReminderPayload,
        delay: Duration,
    ) -> Result<(), ReminderQueueError>;

    /// Drop the pending entry for `key`; `false` when nothing was pending.
    async fn cancel(&self, key: &ReminderKey) -> Result<bool, ReminderQueueError>;

    /// All pending entries, soonest first.
    async fn pending(&self) -> Result<Vec<PendingReminder>, ReminderQueueError>;

    /// Remove and return up to `limit` entries due at or before `now`,
    /// soonest first.
    ///
    /// Returned entries are gone from the queue; callers own their delivery.
    async fn take_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<PendingReminder>, ReminderQueueError>;
}
