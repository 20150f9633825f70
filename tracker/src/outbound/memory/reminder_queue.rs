//! Process-local reminder queue.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use tokio::sync::Mutex;

use crate::domain::ports::{PendingReminder, ReminderQueue, ReminderQueueError};
use crate::domain::{ReminderKey, ReminderPayload};

/// In-memory [`ReminderQueue`] keyed by [`ReminderKey`].
///
/// Entries do not survive the process; use the Diesel queue for durability.
pub struct InMemoryReminderQueue {
    clock: Arc<dyn Clock>,
    entries: Mutex<BTreeMap<ReminderKey, PendingReminder>>,
}

impl InMemoryReminderQueue {
    /// Empty queue reading "now" from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: Mutex::new(BTreeMap::new()),
        }
    }
}

fn soonest_first(mut entries: Vec<PendingReminder>) -> Vec<PendingReminder> {
    entries.sort_by(|left, right| {
        left.fire_at
            .cmp(&right.fire_at)
            .then_with(|| left.key.cmp(&right.key))
    });
    entries
}

#[async_trait]
impl ReminderQueue for InMemoryReminderQueue {
    async fn schedule_once(
        &self,
        key: &ReminderKey,
        payload: &ReminderPayload,
        delay: Duration,
    ) -> Result<(), ReminderQueueError> {
        let delay = TimeDelta::from_std(delay)
            .map_err(|err| ReminderQueueError::rejected(format!("delay out of range: {err}")))?;
        let fire_at = self
            .clock
            .utc()
            .checked_add_signed(delay)
            .ok_or_else(|| ReminderQueueError::rejected("fire time out of range"))?;

        self.entries.lock().await.insert(
            key.clone(),
            PendingReminder {
                key: key.clone(),
                payload: payload.clone(),
                fire_at,
            },
        );
        Ok(())
    }

    async fn cancel(&self, key: &ReminderKey) -> Result<bool, ReminderQueueError> {
        Ok(self.entries.lock().await.remove(key).is_some())
    }

    async fn pending(&self) -> Result<Vec<PendingReminder>, ReminderQueueError> {
        let entries = self.entries.lock().await;
        Ok(soonest_first(entries.values().cloned().collect()))
    }

    async fn take_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<PendingReminder>, ReminderQueueError> {
        let mut entries = self.entries.lock().await;
        let due = soonest_first(
            entries
                .values()
                .filter(|entry| entry.fire_at <= now)
                .cloned()
                .collect(),
        );
        let taken: Vec<PendingReminder> = due.into_iter().take(limit).collect();
        for entry in &taken {
            entries.remove(&entry.key);
        }
        Ok(taken)
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;
    use crate::test_support::MutableClock;

    fn payload(eta: &str) -> ReminderPayload {
        ReminderPayload {
            product_name: "Soda".to_owned(),
            quantity: 3,
            eta: eta.to_owned(),
        }
    }

    #[fixture]
    fn clock() -> Arc<MutableClock> {
        Arc::new(MutableClock::at_noon(2025, 6, 1))
    }

    #[rstest]
    #[tokio::test]
    async fn same_key_replaces_pending_entry(clock: Arc<MutableClock>) {
        let queue = InMemoryReminderQueue::new(clock);
        let key = ReminderKey::from_persisted("one_day:1:Soda:2025-06-30");

        queue
            .schedule_once(&key, &payload("1 day"), Duration::from_secs(60))
            .await
            .expect("schedule");
        queue
            .schedule_once(&key, &payload("0 days"), Duration::ZERO)
            .await
            .expect("reschedule");

        let pending = queue.pending().await.expect("pending");
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].payload.eta, "0 days");
    }

    #[rstest]
    #[tokio::test]
    async fn take_due_drains_only_due_entries(clock: Arc<MutableClock>) {
        let queue = InMemoryReminderQueue::new(Arc::clone(&clock) as Arc<dyn Clock>);
        let now_key = ReminderKey::from_persisted("now");
        let later_key = ReminderKey::from_persisted("later");
        queue
            .schedule_once(&later_key, &payload("7 days"), Duration::from_secs(3_600))
            .await
            .expect("schedule later");
        queue
            .schedule_once(&now_key, &payload("1 day"), Duration::ZERO)
            .await
            .expect("schedule now");

        let due = queue.take_due(clock.utc(), 10).await.expect("take due");

        assert_eq!(due.len(), 1);
        assert_eq!(due[0].key, now_key);
        let remaining = queue.pending().await.expect("pending");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].key, later_key);
    }

    #[rstest]
    #[tokio::test]
    async fn take_due_honours_limit(clock: Arc<MutableClock>) {
        let queue = InMemoryReminderQueue::new(Arc::clone(&clock) as Arc<dyn Clock>);
        for name in ["a", "b", "c"] {
            queue
                .schedule_once(&ReminderKey::from_persisted(name), &payload("1 day"), Duration::ZERO)
                .await
                .expect("schedule");
        }

        let first = queue.take_due(clock.utc(), 2).await.expect("take due");
        let rest = queue.take_due(clock.utc(), 2).await.expect("take due");

        assert_eq!(first.len(), 2);
        assert_eq!(rest.len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn cancel_reports_whether_anything_was_pending(clock: Arc<MutableClock>) {
        let queue = InMemoryReminderQueue::new(clock);
        let key = ReminderKey::from_persisted("one_week:1:Soda:2025-06-30");
        queue
            .schedule_once(&key, &payload("7 days"), Duration::ZERO)
            .await
            .expect("schedule");

        assert!(queue.cancel(&key).await.expect("cancel"));
        assert!(!queue.cancel(&key).await.expect("cancel again"));
    }
}
