//! Reminder scheduler.
//!
//! Turns a stored product into queue entries, one per [`LeadTime`], and
//! cancels them again by key. All date arithmetic happens in
//! [`ReminderPlan::compute`]; this service supplies "today" from the injected
//! clock and talks to the queue.

use std::sync::Arc;

use chrono::NaiveDate;
use mockable::Clock;
use tracing::{debug, info};

use crate::domain::expiry_dates::today;
use crate::domain::ports::{ReminderQueue, ReminderQueueError};
use crate::domain::{
    Error, LeadTime, Product, ProductId, ProductName, ProductStore, ReminderKey, ReminderPlan,
};

/// Errors raised while scheduling or cancelling reminders.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReminderError {
    /// No product has the requested id.
    #[error("product {product_id} not found")]
    ProductNotFound { product_id: ProductId },
    /// The product has no expiry date, so there is nothing to remind about.
    #[error("product {product_id} has no expiry date")]
    MissingExpiryDate { product_id: ProductId },
    /// Reading the product failed.
    #[error("product lookup failed: {0}")]
    Store(#[from] Error),
    /// The queue refused the operation.
    #[error(transparent)]
    Scheduling(#[from] ReminderQueueError),
}

impl ReminderError {
    /// `true` for outcomes that simply mean there is nothing to schedule.
    pub fn is_nothing_to_schedule(&self) -> bool {
        matches!(
            self,
            Self::ProductNotFound { .. } | Self::MissingExpiryDate { .. }
        )
    }
}

/// Schedules and cancels expiry reminders.
#[derive(Clone)]
pub struct ReminderScheduler {
    store: ProductStore,
    queue: Arc<dyn ReminderQueue>,
    clock: Arc<dyn Clock>,
}

impl ReminderScheduler {
    /// Build a scheduler over the store, the queue and the clock.
    pub fn new(store: ProductStore, queue: Arc<dyn ReminderQueue>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            queue,
            clock,
        }
    }

    /// Schedule the `lead_time` reminder for the product's current state.
    ///
    /// A pending reminder with the same key is replaced.
    ///
    /// # Errors
    ///
    /// [`ReminderError::ProductNotFound`] and
    /// [`ReminderError::MissingExpiryDate`] mean there is nothing to
    /// schedule; the other variants are infrastructure failures.
    pub async fn schedule(
        &self,
        product_id: ProductId,
        lead_time: LeadTime,
    ) -> Result<ReminderPlan, ReminderError> {
        let product = self
            .store
            .get_by_id(product_id)
            .await?
            .ok_or(ReminderError::ProductNotFound { product_id })?;
        self.schedule_product(&product, lead_time).await
    }

    /// Schedule the `lead_time` reminder for an already fetched snapshot.
    pub async fn schedule_product(
        &self,
        product: &Product,
        lead_time: LeadTime,
    ) -> Result<ReminderPlan, ReminderError> {
        let plan = ReminderPlan::for_product(product, lead_time, today(self.clock.as_ref())).ok_or(
            ReminderError::MissingExpiryDate {
                product_id: product.id(),
            },
        )?;

        self.queue
            .schedule_once(&plan.key, &plan.payload, plan.initial_delay)
            .await?;

        info!(
            key = %plan.key,
            delay_secs = plan.initial_delay.as_secs(),
            clamped = plan.clamped,
            eta = %plan.payload.eta,
            "reminder scheduled"
        );
        Ok(plan)
    }

    /// Cancel the pending reminder for the given identity.
    ///
    /// Returns `false` when nothing was pending.
    pub async fn cancel(
        &self,
        product_id: ProductId,
        name: &ProductName,
        expiry_date: NaiveDate,
        lead_time: LeadTime,
    ) -> Result<bool, ReminderError> {
        let key = ReminderKey::new(lead_time, product_id, name, expiry_date);
        let cancelled = self.queue.cancel(&key).await?;
        debug!(%key, cancelled, "reminder cancel requested");
        Ok(cancelled)
    }

    /// Cancel the `lead_time` reminder keyed by a product snapshot.
    pub async fn cancel_product(
        &self,
        product: &Product,
        lead_time: LeadTime,
    ) -> Result<bool, ReminderError> {
        let expiry_date = product
            .expiry_date()
            .ok_or(ReminderError::MissingExpiryDate {
                product_id: product.id(),
            })?;
        self.cancel(product.id(), product.name(), expiry_date, lead_time)
            .await
    }
}

#[cfg(test)]
mod tests {
    //! Scheduler coverage against the in-memory queue and mocked ports.

    use std::time::Duration;

    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::ports::MockReminderQueue;
    use crate::domain::{ProductDetails, ProductDraft};
    use crate::outbound::memory::{InMemoryProductRepository, InMemoryReminderQueue};
    use crate::test_support::MutableClock;

    struct Harness {
        store: ProductStore,
        queue: Arc<InMemoryReminderQueue>,
        scheduler: ReminderScheduler,
    }

    #[fixture]
    fn harness() -> Harness {
        let clock: Arc<dyn Clock> = Arc::new(MutableClock::at_noon(2025, 6, 1));
        let store = ProductStore::new(Arc::new(InMemoryProductRepository::new()));
        let queue = Arc::new(InMemoryReminderQueue::new(Arc::clone(&clock)));
        let scheduler = ReminderScheduler::new(
            store.clone(),
            Arc::clone(&queue) as Arc<dyn ReminderQueue>,
            clock,
        );
        Harness {
            store,
            queue,
            scheduler,
        }
    }

    async fn insert(store: &ProductStore, name: &str, expiry: Option<&str>) -> ProductId {
        let details = ProductDetails::parse(name, 3, expiry, false).expect("valid details");
        store
            .insert(&ProductDraft::new(details))
            .await
            .expect("insert")
            .id()
            .expect("inserted")
    }

    #[rstest]
    #[tokio::test]
    async fn scheduling_twice_leaves_one_pending_entry(harness: Harness) {
        let id = insert(&harness.store, "Soda", Some("2025-06-30")).await;

        harness
            .scheduler
            .schedule(id, LeadTime::OneDay)
            .await
            .expect("schedule");
        harness
            .scheduler
            .schedule(id, LeadTime::OneDay)
            .await
            .expect("schedule again");

        let pending = harness.queue.pending().await.expect("pending");
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].key.as_str(), format!("one_day:{id}:Soda:2025-06-30"));
    }

    #[rstest]
    #[tokio::test]
    async fn natural_plan_delays_until_reminder_date(harness: Harness) {
        let id = insert(&harness.store, "Soda", Some("2025-06-30")).await;

        let plan = harness
            .scheduler
            .schedule(id, LeadTime::OneWeek)
            .await
            .expect("schedule");

        assert_eq!(plan.initial_delay, Duration::from_secs(22 * 86_400));
        assert_eq!(plan.payload.eta, "7 days");
    }

    #[rstest]
    #[tokio::test]
    async fn missing_product_is_typed(harness: Harness) {
        let ghost = ProductId::new(99).expect("valid id");

        let error = harness
            .scheduler
            .schedule(ghost, LeadTime::OneDay)
            .await
            .expect_err("missing product");

        assert_eq!(error, ReminderError::ProductNotFound { product_id: ghost });
        assert!(error.is_nothing_to_schedule());
    }

    #[rstest]
    #[tokio::test]
    async fn undated_product_is_typed(harness: Harness) {
        let id = insert(&harness.store, "Bread", None).await;

        let error = harness
            .scheduler
            .schedule(id, LeadTime::OneWeek)
            .await
            .expect_err("no expiry");

        assert_eq!(error, ReminderError::MissingExpiryDate { product_id: id });
        assert!(harness.queue.pending().await.expect("pending").is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn cancel_without_pending_entry_is_a_no_op(harness: Harness) {
        let id = ProductId::new(5).expect("valid id");
        let name = ProductName::new("Sauce").expect("valid name");
        let expiry = NaiveDate::from_ymd_opt(2025, 8, 5).expect("valid date");

        let cancelled = harness
            .scheduler
            .cancel(id, &name, expiry, LeadTime::OneDay)
            .await
            .expect("cancel");

        assert!(!cancelled);
    }

    #[rstest]
    #[tokio::test]
    async fn cancelling_an_undated_snapshot_is_typed(harness: Harness) {
        let id = insert(&harness.store, "Bread", None).await;
        let product = harness
            .store
            .get_by_id(id)
            .await
            .expect("lookup")
            .expect("stored");
        let mut queue = MockReminderQueue::new();
        queue.expect_cancel().times(0);
        let scheduler = ReminderScheduler::new(
            harness.store.clone(),
            Arc::new(queue),
            Arc::new(MutableClock::at_noon(2025, 6, 1)),
        );

        let error = scheduler
            .cancel_product(&product, LeadTime::OneDay)
            .await
            .expect_err("no expiry");

        assert_eq!(error, ReminderError::MissingExpiryDate { product_id: id });
    }

    #[rstest]
    #[tokio::test]
    async fn cancelling_a_snapshot_drops_its_pending_entry(harness: Harness) {
        let id = insert(&harness.store, "Soda", Some("2025-06-30")).await;
        harness
            .scheduler
            .schedule(id, LeadTime::OneWeek)
            .await
            .expect("schedule");
        let product = harness
            .store
            .get_by_id(id)
            .await
            .expect("lookup")
            .expect("stored");

        let cancelled = harness
            .scheduler
            .cancel_product(&product, LeadTime::OneWeek)
            .await
            .expect("cancel");

        assert!(cancelled);
        assert!(harness.queue.pending().await.expect("pending").is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn queue_failures_surface_as_scheduling_errors(harness: Harness) {
        let id = insert(&harness.store, "Soda", Some("2025-06-30")).await;
        let mut queue = MockReminderQueue::new();
        queue
            .expect_schedule_once()
            .times(1)
            .return_once(|_, _, _| Err(ReminderQueueError::unavailable("db down")));
        let scheduler = ReminderScheduler::new(
            harness.store.clone(),
            Arc::new(queue),
            Arc::new(MutableClock::at_noon(2025, 6, 1)),
        );

        let error = scheduler
            .schedule(id, LeadTime::OneDay)
            .await
            .expect_err("queue down");

        assert!(matches!(error, ReminderError::Scheduling(_)));
        assert!(!error.is_nothing_to_schedule());
    }
}
