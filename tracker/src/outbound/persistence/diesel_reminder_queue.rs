//! PostgreSQL-backed durable reminder queue.
//!
//! Each pending reminder is one `reminder_jobs` row keyed by its deterministic
//! reminder key, so scheduling an existing key replaces the row in place.
//!
//! Claiming due rows deletes them in the same statement. Nothing is left to
//! acknowledge afterwards, which makes delivery at-most-once: a crash after
//! the claim drops those reminders.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Timestamptz};
use diesel_async::RunQueryDsl;
use mockable::Clock;

use crate::domain::ports::{PendingReminder, ReminderQueue, ReminderQueueError};
use crate::domain::{ReminderKey, ReminderPayload};

use super::diesel_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{NewReminderJobRow, ReminderJobRow, ReminderJobUpdate};
use super::pool::{DbPool, PoolError};
use super::schema::reminder_jobs;

/// Claims and deletes due rows in one statement; concurrent dispatchers skip
/// rows another transaction already holds.
const TAKE_DUE_JOBS: &str = "DELETE FROM reminder_jobs WHERE job_key IN (\
     SELECT job_key FROM reminder_jobs WHERE fire_at <= $1 \
     ORDER BY fire_at, job_key LIMIT $2 FOR UPDATE SKIP LOCKED) \
     RETURNING job_key, product_name, quantity, eta, fire_at";

/// Diesel-backed implementation of the reminder queue port.
#[derive(Clone)]
pub struct DieselReminderQueue {
    pool: DbPool,
    clock: Arc<dyn Clock>,
}

impl DieselReminderQueue {
    /// Create a queue reading "now" from `clock` when computing fire times.
    pub fn new(pool: DbPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }
}

fn map_pool_error(error: PoolError) -> ReminderQueueError {
    map_basic_pool_error(error, ReminderQueueError::unavailable)
}

fn map_diesel_error(error: diesel::result::Error) -> ReminderQueueError {
    map_basic_diesel_error(
        error,
        ReminderQueueError::rejected,
        ReminderQueueError::unavailable,
    )
}

fn fire_time(now: DateTime<Utc>, delay: Duration) -> Result<DateTime<Utc>, ReminderQueueError> {
    let delay = TimeDelta::from_std(delay)
        .map_err(|err| ReminderQueueError::rejected(format!("delay out of range: {err}")))?;
    now.checked_add_signed(delay)
        .ok_or_else(|| ReminderQueueError::rejected("fire time out of range"))
}

fn row_to_pending(row: ReminderJobRow) -> Result<PendingReminder, ReminderQueueError> {
    let ReminderJobRow {
        job_key,
        product_name,
        quantity,
        eta,
        fire_at,
    } = row;
    let quantity = u32::try_from(quantity).map_err(|_| {
        ReminderQueueError::rejected(format!("reminder {job_key} has a negative quantity"))
    })?;
    Ok(PendingReminder {
        key: ReminderKey::from_persisted(job_key),
        payload: ReminderPayload {
            product_name,
            quantity,
            eta,
        },
        fire_at,
    })
}

fn rows_to_pending(rows: Vec<ReminderJobRow>) -> Result<Vec<PendingReminder>, ReminderQueueError> {
    let mut pending = rows
        .into_iter()
        .map(row_to_pending)
        .collect::<Result<Vec<_>, _>>()?;
    pending.sort_by(|left, right| {
        left.fire_at
            .cmp(&right.fire_at)
            .then_with(|| left.key.cmp(&right.key))
    });
    Ok(pending)
}

#[async_trait]
impl ReminderQueue for DieselReminderQueue {
    async fn schedule_once(
        &self,
        key: &ReminderKey,
        payload: &ReminderPayload,
        delay: Duration,
    ) -> Result<(), ReminderQueueError> {
        let fire_at = fire_time(self.clock.utc(), delay)?;
        let quantity = i32::try_from(payload.quantity)
            .map_err(|_| ReminderQueueError::rejected("quantity exceeds the column range"))?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = NewReminderJobRow {
            job_key: key.as_str(),
            product_name: &payload.product_name,
            quantity,
            eta: &payload.eta,
            fire_at,
        };
        let update = ReminderJobUpdate {
            product_name: &payload.product_name,
            quantity,
            eta: &payload.eta,
            fire_at,
        };

        diesel::insert_into(reminder_jobs::table)
            .values(&row)
            .on_conflict(reminder_jobs::job_key)
            .do_update()
            .set(&update)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(())
    }

    async fn cancel(&self, key: &ReminderKey) -> Result<bool, ReminderQueueError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted =
            diesel::delete(reminder_jobs::table.filter(reminder_jobs::job_key.eq(key.as_str())))
                .execute(&mut conn)
                .await
                .map_err(map_diesel_error)?;

        Ok(deleted > 0)
    }

    async fn pending(&self) -> Result<Vec<PendingReminder>, ReminderQueueError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<ReminderJobRow> = reminder_jobs::table
            .order((reminder_jobs::fire_at.asc(), reminder_jobs::job_key.asc()))
            .select(ReminderJobRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows_to_pending(rows)
    }

    async fn take_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<PendingReminder>, ReminderQueueError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<ReminderJobRow> = diesel::sql_query(TAKE_DUE_JOBS)
            .bind::<Timestamptz, _>(now)
            .bind::<BigInt, _>(limit)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        // RETURNING does not preserve the subquery order.
        rows_to_pending(rows)
    }
}
