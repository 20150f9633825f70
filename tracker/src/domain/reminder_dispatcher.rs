//! Drains due reminders from the durable queue into the executor.
//!
//! The queue is the only state the dispatcher needs, so a restarted process
//! picks up exactly where the previous one stopped.
//!
//! Delivery is at-most-once. [`ReminderQueue::take_due`] removes the due
//! entries as it returns them, so a process that dies between the claim and
//! the post loses those reminders rather than posting them twice.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, warn};

use crate::domain::ReminderExecutor;
use crate::domain::ports::{ReminderQueue, ReminderQueueError};

/// Async sleeping abstraction so polling can be driven from tests.
#[async_trait]
pub trait ReminderSleeper: Send + Sync {
    /// Suspend the caller for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Tokio-based sleeper implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl ReminderSleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Polling behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderDispatcherConfig {
    /// Pause between polls when the last poll did not fill a batch.
    pub poll_interval: Duration,
    /// Maximum reminders taken per poll.
    pub batch_size: usize,
}

impl Default for ReminderDispatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            batch_size: 50,
        }
    }
}

/// Polls the reminder queue and fires what is due.
pub struct ReminderDispatcher {
    queue: Arc<dyn ReminderQueue>,
    executor: ReminderExecutor,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn ReminderSleeper>,
    config: ReminderDispatcherConfig,
}

impl ReminderDispatcher {
    /// Build a dispatcher that sleeps on the tokio timer between polls.
    pub fn new(
        queue: Arc<dyn ReminderQueue>,
        executor: ReminderExecutor,
        clock: Arc<dyn Clock>,
        config: ReminderDispatcherConfig,
    ) -> Self {
        Self {
            queue,
            executor,
            clock,
            sleeper: Arc::new(TokioSleeper),
            config,
        }
    }

    /// Replace the sleeper used between polls.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn ReminderSleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Fire every reminder due now, up to one batch.
    ///
    /// Returns the number of reminders fired.
    pub async fn run_once(&self) -> Result<usize, ReminderQueueError> {
        let now = self.clock.utc();
        let due = self.queue.take_due(now, self.config.batch_size).await?;
        for reminder in &due {
            debug!(key = %reminder.key, fire_at = %reminder.fire_at, "reminder due");
            self.executor.execute(&reminder.payload);
        }
        Ok(due.len())
    }

    /// Poll until `shutdown` resolves; returns the total number fired.
    ///
    /// Queue errors are logged and the next poll proceeds as normal. A full
    /// batch is followed by an immediate re-poll.
    pub async fn run_until<F>(&self, shutdown: F) -> usize
    where
        F: Future<Output = ()> + Send,
    {
        tokio::pin!(shutdown);
        let mut fired = 0;
        loop {
            let pause = match self.run_once().await {
                Ok(count) => {
                    fired += count;
                    if count >= self.config.batch_size {
                        Duration::ZERO
                    } else {
                        self.config.poll_interval
                    }
                }
                Err(error) => {
                    warn!(%error, "reminder poll failed");
                    self.config.poll_interval
                }
            };

            tokio::select! {
                biased;
                () = &mut shutdown => break,
                () = self.sleeper.sleep(pause) => {}
            }
        }
        fired
    }
}
