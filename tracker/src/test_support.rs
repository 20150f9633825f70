//! Shared test doubles for unit tests (in `src/`) and integration tests (in
//! `tests/`). Only compiled for tests or with the `test-support` feature.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::ReminderSleeper;
use crate::domain::ports::{Notification, NotificationSink};

/// Clock that only moves when told to.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Clock reading 12:00 UTC on the given day.
    ///
    /// Noon keeps the local calendar date equal to the UTC one for every
    /// zone within twelve hours of UTC.
    pub fn at_noon(year: i32, month: u32, day: u32) -> Self {
        let now = Utc
            .with_ymd_and_hms(year, month, day, 12, 0, 0)
            .single()
            .unwrap_or_else(|| panic!("invalid clock date {year}-{month}-{day}"));
        Self::new(now)
    }

    pub fn advance(&self, delta: Duration) {
        let delta = match TimeDelta::from_std(delta) {
            Ok(delta) => delta,
            Err(error) => {
                panic!("failed to convert Duration to TimeDelta: {error}; delta={delta:?}")
            }
        };
        *self.lock_clock() += delta;
    }

    pub fn advance_days(&self, days: i64) {
        *self.lock_clock() += TimeDelta::days(days);
    }

    /// Local calendar date the clock currently reads.
    pub fn today(&self) -> NaiveDate {
        self.local().date_naive()
    }

    fn lock_clock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Sink that keeps every posted notification.
#[derive(Default)]
pub struct RecordingNotificationSink(Mutex<Vec<Notification>>);

impl RecordingNotificationSink {
    /// Notifications posted so far, oldest first.
    pub fn posted(&self) -> Vec<Notification> {
        match self.0.lock() {
            Ok(entries) => entries.clone(),
            Err(_) => panic!("sink mutex"),
        }
    }
}

impl NotificationSink for RecordingNotificationSink {
    fn post(&self, notification: &Notification) {
        match self.0.lock() {
            Ok(mut entries) => entries.push(notification.clone()),
            Err(_) => panic!("sink mutex"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateSleeper;

#[async_trait]
impl ReminderSleeper for ImmediateSleeper {
    async fn sleep(&self, _duration: Duration) {}
}
