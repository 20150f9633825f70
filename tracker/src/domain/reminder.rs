//! Expiry reminder model and the lead-time arithmetic behind it.

use std::fmt;
use std::time::Duration;

use chrono::{NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};

use super::expiry_dates::{days_until, format_remaining};
use super::product::{Product, ProductId, ProductName, Quantity};

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// How long before expiry a reminder fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadTime {
    /// One day before expiry.
    OneDay,
    /// One week before expiry.
    OneWeek,
}

impl LeadTime {
    /// Every lead time scheduled for an at-home product.
    pub const ALL: [Self; 2] = [Self::OneDay, Self::OneWeek];

    /// Length of the lead time.
    pub fn span(self) -> TimeDelta {
        match self {
            Self::OneDay => TimeDelta::days(1),
            Self::OneWeek => TimeDelta::days(7),
        }
    }

    /// Stable discriminator used in reminder keys.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneDay => "one_day",
            Self::OneWeek => "one_week",
        }
    }
}

impl fmt::Display for LeadTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deterministic identity of one scheduled reminder.
///
/// Two reminders for the same lead time, product id, name and expiry date
/// share a key, so scheduling again replaces the pending entry instead of
/// adding a second one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReminderKey(String);

impl ReminderKey {
    /// Derive the key from its components.
    ///
    /// # Examples
    /// ```
    /// use chrono::NaiveDate;
    /// use food_tracker::domain::{LeadTime, ProductId, ProductName, ReminderKey};
    ///
    /// let key = ReminderKey::new(
    ///     LeadTime::OneWeek,
    ///     ProductId::new(4).expect("id"),
    ///     &ProductName::new("Sauce").expect("name"),
    ///     NaiveDate::from_ymd_opt(2025, 8, 5).expect("date"),
    /// );
    /// assert_eq!(key.as_str(), "one_week:4:Sauce:2025-08-05");
    /// ```
    pub fn new(
        lead_time: LeadTime,
        product_id: ProductId,
        product_name: &ProductName,
        expiry_date: NaiveDate,
    ) -> Self {
        Self(format!(
            "{lead_time}:{product_id}:{product_name}:{}",
            expiry_date.format("%Y-%m-%d")
        ))
    }

    /// Rebuild a key read back from storage.
    pub fn from_persisted(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrow the rendered key.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ReminderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Self-contained data a reminder needs when it fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderPayload {
    /// Product display name at schedule time.
    pub product_name: String,
    /// Quantity at schedule time.
    pub quantity: u32,
    /// Remaining-time text such as `"7 days"`.
    pub eta: String,
}

/// Fully computed reminder ready to hand to the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderPlan {
    /// Replace-on-conflict identity.
    pub key: ReminderKey,
    /// Lead time this plan represents.
    pub lead_time: LeadTime,
    /// Data captured for the notification.
    pub payload: ReminderPayload,
    /// Delay from now until the reminder fires; zero when clamped.
    pub initial_delay: Duration,
    /// `true` when the natural reminder date had already passed.
    pub clamped: bool,
}

impl ReminderPlan {
    /// Compute the reminder for a product that expires on `expiry_date`.
    ///
    /// The reminder date is `expiry_date - lead_time`. When that date is
    /// still ahead of `today` the reminder fires then and reports the nominal
    /// lead time; otherwise it fires immediately and reports the time that is
    /// actually left until expiry.
    pub fn compute(
        product_id: ProductId,
        name: &ProductName,
        quantity: Quantity,
        expiry_date: NaiveDate,
        lead_time: LeadTime,
        today: NaiveDate,
    ) -> Self {
        let reminder_date = expiry_date - lead_time.span();
        let delay_days = days_until(today, reminder_date);
        let clamped = delay_days <= 0;

        let (initial_delay, eta) = if clamped {
            let remaining = TimeDelta::days(days_until(today, expiry_date));
            (Duration::ZERO, format_remaining(remaining))
        } else {
            let days = u64::try_from(delay_days).unwrap_or(u64::MAX / SECONDS_PER_DAY);
            (
                Duration::from_secs(days.saturating_mul(SECONDS_PER_DAY)),
                format_remaining(lead_time.span()),
            )
        };

        Self {
            key: ReminderKey::new(lead_time, product_id, name, expiry_date),
            lead_time,
            payload: ReminderPayload {
                product_name: name.as_str().to_owned(),
                quantity: quantity.get(),
                eta,
            },
            initial_delay,
            clamped,
        }
    }

    /// Compute the reminder for a stored product; `None` without an expiry date.
    pub fn for_product(product: &Product, lead_time: LeadTime, today: NaiveDate) -> Option<Self> {
        let expiry_date = product.expiry_date()?;
        Some(Self::compute(
            product.id(),
            product.name(),
            product.quantity(),
            expiry_date,
            lead_time,
            today,
        ))
    }
}
