//! Calendar helpers for expiry dates.
//!
//! All arithmetic is on calendar dates; "today" always comes from an injected
//! [`Clock`] so callers stay deterministic under test.

use std::sync::OnceLock;

use chrono::{DateTime, Days, NaiveDate, TimeDelta};
use mockable::Clock;
use regex::Regex;

use super::product::ProductValidationError;

const ISO_FORMAT: &str = "%Y-%m-%d";

static ISO_DATE_RE: OnceLock<Regex> = OnceLock::new();
static DAY_FIRST_DATE_RE: OnceLock<Regex> = OnceLock::new();

fn iso_date_regex() -> &'static Regex {
    ISO_DATE_RE.get_or_init(|| {
        Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b")
            .unwrap_or_else(|error| panic!("ISO date regex failed to compile: {error}"))
    })
}

fn day_first_date_regex() -> &'static Regex {
    DAY_FIRST_DATE_RE.get_or_init(|| {
        Regex::new(r"\b(\d{1,2})[./](\d{1,2})[./](\d{4}|\d{2})\b")
            .unwrap_or_else(|error| panic!("day-first date regex failed to compile: {error}"))
    })
}

/// Parse a strict ISO `YYYY-MM-DD` date; blank input means "no expiry".
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use food_tracker::domain::parse_expiry_date;
///
/// assert_eq!(
///     parse_expiry_date("2025-06-30").expect("valid"),
///     NaiveDate::from_ymd_opt(2025, 6, 30)
/// );
/// assert_eq!(parse_expiry_date("").expect("blank"), None);
/// assert!(parse_expiry_date("30.06.2025").is_err());
/// ```
pub fn parse_expiry_date(raw: &str) -> Result<Option<NaiveDate>, ProductValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if !iso_date_regex().is_match(trimmed) || trimmed.len() != 10 {
        return Err(ProductValidationError::InvalidExpiryDate {
            raw: raw.to_owned(),
        });
    }
    NaiveDate::parse_from_str(trimmed, ISO_FORMAT)
        .map(Some)
        .map_err(|_| ProductValidationError::InvalidExpiryDate {
            raw: raw.to_owned(),
        })
}

/// Find the first plausible date in free text, such as recognised label text.
///
/// Accepts `YYYY-MM-DD`, `DD.MM.YYYY`, `DD/MM/YYYY` and `DD/MM/YY` (two-digit
/// years map to 20YY). Candidates that are not real calendar dates are
/// skipped.
pub fn extract_expiry_date(text: &str) -> Option<NaiveDate> {
    let iso = iso_date_regex().captures_iter(text).filter_map(|caps| {
        let start = caps.get(0)?.start();
        let date = NaiveDate::from_ymd_opt(
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
        )?;
        Some((start, date))
    });
    let day_first = day_first_date_regex().captures_iter(text).filter_map(|caps| {
        let start = caps.get(0)?.start();
        let raw_year = &caps[3];
        let year: i32 = raw_year.parse().ok()?;
        let year = if raw_year.len() == 2 { 2000 + year } else { year };
        let date = NaiveDate::from_ymd_opt(year, caps[2].parse().ok()?, caps[1].parse().ok()?)?;
        Some((start, date))
    });

    iso.chain(day_first)
        .min_by_key(|(start, _)| *start)
        .map(|(_, date)| date)
}

/// Shift `date` forward by whole weeks; `None` on calendar overflow.
pub fn add_weeks(date: NaiveDate, weeks: u32) -> Option<NaiveDate> {
    date.checked_add_days(Days::new(u64::from(weeks) * 7))
}

/// Calendar date for a date-picker timestamp.
///
/// Pickers report midnight UTC of the chosen day, so the conversion is done
/// in UTC. A missing or out-of-range value falls back to today.
pub fn date_from_epoch_millis(millis: Option<i64>, clock: &dyn Clock) -> NaiveDate {
    millis
        .and_then(DateTime::from_timestamp_millis)
        .map(|instant| instant.date_naive())
        .unwrap_or_else(|| today(clock))
}

/// Local calendar date according to `clock`.
pub fn today(clock: &dyn Clock) -> NaiveDate {
    clock.local().date_naive()
}

/// Signed number of whole days from `from` to `to`.
pub fn days_until(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// Human-readable remaining time such as `"7 days"` or `"1 day 4 hours"`.
///
/// Negative spans are floored at zero.
///
/// # Examples
/// ```
/// use chrono::TimeDelta;
/// use food_tracker::domain::format_remaining;
///
/// assert_eq!(format_remaining(TimeDelta::days(7)), "7 days");
/// assert_eq!(format_remaining(TimeDelta::days(1)), "1 day");
/// assert_eq!(format_remaining(TimeDelta::hours(28)), "1 day 4 hours");
/// ```
pub fn format_remaining(span: TimeDelta) -> String {
    let span = span.max(TimeDelta::zero());
    let days = span.num_days();
    let hours = span.num_hours() - days * 24;
    let mut text = plural(days, "day");
    if hours > 0 {
        text.push(' ');
        text.push_str(&plural(hours, "hour"));
    }
    text
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("{count} {unit}")
    } else {
        format!("{count} {unit}s")
    }
}
