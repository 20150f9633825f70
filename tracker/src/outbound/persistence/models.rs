//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;

use super::schema::{products, reminder_jobs};

// ---------------------------------------------------------------------------
// Product models
// ---------------------------------------------------------------------------

/// Row struct for reading from the products table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ProductRow {
    pub id: i64,
    pub name: String,
    pub quantity: i32,
    pub expiry_date: Option<NaiveDate>,
    pub in_cart: bool,
}

/// Insertable struct letting the identity column pick the id.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = products)]
pub(crate) struct NewProductRow<'a> {
    pub name: &'a str,
    pub quantity: i32,
    pub expiry_date: Option<NaiveDate>,
    pub in_cart: bool,
}

/// Insertable struct pinning an explicit id.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = products)]
pub(crate) struct NewProductWithIdRow<'a> {
    pub id: i64,
    pub name: &'a str,
    pub quantity: i32,
    pub expiry_date: Option<NaiveDate>,
    pub in_cart: bool,
}

/// Full-row changeset; `None` clears the expiry date.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = products)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ProductChangeset<'a> {
    pub name: &'a str,
    pub quantity: i32,
    pub expiry_date: Option<NaiveDate>,
    pub in_cart: bool,
}

// ---------------------------------------------------------------------------
// Reminder job models
// ---------------------------------------------------------------------------

/// Row struct for reading from the reminder_jobs table.
#[derive(Debug, Clone, Queryable, QueryableByName, Selectable)]
#[diesel(table_name = reminder_jobs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ReminderJobRow {
    pub job_key: String,
    pub product_name: String,
    pub quantity: i32,
    pub eta: String,
    pub fire_at: DateTime<Utc>,
}

/// Insertable struct for scheduling a reminder.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = reminder_jobs)]
pub(crate) struct NewReminderJobRow<'a> {
    pub job_key: &'a str,
    pub product_name: &'a str,
    pub quantity: i32,
    pub eta: &'a str,
    pub fire_at: DateTime<Utc>,
}

/// Changeset applied when a key is scheduled again.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = reminder_jobs)]
pub(crate) struct ReminderJobUpdate<'a> {
    pub product_name: &'a str,
    pub quantity: i32,
    pub eta: &'a str,
    pub fire_at: DateTime<Utc>,
}
