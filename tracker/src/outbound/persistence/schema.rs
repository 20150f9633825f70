//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `migrations/` exactly. When a migration
//! changes a table, update the matching block here (or regenerate it with
//! `diesel print-schema`).

diesel::table! {
    /// Grocery items, at home or in the cart.
    products (id) {
        /// Identity primary key; never reused.
        id -> Int8,
        name -> Text,
        /// Non-negative item count.
        quantity -> Int4,
        expiry_date -> Nullable<Date>,
        in_cart -> Bool,
    }
}

diesel::table! {
    /// Durable one-shot reminder queue.
    reminder_jobs (job_key) {
        /// Deterministic reminder key; scheduling the same key replaces the row.
        job_key -> Text,
        product_name -> Text,
        quantity -> Int4,
        /// Remaining-time text captured at schedule time.
        eta -> Text,
        fire_at -> Timestamptz,
        created_at -> Timestamptz,
    }
}
