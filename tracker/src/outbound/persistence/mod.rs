//! PostgreSQL persistence adapters.
//!
//! Products and pending reminders share one database and one connection pool.
//! Row structs stay private to this module; adapters convert them through the
//! domain constructors.

mod diesel_error_mapping;
mod diesel_product_repository;
mod diesel_reminder_queue;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_product_repository::DieselProductRepository;
pub use diesel_reminder_queue::DieselReminderQueue;
pub use migrations::{MIGRATIONS, MigrationError, apply_migrations, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
