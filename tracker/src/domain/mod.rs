//! Domain entities, services and ports.
//!
//! Nothing in here knows about Diesel, HTTP or the terminal; adapters in
//! [`crate::outbound`] implement the traits in [`ports`].

pub mod error;
pub mod expiry_dates;
pub mod pantry_service;
pub mod ports;
pub mod product;
pub mod product_listing;
pub mod product_store;
pub mod reminder;
pub mod reminder_dispatcher;
pub mod reminder_executor;
pub mod reminder_scheduler;
pub mod scan;

pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::expiry_dates::{
    add_weeks, date_from_epoch_millis, days_until, extract_expiry_date, format_remaining,
    parse_expiry_date, today,
};
pub use self::pantry_service::{
    NewProductRequest, PantryChange, PantryService, PantryServiceConfig, PantryServicePorts,
    ProductEdit, ReminderFailure, ReminderSync,
};
pub use self::product::{
    ListMembership, Product, ProductDetails, ProductDraft, ProductId, ProductName,
    ProductValidationError, Quantity,
};
pub use self::product_listing::ProductQuery;
pub use self::product_store::{ConflictPolicy, InsertOutcome, ProductStore};
pub use self::reminder::{LeadTime, ReminderKey, ReminderPayload, ReminderPlan};
pub use self::reminder_dispatcher::{
    ReminderDispatcher, ReminderDispatcherConfig, ReminderSleeper, TokioSleeper,
};
pub use self::reminder_executor::{ReminderExecutor, render_notification};
pub use self::reminder_scheduler::{ReminderError, ReminderScheduler};
pub use self::scan::{InsertPrefill, ScanOutcome, ScanPayload};
