//! Pantry orchestration.
//!
//! Every mutating operation runs in the same order: fetch the current row,
//! decide what changes, commit the store mutation, then bring reminders in
//! line. A failed store mutation leaves reminders untouched. A failed
//! reminder step never undoes the store mutation; it is retried, logged and
//! reported in the returned [`ReminderSync`].

use std::sync::Arc;

use chrono::NaiveDate;
use futures_util::stream::BoxStream;
use mockable::Clock;
use tracing::{debug, warn};

use crate::domain::expiry_dates::{add_weeks, extract_expiry_date, parse_expiry_date, today};
use crate::domain::ports::{
    FoodFactsSource, FoodFactsSourceError, ProductRepository, ReminderQueue,
};
use crate::domain::{
    ConflictPolicy, Error, InsertOutcome, InsertPrefill, LeadTime, ListMembership, Product,
    ProductDetails, ProductDraft, ProductId, ProductName, ProductQuery, ProductStore,
    ProductValidationError, Quantity, ReminderError, ReminderKey, ReminderScheduler, ScanOutcome,
    ScanPayload,
};

/// Port bundle required by the pantry service.
pub struct PantryServicePorts {
    /// Product persistence adapter.
    pub products: Arc<dyn ProductRepository>,
    /// Durable reminder queue adapter.
    pub reminders: Arc<dyn ReminderQueue>,
    /// Barcode metadata adapter.
    pub food_facts: Arc<dyn FoodFactsSource>,
}

/// Service tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PantryServiceConfig {
    /// Resolution of colliding explicit-id inserts.
    pub conflict_policy: ConflictPolicy,
    /// Attempts per reminder operation, including the first.
    pub scheduling_attempts: u32,
}

impl Default for PantryServiceConfig {
    fn default() -> Self {
        Self {
            conflict_policy: ConflictPolicy::Ignore,
            scheduling_attempts: 3,
        }
    }
}

/// Raw insert-form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewProductRequest {
    /// Explicit id for restore and import; normally `None`.
    pub id: Option<i64>,
    /// Display name; trimmed and required.
    pub name: String,
    /// Units on hand; must be positive.
    pub quantity: i64,
    /// ISO `YYYY-MM-DD`; blank or `None` means no expiry tracked.
    pub expiry_date: Option<String>,
}

/// Field edits for an existing product; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductEdit {
    /// Replacement name.
    pub name: Option<String>,
    /// Replacement quantity.
    pub quantity: Option<i64>,
    /// ISO date; a blank string clears the expiry date.
    pub expiry_date: Option<String>,
}

/// One reminder step that still failed after every attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderFailure {
    /// Lead time of the failed step.
    pub lead_time: LeadTime,
    /// Error from the final attempt.
    pub error: ReminderError,
}

/// Reminder side effects of one pantry operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReminderSync {
    /// Keys scheduled (or replaced).
    pub scheduled: Vec<ReminderKey>,
    /// Keys whose pending entry was dropped.
    pub cancelled: Vec<ReminderKey>,
    /// Steps that failed for good.
    pub failures: Vec<ReminderFailure>,
}

impl ReminderSync {
    /// `true` when every reminder step succeeded.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Promote reminder failures to an error for callers that need them.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::SchedulingFailed`](crate::domain::ErrorCode::SchedulingFailed)
    /// when any step failed.
    pub fn require_all(&self) -> Result<(), Error> {
        match self.failures.first() {
            None => Ok(()),
            Some(first) => Err(Error::scheduling_failed(format!(
                "{} reminder step(s) failed; first ({}): {}",
                self.failures.len(),
                first.lead_time,
                first.error
            ))),
        }
    }

    fn merge(&mut self, other: Self) {
        self.scheduled.extend(other.scheduled);
        self.cancelled.extend(other.cancelled);
        self.failures.extend(other.failures);
    }
}

/// A committed pantry mutation and its reminder side effects.
#[derive(Debug, Clone, PartialEq)]
pub struct PantryChange {
    /// Row as it stands after the operation (or as it was, for removals).
    pub product: Product,
    /// Reminder steps taken for the change.
    pub reminders: ReminderSync,
}

fn invalid(error: ProductValidationError) -> Error {
    Error::invalid_request(error.to_string())
}

fn map_food_facts_error(error: FoodFactsSourceError) -> Error {
    match error {
        FoodFactsSourceError::NotFound { code } => {
            Error::not_found(format!("no product data for barcode {code}"))
        }
        FoodFactsSourceError::Transport { message } => {
            Error::service_unavailable(format!("food facts lookup unavailable: {message}"))
        }
        FoodFactsSourceError::Decode { message } => {
            Error::internal(format!("food facts lookup failed: {message}"))
        }
    }
}

/// Keeps the product store and the reminder queue in step.
#[derive(Clone)]
pub struct PantryService {
    store: ProductStore,
    scheduler: ReminderScheduler,
    food_facts: Arc<dyn FoodFactsSource>,
    clock: Arc<dyn Clock>,
    scheduling_attempts: u32,
}

impl PantryService {
    /// Wire the service over its ports.
    pub fn new(ports: PantryServicePorts, clock: Arc<dyn Clock>, config: PantryServiceConfig) -> Self {
        let store = ProductStore::with_conflict_policy(ports.products, config.conflict_policy);
        let scheduler = ReminderScheduler::new(store.clone(), ports.reminders, Arc::clone(&clock));
        Self {
            store,
            scheduler,
            food_facts: ports.food_facts,
            clock,
            scheduling_attempts: config.scheduling_attempts.max(1),
        }
    }

    /// Underlying product store.
    pub fn store(&self) -> &ProductStore {
        &self.store
    }

    /// Validate and store a product at home, then schedule both reminders.
    ///
    /// Returns `None` when the request pins an id that is already taken and
    /// the store is configured to ignore such inserts.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for bad input, `Conflict` for a taken explicit id
    /// under [`ConflictPolicy::Fail`], storage errors otherwise.
    pub async fn insert_product_at_home(
        &self,
        request: NewProductRequest,
    ) -> Result<Option<PantryChange>, Error> {
        let details = ProductDetails::parse(
            &request.name,
            request.quantity,
            request.expiry_date.as_deref(),
            false,
        )
        .map_err(invalid)?;
        let draft = match request.id {
            Some(raw) => ProductDraft::with_id(ProductId::new(raw).map_err(invalid)?, details),
            None => ProductDraft::new(details),
        };

        let id = match self.store.insert(&draft).await? {
            InsertOutcome::Inserted(id) => id,
            InsertOutcome::Ignored => return Ok(None),
        };
        let product = Product::new(id, draft.details);
        let reminders = self.schedule_both(&product).await;
        Ok(Some(PantryChange { product, reminders }))
    }

    /// Move a product to the cart and cancel its reminders.
    pub async fn move_product_to_cart(&self, id: ProductId) -> Result<PantryChange, Error> {
        let snapshot = self.fetch(id).await?;
        let moved = snapshot.moved_to(ListMembership::InCart);
        self.store.update(&moved).await?;
        let reminders = self.cancel_both(&snapshot).await;
        Ok(PantryChange {
            product: moved,
            reminders,
        })
    }

    /// Move a product home and (re)schedule its reminders.
    pub async fn move_product_to_home(&self, id: ProductId) -> Result<PantryChange, Error> {
        let snapshot = self.fetch(id).await?;
        let moved = snapshot.moved_to(ListMembership::AtHome);
        self.store.update(&moved).await?;
        let reminders = self.schedule_both(&moved).await;
        Ok(PantryChange {
            product: moved,
            reminders,
        })
    }

    /// Delete a product and cancel its reminders.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id; `Conflict` when the row changed between
    /// the fetch and the delete, in which case nothing is cancelled.
    pub async fn remove_product(&self, id: ProductId) -> Result<PantryChange, Error> {
        let snapshot = self.fetch(id).await?;
        if !self.store.remove(&snapshot).await? {
            return Err(Error::conflict(format!(
                "product {id} changed before it could be removed"
            )));
        }
        let reminders = self.cancel_both(&snapshot).await;
        Ok(PantryChange {
            product: snapshot,
            reminders,
        })
    }

    /// Edit name, quantity or expiry date.
    ///
    /// Reminders keyed by the old name or date are cancelled; a product at
    /// home is rescheduled from its new state so the payload stays current.
    pub async fn update_product(
        &self,
        id: ProductId,
        edit: ProductEdit,
    ) -> Result<PantryChange, Error> {
        let snapshot = self.fetch(id).await?;
        let details = apply_edit(snapshot.details(), edit).map_err(invalid)?;
        let updated = snapshot.with_details(details);
        self.store.update(&updated).await?;

        let mut reminders = ReminderSync::default();
        let identity_changed = snapshot.name() != updated.name()
            || snapshot.expiry_date() != updated.expiry_date();
        if !snapshot.in_cart() && identity_changed {
            reminders.merge(self.cancel_both(&snapshot).await);
        }
        if !updated.in_cart() {
            reminders.merge(self.schedule_both(&updated).await);
        }
        Ok(PantryChange {
            product: updated,
            reminders,
        })
    }

    /// Point lookup.
    pub async fn get_product(&self, id: ProductId) -> Result<Option<Product>, Error> {
        self.store.get_by_id(id).await
    }

    /// Every product, expiry-ordered.
    pub async fn list_all(&self) -> Result<Vec<Product>, Error> {
        self.store.list_all().await
    }

    /// Products at home, expiry-ordered.
    pub async fn list_at_home(&self) -> Result<Vec<Product>, Error> {
        self.store.list_at_home().await
    }

    /// Shopping list, ordered by name.
    pub async fn list_in_cart(&self) -> Result<Vec<Product>, Error> {
        self.store.list_in_cart().await
    }

    /// Live listing; see [`ProductStore::observe`].
    pub fn observe_list(&self, query: ProductQuery) -> BoxStream<'static, Result<Vec<Product>, Error>> {
        self.store.observe(query)
    }

    /// Live point lookup; see [`ProductStore::observe_product`].
    pub fn observe_product(
        &self,
        id: ProductId,
    ) -> BoxStream<'static, Result<Option<Product>, Error>> {
        self.store.observe_product(id)
    }

    /// Resolve a barcode into insert-form suggestions.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for a blank code, `NotFound` when the service does
    /// not know it, `ServiceUnavailable` on transport failure.
    pub async fn lookup_barcode(&self, code: &str) -> Result<InsertPrefill, Error> {
        let code = code.trim();
        if code.is_empty() {
            return Err(Error::invalid_request("barcode must not be empty"));
        }
        let facts = self
            .food_facts
            .fetch(code)
            .await
            .map_err(map_food_facts_error)?;
        debug!(code, name = %facts.name, "barcode resolved");
        Ok(InsertPrefill {
            code: Some(facts.code),
            name: facts.name,
            image_url: Some(facts.image_url),
            expiry_date: None,
        })
    }

    /// Turn a terminal scan result into insert-form suggestions.
    ///
    /// A cancelled scan yields `None`.
    ///
    /// # Errors
    ///
    /// `ServiceUnavailable` when the scanner failed; barcode lookups fail as
    /// in [`Self::lookup_barcode`].
    pub async fn prefill_from_scan(
        &self,
        outcome: ScanOutcome,
    ) -> Result<Option<InsertPrefill>, Error> {
        match outcome {
            ScanOutcome::Completed(ScanPayload::Barcode(code)) => {
                self.lookup_barcode(&code).await.map(Some)
            }
            ScanOutcome::Completed(ScanPayload::RecognisedText(text)) => {
                let expiry_date = extract_expiry_date(&text);
                if expiry_date.is_none() {
                    debug!("no date found in recognised text");
                }
                Ok(Some(InsertPrefill {
                    expiry_date,
                    ..InsertPrefill::default()
                }))
            }
            ScanOutcome::Cancelled => {
                debug!("scan cancelled");
                Ok(None)
            }
            ScanOutcome::Failed { reason } => {
                warn!(%reason, "scan failed");
                Err(Error::service_unavailable(format!("scan failed: {reason}")))
            }
        }
    }

    /// Expiry date `weeks` whole weeks after `base`.
    ///
    /// Counts from today when `base` is absent, blank or not an ISO date.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` when the result overflows the calendar.
    pub fn expiry_in_weeks(&self, base: Option<&str>, weeks: u32) -> Result<NaiveDate, Error> {
        let start = base
            .and_then(|raw| parse_expiry_date(raw).ok().flatten())
            .unwrap_or_else(|| today(self.clock.as_ref()));
        add_weeks(start, weeks)
            .ok_or_else(|| Error::invalid_request(format!("{weeks} weeks is out of range")))
    }

    async fn fetch(&self, id: ProductId) -> Result<Product, Error> {
        self.store
            .get_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("product {id} not found")))
    }

    async fn schedule_both(&self, product: &Product) -> ReminderSync {
        let mut sync = ReminderSync::default();
        if product.expiry_date().is_none() {
            debug!(product_id = %product.id(), "no expiry date; nothing to schedule");
            return sync;
        }
        for lead_time in LeadTime::ALL {
            let mut attempt = 1;
            loop {
                match self.scheduler.schedule(product.id(), lead_time).await {
                    Ok(plan) => {
                        sync.scheduled.push(plan.key);
                        break;
                    }
                    Err(error) if error.is_nothing_to_schedule() => {
                        debug!(product_id = %product.id(), %error, "reminder skipped");
                        break;
                    }
                    Err(error) if attempt < self.scheduling_attempts => {
                        warn!(product_id = %product.id(), %lead_time, attempt, %error, "reminder scheduling failed; retrying");
                        attempt += 1;
                    }
                    Err(error) => {
                        warn!(product_id = %product.id(), %lead_time, attempt, %error, "reminder scheduling gave up");
                        sync.failures.push(ReminderFailure { lead_time, error });
                        break;
                    }
                }
            }
        }
        sync
    }

    async fn cancel_both(&self, snapshot: &Product) -> ReminderSync {
        let mut sync = ReminderSync::default();
        let Some(expiry_date) = snapshot.expiry_date() else {
            return sync;
        };
        for lead_time in LeadTime::ALL {
            let key = ReminderKey::new(lead_time, snapshot.id(), snapshot.name(), expiry_date);
            let mut attempt = 1;
            loop {
                match self.scheduler.cancel_product(snapshot, lead_time).await {
                    Ok(true) => {
                        sync.cancelled.push(key);
                        break;
                    }
                    Ok(false) => break,
                    Err(error) if attempt < self.scheduling_attempts => {
                        warn!(%key, attempt, %error, "reminder cancel failed; retrying");
                        attempt += 1;
                    }
                    Err(error) => {
                        warn!(%key, attempt, %error, "reminder cancel gave up");
                        sync.failures.push(ReminderFailure { lead_time, error });
                        break;
                    }
                }
            }
        }
        sync
    }
}

fn apply_edit(
    current: &ProductDetails,
    edit: ProductEdit,
) -> Result<ProductDetails, ProductValidationError> {
    let name = match edit.name {
        Some(raw) => ProductName::new(raw)?,
        None => current.name.clone(),
    };
    let quantity = match edit.quantity {
        Some(raw) => Quantity::new(raw)?,
        None => current.quantity,
    };
    let expiry_date = match edit.expiry_date {
        Some(raw) => parse_expiry_date(&raw)?,
        None => current.expiry_date,
    };
    Ok(ProductDetails {
        name,
        quantity,
        expiry_date,
        in_cart: current.in_cart,
    })
}

#[cfg(test)]
#[path = "pantry_service_tests.rs"]
mod tests;
