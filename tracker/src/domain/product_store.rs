//! Product store: validated access to the product table plus live queries.
//!
//! Every committed mutation bumps a revision on a [`watch`] channel. Live
//! queries re-read their listing whenever the revision moves, so a burst of
//! mutations may collapse into a single emission but a subscriber never sees
//! a half-applied change.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use futures_util::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

use crate::domain::ports::{ProductRepository, ProductRepositoryError};
use crate::domain::{Error, Product, ProductDraft, ProductId, ProductQuery};

/// How an explicit-id insert that collides with an existing row is resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Keep the existing row and report [`InsertOutcome::Ignored`].
    #[default]
    Ignore,
    /// Fail with [`ErrorCode::Conflict`](crate::domain::ErrorCode::Conflict).
    Fail,
}

impl ConflictPolicy {
    /// Configuration spelling of the policy.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ignore => "ignore",
            Self::Fail => "fail",
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(Self::Ignore),
            "fail" => Ok(Self::Fail),
            other => Err(format!(
                "unknown conflict policy `{other}`; expected `ignore` or `fail`"
            )),
        }
    }
}

/// Result of [`ProductStore::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The row was stored under this id.
    Inserted(ProductId),
    /// An explicit id collided and the row was left untouched.
    Ignored,
}

impl InsertOutcome {
    /// Stored id, if the insert took effect.
    pub fn id(self) -> Option<ProductId> {
        match self {
            Self::Inserted(id) => Some(id),
            Self::Ignored => None,
        }
    }
}

pub(crate) fn map_repository_error(error: ProductRepositoryError) -> Error {
    match error {
        ProductRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("product store unavailable: {message}"))
        }
        ProductRepositoryError::Query { message } => {
            Error::internal(format!("product store error: {message}"))
        }
    }
}

/// Product table with change notification.
#[derive(Clone)]
pub struct ProductStore {
    repository: Arc<dyn ProductRepository>,
    conflict_policy: ConflictPolicy,
    revision: Arc<watch::Sender<u64>>,
}

impl ProductStore {
    /// Wrap a repository using the default [`ConflictPolicy::Ignore`].
    pub fn new(repository: Arc<dyn ProductRepository>) -> Self {
        Self::with_conflict_policy(repository, ConflictPolicy::default())
    }

    /// Wrap a repository with an explicit conflict policy.
    pub fn with_conflict_policy(
        repository: Arc<dyn ProductRepository>,
        conflict_policy: ConflictPolicy,
    ) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            repository,
            conflict_policy,
            revision: Arc::new(revision),
        }
    }

    /// Insert a new row.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::Conflict`](crate::domain::ErrorCode::Conflict)
    /// when an explicit id is taken under [`ConflictPolicy::Fail`].
    pub async fn insert(&self, draft: &ProductDraft) -> Result<InsertOutcome, Error> {
        let stored = self
            .repository
            .insert(draft)
            .await
            .map_err(map_repository_error)?;

        match (stored, draft.id) {
            (Some(id), _) => {
                self.publish();
                debug!(product_id = %id, "product inserted");
                Ok(InsertOutcome::Inserted(id))
            }
            (None, Some(id)) => match self.conflict_policy {
                ConflictPolicy::Ignore => {
                    debug!(product_id = %id, "insert ignored; id already taken");
                    Ok(InsertOutcome::Ignored)
                }
                ConflictPolicy::Fail => Err(Error::conflict(format!(
                    "product {id} already exists"
                ))),
            },
            (None, None) => Err(Error::internal(
                "repository skipped an insert without an explicit id",
            )),
        }
    }

    /// Point lookup.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, Error> {
        self.repository
            .find_by_id(id)
            .await
            .map_err(map_repository_error)
    }

    /// Every product; dated first by ascending date, undated last.
    pub async fn list_all(&self) -> Result<Vec<Product>, Error> {
        self.list(ProductQuery::All).await
    }

    /// Products at home, soonest expiry first.
    pub async fn list_at_home(&self) -> Result<Vec<Product>, Error> {
        self.list(ProductQuery::AtHome).await
    }

    /// Products in the cart, by name.
    pub async fn list_in_cart(&self) -> Result<Vec<Product>, Error> {
        self.list(ProductQuery::InCart).await
    }

    /// Run one listing query.
    pub async fn list(&self, query: ProductQuery) -> Result<Vec<Product>, Error> {
        self.repository
            .list(query)
            .await
            .map_err(map_repository_error)
    }

    /// Replace every field of an existing row.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::NotFound`](crate::domain::ErrorCode::NotFound)
    /// when no row has `product.id()`.
    pub async fn update(&self, product: &Product) -> Result<(), Error> {
        let updated = self
            .repository
            .update(product)
            .await
            .map_err(map_repository_error)?;
        if !updated {
            return Err(Error::not_found(format!(
                "product {} not found",
                product.id()
            )));
        }
        self.publish();
        debug!(product_id = %product.id(), "product updated");
        Ok(())
    }

    /// Delete the row if it still matches `product` exactly.
    ///
    /// Returns `false` when nothing matched.
    pub async fn remove(&self, product: &Product) -> Result<bool, Error> {
        let removed = self
            .repository
            .remove(product)
            .await
            .map_err(map_repository_error)?;
        if removed {
            self.publish();
            debug!(product_id = %product.id(), "product removed");
        }
        Ok(removed)
    }

    /// Live listing: the current snapshot, then a fresh one after every
    /// committed mutation.
    pub fn observe(&self, query: ProductQuery) -> BoxStream<'static, Result<Vec<Product>, Error>> {
        let repository = Arc::clone(&self.repository);
        self.live(move || {
            let repository = Arc::clone(&repository);
            async move { repository.list(query).await.map_err(map_repository_error) }
        })
    }

    /// Live point lookup; yields `None` while the row does not exist.
    pub fn observe_product(
        &self,
        id: ProductId,
    ) -> BoxStream<'static, Result<Option<Product>, Error>> {
        let repository = Arc::clone(&self.repository);
        self.live(move || {
            let repository = Arc::clone(&repository);
            async move { repository.find_by_id(id).await.map_err(map_repository_error) }
        })
    }

    fn live<T, F, Fut>(&self, read: F) -> BoxStream<'static, Result<T, Error>>
    where
        T: Send + 'static,
        F: Fn() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<T, Error>> + Send + 'static,
    {
        let receiver = self.revision.subscribe();
        stream::unfold(
            (receiver, read, true),
            |(mut receiver, read, first)| async move {
                if !first && receiver.changed().await.is_err() {
                    return None;
                }
                let snapshot = read().await;
                Some((snapshot, (receiver, read, false)))
            },
        )
        .boxed()
    }

    fn publish(&self) {
        self.revision.send_modify(|revision| *revision = revision.wrapping_add(1));
    }
}

#[cfg(test)]
#[path = "product_store_tests.rs"]
mod tests;
