//! Process-local product table.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::ports::{ProductRepository, ProductRepositoryError};
use crate::domain::{Product, ProductDraft, ProductId, ProductQuery};

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<ProductId, Product>,
    last_id: i64,
}

/// In-memory [`ProductRepository`].
///
/// Ids follow the same rules as the database identity column: they only ever
/// grow, and explicit ids push the sequence forward.
#[derive(Debug, Default)]
pub struct InMemoryProductRepository {
    table: Mutex<Table>,
}

impl InMemoryProductRepository {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn insert(
        &self,
        draft: &ProductDraft,
    ) -> Result<Option<ProductId>, ProductRepositoryError> {
        let mut table = self.table.lock().await;
        let id = match draft.id {
            Some(id) if table.rows.contains_key(&id) => return Ok(None),
            Some(id) => id,
            None => {
                let next = table.last_id.checked_add(1).ok_or_else(|| {
                    ProductRepositoryError::query("product id sequence exhausted")
                })?;
                ProductId::new(next)
                    .map_err(|err| ProductRepositoryError::query(err.to_string()))?
            }
        };
        table.last_id = table.last_id.max(id.get());
        table
            .rows
            .insert(id, Product::new(id, draft.details.clone()));
        Ok(Some(id))
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, ProductRepositoryError> {
        Ok(self.table.lock().await.rows.get(&id).cloned())
    }

    async fn list(&self, query: ProductQuery) -> Result<Vec<Product>, ProductRepositoryError> {
        let table = self.table.lock().await;
        Ok(query.apply(table.rows.values().cloned()))
    }

    async fn update(&self, product: &Product) -> Result<bool, ProductRepositoryError> {
        let mut table = self.table.lock().await;
        match table.rows.get_mut(&product.id()) {
            Some(row) => {
                *row = product.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove(&self, product: &Product) -> Result<bool, ProductRepositoryError> {
        let mut table = self.table.lock().await;
        if table.rows.get(&product.id()) != Some(product) {
            return Ok(false);
        }
        table.rows.remove(&product.id());
        Ok(true)
    }
}
