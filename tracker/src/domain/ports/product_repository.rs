//! Port for product persistence.

use async_trait::async_trait;

use crate::domain::{Product, ProductDraft, ProductId, ProductQuery};

use super::define_port_error;

define_port_error! {
    /// Errors raised by product repository adapters.
    pub enum ProductRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "product repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "product repository query failed: {message}",
    }
}

/// Port for reading and writing product rows.
///
/// Adapters own id assignment: ids are positive, increase monotonically and
/// are never handed out twice, even after deletes or explicit-id inserts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insert a row.
    ///
    /// Returns the stored id, or `None` when the draft pins an id that is
    /// already taken and the insert was ignored.
    async fn insert(&self, draft: &ProductDraft)
    -> Result<Option<ProductId>, ProductRepositoryError>;

    /// Point lookup.
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, ProductRepositoryError>;

    /// Filtered, ordered listing.
    async fn list(&self, query: ProductQuery) -> Result<Vec<Product>, ProductRepositoryError>;

    /// Replace every field of the row with `product.id()`.
    ///
    /// Returns `false` when no such row exists.
    async fn update(&self, product: &Product) -> Result<bool, ProductRepositoryError>;

    /// Delete the row only if it still matches `product` field for field.
    ///
    /// Returns `false` when nothing matched.
    async fn remove(&self, product: &Product) -> Result<bool, ProductRepositoryError>;
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;

    #[rstest]
    fn query_error_formats_message() {
        let err = ProductRepositoryError::query("broken sql");
        assert_eq!(err.to_string(), "product repository query failed: broken sql");
    }

    #[rstest]
    fn connection_error_formats_message() {
        let err = ProductRepositoryError::connection("pool exhausted");
        assert!(err.to_string().contains("pool exhausted"));
    }
}
