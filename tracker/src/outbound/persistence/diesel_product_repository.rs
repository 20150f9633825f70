//! PostgreSQL-backed `ProductRepository` implementation using Diesel ORM.
//!
//! Rows are validated through the domain constructors on the way out, so a
//! hand-edited table cannot smuggle a blank name or negative count into the
//! service layer.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_types::BigInt;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{ProductRepository, ProductRepositoryError};
use crate::domain::{
    Product, ProductDetails, ProductDraft, ProductId, ProductName, ProductQuery,
    ProductValidationError, Quantity,
};

use super::diesel_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{NewProductRow, NewProductWithIdRow, ProductChangeset, ProductRow};
use super::pool::{DbPool, PoolError};
use super::schema::products;

/// Pushes the identity sequence past an explicitly inserted id so later
/// generated ids never collide with it.
const ADVANCE_ID_SEQUENCE: &str = "SELECT setval(pg_get_serial_sequence('products', 'id'), \
     GREATEST($1, (SELECT last_value FROM products_id_seq)))";

/// Diesel-backed implementation of the product repository port.
#[derive(Clone)]
pub struct DieselProductRepository {
    pool: DbPool,
}

impl DieselProductRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ProductRepositoryError {
    map_basic_pool_error(error, ProductRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> ProductRepositoryError {
    map_basic_diesel_error(
        error,
        ProductRepositoryError::query,
        ProductRepositoryError::connection,
    )
}

fn quantity_column(quantity: Quantity) -> Result<i32, ProductRepositoryError> {
    i32::try_from(quantity.get())
        .map_err(|_| ProductRepositoryError::query("quantity exceeds the column range"))
}

/// Convert a database row into a validated domain product.
fn row_to_product(row: ProductRow) -> Result<Product, ProductRepositoryError> {
    let ProductRow {
        id,
        name,
        quantity,
        expiry_date,
        in_cart,
    } = row;

    let invalid = |err: ProductValidationError| {
        ProductRepositoryError::query(format!("invalid product row {id}: {err}"))
    };
    let details = ProductDetails {
        name: ProductName::new(name).map_err(invalid)?,
        quantity: Quantity::new(i64::from(quantity)).map_err(invalid)?,
        expiry_date,
        in_cart,
    };
    Ok(Product::new(ProductId::new(id).map_err(invalid)?, details))
}

#[async_trait]
impl ProductRepository for DieselProductRepository {
    async fn insert(
        &self,
        draft: &ProductDraft,
    ) -> Result<Option<ProductId>, ProductRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let details = &draft.details;
        let quantity = quantity_column(details.quantity)?;

        let inserted: Option<i64> = match draft.id {
            None => {
                let row = NewProductRow {
                    name: details.name.as_str(),
                    quantity,
                    expiry_date: details.expiry_date,
                    in_cart: details.in_cart,
                };
                diesel::insert_into(products::table)
                    .values(&row)
                    .returning(products::id)
                    .get_result(&mut conn)
                    .await
                    .map(Some)
                    .map_err(map_diesel_error)?
            }
            Some(id) => {
                let row = NewProductWithIdRow {
                    id: id.get(),
                    name: details.name.as_str(),
                    quantity,
                    expiry_date: details.expiry_date,
                    in_cart: details.in_cart,
                };
                let inserted = diesel::insert_into(products::table)
                    .values(&row)
                    .on_conflict_do_nothing()
                    .returning(products::id)
                    .get_result(&mut conn)
                    .await
                    .optional()
                    .map_err(map_diesel_error)?;
                if inserted.is_some() {
                    diesel::sql_query(ADVANCE_ID_SEQUENCE)
                        .bind::<BigInt, _>(id.get())
                        .execute(&mut conn)
                        .await
                        .map_err(map_diesel_error)?;
                }
                inserted
            }
        };

        inserted
            .map(|id| {
                ProductId::new(id).map_err(|err| ProductRepositoryError::query(err.to_string()))
            })
            .transpose()
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, ProductRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<ProductRow> = products::table
            .filter(products::id.eq(id.get()))
            .select(ProductRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_product).transpose()
    }

    async fn list(&self, query: ProductQuery) -> Result<Vec<Product>, ProductRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<ProductRow> = match query {
            ProductQuery::All => {
                products::table
                    .order((products::expiry_date.asc().nulls_last(), products::id.asc()))
                    .select(ProductRow::as_select())
                    .load(&mut conn)
                    .await
            }
            ProductQuery::AtHome => {
                products::table
                    .filter(products::in_cart.eq(false))
                    .order((products::expiry_date.asc().nulls_last(), products::id.asc()))
                    .select(ProductRow::as_select())
                    .load(&mut conn)
                    .await
            }
            ProductQuery::InCart => {
                products::table
                    .filter(products::in_cart.eq(true))
                    .order((products::name.asc(), products::id.asc()))
                    .select(ProductRow::as_select())
                    .load(&mut conn)
                    .await
            }
        }
        .map_err(map_diesel_error)?;

        // Collation may differ from byte order; the domain ordering is
        // authoritative.
        let listed = rows
            .into_iter()
            .map(row_to_product)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(query.apply(listed))
    }

    async fn update(&self, product: &Product) -> Result<bool, ProductRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let changes = ProductChangeset {
            name: product.name().as_str(),
            quantity: quantity_column(product.quantity())?,
            expiry_date: product.expiry_date(),
            in_cart: product.in_cart(),
        };

        let updated = diesel::update(products::table.filter(products::id.eq(product.id().get())))
            .set(&changes)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(updated > 0)
    }

    async fn remove(&self, product: &Product) -> Result<bool, ProductRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(
            products::table
                .filter(products::id.eq(product.id().get()))
                .filter(products::name.eq(product.name().as_str()))
                .filter(products::quantity.eq(quantity_column(product.quantity())?))
                .filter(products::expiry_date.is_not_distinct_from(product.expiry_date()))
                .filter(products::in_cart.eq(product.in_cart())),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;

        Ok(deleted > 0)
    }
}
