//! # Product Repository
//!
//! Database operations for the product catalogue.
//!
//! ## Key Operations
//! - Store-manager CRUD (code allocation, image reference handling)
//! - Snapshot lookup for checkout (many codes, one query)
//! - Guarded stock decrement
//!
//! ## Stock Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Guarded Delta Update                                 │
//! │                                                                         │
//! │  UPDATE products                                                       │
//! │     SET quantity = quantity - :n                                       │
//! │   WHERE code = :code AND quantity >= :n                                │
//! │                                                                         │
//! │  rows_affected = 1 → decremented                                       │
//! │  rows_affected = 0 → stock moved under us, abort the transaction       │
//! │                                                                         │
//! │  Never writes an absolute value computed from an earlier read.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::lock_for_write;
use datahouse_core::validation::{validate_code, validate_new_product, validate_product_update};
use datahouse_core::{NewProduct, Product, ProductUpdate, StockUpdate};

const PRODUCT_COLUMNS: &str =
    "code, name, price_cents, quantity, description, image, created_at, updated_at";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let created = repo.insert(&new_product).await?;
/// let product = repo.get_by_code(&created.code).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its code.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE code = ?1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists the whole catalogue ordered by name.
    pub async fn list_all(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name, code"
        ))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Counts products in the catalogue.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Inserts a new product.
    ///
    /// ## Code Allocation
    /// Without an explicit code the next numeric code is used: one more than
    /// the largest all-digit code in the table, `"1"` for an empty table.
    /// Allocation and insert share one write transaction so two concurrent
    /// inserts cannot pick the same code.
    ///
    /// ## Errors
    /// * `DbError::Validation` - Invalid fields
    /// * `DbError::UniqueViolation` - Code already taken
    pub async fn insert(&self, product: &NewProduct) -> DbResult<Product> {
        validate_new_product(product)?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        lock_for_write(&mut tx).await?;

        let code = match &product.code {
            Some(code) => code.trim().to_string(),
            None => next_numeric_code(&mut tx).await?,
        };

        sqlx::query(
            r#"
            INSERT INTO products (
                code, name, price_cents, quantity, description, image,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            "#,
        )
        .bind(&code)
        .bind(product.name.trim())
        .bind(product.price.cents())
        .bind(product.quantity)
        .bind(product.description.trim())
        .bind(&product.image)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("code", &code),
            other => other,
        })?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(code = %code, "Product inserted");

        Ok(Product {
            code,
            name: product.name.trim().to_string(),
            price_cents: product.price.cents(),
            quantity: product.quantity,
            description: product.description.trim().to_string(),
            image: product.image.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Updates an existing product.
    ///
    /// An update without an image keeps the stored reference.
    pub async fn update(&self, code: &str, update: &ProductUpdate) -> DbResult<Product> {
        validate_product_update(update)?;

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                price_cents = ?3,
                quantity = ?4,
                description = ?5,
                image = COALESCE(?6, image),
                updated_at = ?7
            WHERE code = ?1
            "#,
        )
        .bind(code)
        .bind(update.name.trim())
        .bind(update.price.cents())
        .bind(update.quantity)
        .bind(update.description.trim())
        .bind(&update.image)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", code));
        }

        debug!(code = %code, "Product updated");

        self.get_by_code(code)
            .await?
            .ok_or_else(|| DbError::not_found("Product", code))
    }

    /// Deletes a product. Past sale lines keep their frozen name and price.
    pub async fn delete(&self, code: &str) -> DbResult<()> {
        validate_code(code)?;

        let result = sqlx::query("DELETE FROM products WHERE code = ?1")
            .bind(code)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", code));
        }

        debug!(code = %code, "Product deleted");
        Ok(())
    }
}

// =============================================================================
// Transaction-scoped statements
// =============================================================================

async fn next_numeric_code(conn: &mut SqliteConnection) -> DbResult<String> {
    let next: i64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(MAX(CAST(code AS INTEGER)), 0) + 1
        FROM products
        WHERE code <> '' AND code NOT GLOB '*[^0-9]*'
        "#,
    )
    .fetch_one(&mut *conn)
    .await?;

    Ok(next.to_string())
}

/// Reads every product named in `codes`, keyed by code.
///
/// Codes with no row are simply absent from the map.
pub(crate) async fn fetch_catalogue(
    conn: &mut SqliteConnection,
    codes: &[String],
) -> DbResult<HashMap<String, Product>> {
    if codes.is_empty() {
        return Ok(HashMap::new());
    }

    let mut query: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE code IN ("));
    let mut list = query.separated(", ");
    for code in codes {
        list.push_bind(code.clone());
    }
    list.push_unseparated(")");

    let products: Vec<Product> = query.build_query_as().fetch_all(&mut *conn).await?;

    debug!(requested = codes.len(), found = products.len(), "Catalogue snapshot");
    Ok(products.into_iter().map(|p| (p.code.clone(), p)).collect())
}

/// Applies one planned stock decrement.
pub(crate) async fn decrement_stock(
    conn: &mut SqliteConnection,
    update: &StockUpdate,
    now: DateTime<Utc>,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET quantity = quantity - ?2, updated_at = ?3
        WHERE code = ?1 AND quantity >= ?2
        "#,
    )
    .bind(&update.code)
    .bind(update.decrement)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::TransactionFailed(format!(
            "stock for {} changed during the transaction",
            update.code
        )));
    }

    debug!(
        code = %update.code,
        before = update.before,
        after = update.after(),
        "Stock decremented"
    );
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
