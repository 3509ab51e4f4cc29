//! # Repository Module
//!
//! Database repository implementations for Datahouse POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Caller (routing layer, seed binary, tests)                            │
//! │       │                                                                 │
//! │       │  db.products().get_by_code("P1")                               │
//! │       ▼                                                                 │
//! │  ProductRepository / SaleRepository / OrderRepository / Reports        │
//! │       │  pool-level reads and catalogue writes                         │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │       ▲                                                                 │
//! │       │  connection-level helpers (pub(crate))                         │
//! │  CheckoutEngine ── one transaction, many statements                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Statements that must run inside the checkout transaction are free
//! functions taking `&mut SqliteConnection`; repositories own the pool-level
//! entry points.
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalogue CRUD
//! - [`SaleRepository`](sale::SaleRepository) - Invoices and sale lines
//! - [`OrderRepository`](order::OrderRepository) - Customer orders
//! - [`ReportRepository`](report::ReportRepository) - Top products, daily sales

use sqlx::SqliteConnection;

use crate::error::DbResult;

pub mod order;
pub mod product;
pub mod report;
pub mod sale;

/// Takes the database write lock for the current transaction.
///
/// A deferred SQLite transaction only locks on its first write. Issuing a
/// write that touches no row as the first statement makes concurrent
/// writers queue on `busy_timeout` before they read anything, so no one
/// plans against a stale snapshot.
pub(crate) async fn lock_for_write(conn: &mut SqliteConnection) -> DbResult<()> {
    sqlx::query("UPDATE products SET quantity = quantity WHERE 0")
        .execute(&mut *conn)
        .await?;
    Ok(())
}
