//! # Sale Repository
//!
//! Invoices and their sale lines.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       One Checkout                                      │
//! │                                                                         │
//! │  CheckoutEngine (inside its transaction)                               │
//! │       │                                                                 │
//! │       ├──► insert_invoice     → invoices (1 row)                       │
//! │       └──► insert_sale_line   → sales    (1 row per cart line)         │
//! │                                                                         │
//! │  COMMIT makes all of them visible at once; rollback leaves none.       │
//! │  Rows are append-only: nothing in this crate updates or deletes them.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, NaiveTime};
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::{DbError, DbResult};
use datahouse_core::{Invoice, PaymentMethod, PlannedLine, Sale};

const SALE_COLUMNS: &str = "id, invoice_id, product_code, product_name, quantity, \
     unit_price_cents, line_total_cents, payment_method, sale_date, sale_time";

const INVOICE_COLUMNS: &str = "invoice_id, client_name, client_phone, total_cents, \
     amount_received_cents, change_cents, payment_method, invoice_date, created_at";

/// Read side of invoices and sales.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets an invoice by its id.
    pub async fn get_invoice(&self, invoice_id: &str) -> DbResult<Option<Invoice>> {
        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE invoice_id = ?1"
        ))
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invoice)
    }

    /// Sale lines of one invoice, in cart order.
    pub async fn list_sales_for_invoice(&self, invoice_id: &str) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE invoice_id = ?1 ORDER BY id"
        ))
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Most recent invoices first.
    pub async fn list_invoices(&self, limit: u32) -> DbResult<Vec<Invoice>> {
        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices ORDER BY created_at DESC, rowid DESC LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(invoices)
    }

    /// Counts sale lines across all invoices.
    pub async fn count_sales(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Transaction-scoped statements
// =============================================================================

pub(crate) async fn insert_invoice(conn: &mut SqliteConnection, invoice: &Invoice) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO invoices (
            invoice_id, client_name, client_phone, total_cents,
            amount_received_cents, change_cents, payment_method,
            invoice_date, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&invoice.invoice_id)
    .bind(&invoice.client_name)
    .bind(&invoice.client_phone)
    .bind(invoice.total_cents)
    .bind(invoice.amount_received_cents)
    .bind(invoice.change_cents)
    .bind(invoice.payment_method)
    .bind(invoice.invoice_date)
    .bind(invoice.created_at)
    .execute(&mut *conn)
    .await
    .map_err(|err| match DbError::from(err) {
        DbError::UniqueViolation { .. } => DbError::duplicate("invoice_id", &invoice.invoice_id),
        other => other,
    })?;

    Ok(())
}

pub(crate) async fn insert_sale_line(
    conn: &mut SqliteConnection,
    invoice_id: &str,
    line: &PlannedLine,
    payment_method: PaymentMethod,
    sale_date: NaiveDate,
    sale_time: NaiveTime,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sales (
            invoice_id, product_code, product_name, quantity,
            unit_price_cents, line_total_cents, payment_method,
            sale_date, sale_time
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(invoice_id)
    .bind(&line.code)
    .bind(&line.name)
    .bind(line.quantity)
    .bind(line.unit_price.cents())
    .bind(line.line_total.cents())
    .bind(payment_method)
    .bind(sale_date)
    .bind(sale_time)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
