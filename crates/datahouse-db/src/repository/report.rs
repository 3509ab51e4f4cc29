//! # Report Repository
//!
//! Aggregates over committed sale lines. Rolled-back checkouts never wrote
//! a line, so they never show up here.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use datahouse_core::{DailySales, TopProduct, DEFAULT_TOP_PRODUCTS};

#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Best sellers by units sold, highest first.
    ///
    /// A `limit` of 0 falls back to [`DEFAULT_TOP_PRODUCTS`].
    pub async fn top_products(&self, limit: u32) -> DbResult<Vec<TopProduct>> {
        let limit = if limit == 0 { DEFAULT_TOP_PRODUCTS } else { limit };

        let rows = sqlx::query_as::<_, TopProduct>(
            r#"
            SELECT product_name, SUM(quantity) AS total_sold
            FROM sales
            GROUP BY product_name
            ORDER BY total_sold DESC, product_name ASC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(rows = rows.len(), limit, "Top products report");
        Ok(rows)
    }

    /// Revenue per sale date, newest date first.
    pub async fn daily_sales(&self) -> DbResult<Vec<DailySales>> {
        let rows = sqlx::query_as::<_, DailySales>(
            r#"
            SELECT sale_date AS date, SUM(line_total_cents) AS total_sales_cents
            FROM sales
            GROUP BY sale_date
            ORDER BY sale_date DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(rows = rows.len(), "Daily sales report");
        Ok(rows)
    }
}
