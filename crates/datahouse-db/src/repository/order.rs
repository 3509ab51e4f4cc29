//! # Order Repository
//!
//! Customer orders placed from the client page. Written by
//! [`CheckoutEngine::place_order`](crate::checkout::CheckoutEngine::place_order),
//! read here.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::DbResult;
use datahouse_core::{Money, Order, OrderLine, PlannedLine};

#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    pub async fn get_order(&self, order_id: i64) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            "SELECT id, customer_name, total_cents, order_date FROM orders WHERE id = ?1",
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    pub async fn list_order_lines(&self, order_id: i64) -> DbResult<Vec<OrderLine>> {
        let lines = sqlx::query_as::<_, OrderLine>(
            r#"
            SELECT id, order_id, product_code, product_name, quantity, unit_price_cents
            FROM order_products
            WHERE order_id = ?1
            ORDER BY id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Most recent orders first.
    pub async fn list_orders(&self, limit: u32) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            "SELECT id, customer_name, total_cents, order_date FROM orders ORDER BY id DESC LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }
}

/// Inserts the order header and returns its id.
pub(crate) async fn insert_order(
    conn: &mut SqliteConnection,
    customer_name: &str,
    total: Money,
    order_date: DateTime<Utc>,
) -> DbResult<i64> {
    let result = sqlx::query(
        "INSERT INTO orders (customer_name, total_cents, order_date) VALUES (?1, ?2, ?3)",
    )
    .bind(customer_name)
    .bind(total.cents())
    .bind(order_date)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

pub(crate) async fn insert_order_line(
    conn: &mut SqliteConnection,
    order_id: i64,
    line: &PlannedLine,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO order_products (
            order_id, product_code, product_name, quantity, unit_price_cents
        ) VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(order_id)
    .bind(&line.code)
    .bind(&line.name)
    .bind(line.quantity)
    .bind(line.unit_price.cents())
    .execute(&mut *conn)
    .await?;

    Ok(())
}
