//! # Checkout Engine
//!
//! Runs a cashier checkout or a customer order as one SQLite transaction.
//!
//! ## Transaction Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Started      validate request shape          (no store access)        │
//! │     │                                                                   │
//! │  Validating   BEGIN                                                     │
//! │     │         take write lock (queues behind other checkouts)          │
//! │     │         SELECT every product in the cart                          │
//! │     │         CartPlan::for_checkout  → ProductNotFound / Insufficient │
//! │     │         plan.settle(received)   → InsufficientPayment            │
//! │     │                                                                   │
//! │  Reserving    UPDATE products ... WHERE quantity >= n   (per code)      │
//! │     │                                                                   │
//! │  Committing   INSERT invoice, INSERT sale line × n, COMMIT              │
//! │     │                                                                   │
//! │  Committed                                                              │
//! │                                                                         │
//! │  Any failure after BEGIN: ROLLBACK before the error is returned.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Payment is settled before the first stock write, so a short payment
//! leaves nothing behind even if the rollback itself were lost.

use chrono::{DateTime, Timelike, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{CheckoutError, DbError};
use crate::repository::lock_for_write;
use crate::repository::order::{insert_order, insert_order_line};
use crate::repository::product::{decrement_stock, fetch_catalogue};
use crate::repository::sale::{insert_invoice, insert_sale_line};
use datahouse_core::validation::{validate_checkout_request, validate_order_request};
use datahouse_core::{
    CartLine, CartPlan, CheckoutPhase, CheckoutReceipt, CheckoutRequest, Clock, CoreError,
    CoreResult, Invoice, InvoiceIdGenerator, OrderConfirmation, OrderRequest, Product,
    SystemClock, UuidInvoiceIds,
};

type Planner = fn(&[CartLine], &HashMap<String, Product>) -> CoreResult<CartPlan>;

/// Transactional checkout over a SQLite pool.
///
/// ## Usage
/// ```rust,ignore
/// let engine = db.checkout();
/// match engine.checkout(&request).await {
///     Ok(receipt) => respond(receipt.to_response()),
///     Err(err) => respond_error(err.to_failure()),
/// }
/// ```
#[derive(Clone)]
pub struct CheckoutEngine {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
    invoice_ids: Arc<dyn InvoiceIdGenerator>,
}

impl fmt::Debug for CheckoutEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckoutEngine")
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

impl CheckoutEngine {
    pub fn new(pool: SqlitePool) -> Self {
        CheckoutEngine {
            pool,
            clock: Arc::new(SystemClock),
            invoice_ids: Arc::new(UuidInvoiceIds),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_invoice_ids(mut self, invoice_ids: Arc<dyn InvoiceIdGenerator>) -> Self {
        self.invoice_ids = invoice_ids;
        self
    }

    /// Sells a cart.
    ///
    /// On success the stock decrements, one sale line per cart line and the
    /// invoice are committed together. On any error none of them are.
    ///
    /// ## Errors
    /// * `Rejected(Validation)` - Empty cart, bad quantity, negative amount
    /// * `Rejected(ProductNotFound)` - First unknown code in cart order
    /// * `Rejected(InsufficientStock)` - First line that exceeds what is left
    /// * `Rejected(InsufficientPayment)` - Amount received below the total
    /// * `Storage(_)` - The transaction failed and was rolled back
    pub async fn checkout(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        let mut attempt = Attempt::start("checkout");

        if let Err(err) = validate_checkout_request(request) {
            return Err(attempt.reject(err.into()));
        }

        let now = self.clock.now();
        let invoice_id = self.invoice_ids.next_id(now);
        attempt.advance(CheckoutPhase::Validating);

        let mut tx = match self.pool.begin().await {
            Ok(tx) => tx,
            Err(err) => return Err(attempt.roll_back(err.into())),
        };

        let receipt = match self
            .sell(&mut tx, &mut attempt, request, &invoice_id, now)
            .await
        {
            Ok(receipt) => receipt,
            Err(err) => {
                release(tx).await;
                return Err(err);
            }
        };

        if let Err(err) = tx.commit().await {
            return Err(attempt.roll_back(DbError::TransactionFailed(err.to_string())));
        }
        attempt.advance(CheckoutPhase::Committed);

        info!(
            invoice_id = %receipt.invoice_id,
            total = %receipt.total_amount,
            change = %receipt.change_amount,
            lines = receipt.lines.len(),
            "Checkout committed"
        );
        Ok(receipt)
    }

    async fn sell(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        attempt: &mut Attempt,
        request: &CheckoutRequest,
        invoice_id: &str,
        now: DateTime<Utc>,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        let plan = self.plan(tx, attempt, &request.cart, CartPlan::for_checkout).await?;
        let settlement = plan
            .settle(request.amount_received)
            .map_err(|err| attempt.reject(err))?;

        attempt.advance(CheckoutPhase::Reserving);
        for update in &plan.stock_updates {
            decrement_stock(&mut **tx, update, now)
                .await
                .map_err(|err| attempt.roll_back(err))?;
        }

        attempt.advance(CheckoutPhase::Committing);
        let sale_date = now.date_naive();
        let sale_time = now.time().with_nanosecond(0).unwrap_or_else(|| now.time());

        let invoice = Invoice {
            invoice_id: invoice_id.to_string(),
            client_name: trimmed(request.client_name.as_deref()),
            client_phone: trimmed(request.client_phone.as_deref()),
            total_cents: settlement.total.cents(),
            amount_received_cents: settlement.received.cents(),
            change_cents: settlement.change.cents(),
            payment_method: request.payment_method,
            invoice_date: sale_date,
            created_at: now,
        };
        insert_invoice(&mut **tx, &invoice)
            .await
            .map_err(|err| attempt.roll_back(err))?;

        for line in &plan.lines {
            insert_sale_line(
                &mut **tx,
                invoice_id,
                line,
                request.payment_method,
                sale_date,
                sale_time,
            )
            .await
            .map_err(|err| attempt.roll_back(err))?;
        }

        Ok(CheckoutReceipt {
            invoice_id: invoice.invoice_id,
            total_amount: settlement.total,
            amount_received: settlement.received,
            change_amount: settlement.change,
            payment_method: request.payment_method,
            sale_date,
            sale_time,
            lines: plan.receipt_lines(),
        })
    }

    /// Places a customer order.
    ///
    /// Prices come from the stored products. Unlike a cashier checkout,
    /// every short line is reported at once.
    pub async fn place_order(
        &self,
        request: &OrderRequest,
    ) -> Result<OrderConfirmation, CheckoutError> {
        let mut attempt = Attempt::start("order");

        if let Err(err) = validate_order_request(request) {
            return Err(attempt.reject(err.into()));
        }

        let now = self.clock.now();
        attempt.advance(CheckoutPhase::Validating);

        let mut tx = match self.pool.begin().await {
            Ok(tx) => tx,
            Err(err) => return Err(attempt.roll_back(err.into())),
        };

        let confirmation = match self.order(&mut tx, &mut attempt, request, now).await {
            Ok(confirmation) => confirmation,
            Err(err) => {
                release(tx).await;
                return Err(err);
            }
        };

        if let Err(err) = tx.commit().await {
            return Err(attempt.roll_back(DbError::TransactionFailed(err.to_string())));
        }
        attempt.advance(CheckoutPhase::Committed);

        info!(
            order_id = confirmation.order_id,
            total = %confirmation.total_amount,
            "Order committed"
        );
        Ok(confirmation)
    }

    async fn order(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        attempt: &mut Attempt,
        request: &OrderRequest,
        now: DateTime<Utc>,
    ) -> Result<OrderConfirmation, CheckoutError> {
        let plan = self.plan(tx, attempt, &request.cart, CartPlan::for_order).await?;

        attempt.advance(CheckoutPhase::Reserving);
        for update in &plan.stock_updates {
            decrement_stock(&mut **tx, update, now)
                .await
                .map_err(|err| attempt.roll_back(err))?;
        }

        attempt.advance(CheckoutPhase::Committing);
        let order_id = insert_order(&mut **tx, request.customer_name.trim(), plan.total, now)
            .await
            .map_err(|err| attempt.roll_back(err))?;
        for line in &plan.lines {
            insert_order_line(&mut **tx, order_id, line)
                .await
                .map_err(|err| attempt.roll_back(err))?;
        }

        Ok(OrderConfirmation {
            order_id,
            total_amount: plan.total,
            lines: plan.receipt_lines(),
        })
    }

    /// Locks, snapshots the referenced products and runs the planner.
    async fn plan(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        attempt: &mut Attempt,
        cart: &[CartLine],
        planner: Planner,
    ) -> Result<CartPlan, CheckoutError> {
        lock_for_write(&mut **tx)
            .await
            .map_err(|err| attempt.roll_back(err))?;

        let catalogue = fetch_catalogue(&mut **tx, &distinct_codes(cart))
            .await
            .map_err(|err| attempt.roll_back(err))?;

        planner(cart, &catalogue).map_err(|err| attempt.reject(err))
    }
}

// =============================================================================
// Phase tracking
// =============================================================================

/// Logs the phases of one attempt.
struct Attempt {
    flow: &'static str,
    phase: CheckoutPhase,
}

impl Attempt {
    fn start(flow: &'static str) -> Self {
        debug!(flow, phase = ?CheckoutPhase::Started, "Checkout phase");
        Attempt {
            flow,
            phase: CheckoutPhase::Started,
        }
    }

    fn advance(&mut self, next: CheckoutPhase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "illegal checkout transition {:?} -> {:?}",
            self.phase,
            next
        );
        debug!(flow = self.flow, from = ?self.phase, to = ?next, "Checkout phase");
        self.phase = next;
    }

    fn reject(&mut self, err: CoreError) -> CheckoutError {
        self.advance(CheckoutPhase::Rejected);
        warn!(flow = self.flow, kind = ?err.kind(), error = %err, "Checkout rejected");
        CheckoutError::Rejected(err)
    }

    fn roll_back(&mut self, err: DbError) -> CheckoutError {
        self.advance(CheckoutPhase::RolledBack);
        warn!(flow = self.flow, error = %err, "Checkout rolled back");
        CheckoutError::Storage(err)
    }
}

/// Rolls back now rather than on drop, so the write lock is free before
/// the caller sees the error.
async fn release(tx: Transaction<'_, Sqlite>) {
    if let Err(err) = tx.rollback().await {
        warn!(error = %err, "Rollback failed");
    }
}

fn distinct_codes(cart: &[CartLine]) -> Vec<String> {
    let mut codes: Vec<String> = Vec::with_capacity(cart.len());
    for line in cart {
        if !codes.contains(&line.code) {
            codes.push(line.code.clone());
        }
    }
    codes
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::{NaiveDate, TimeZone};
    use datahouse_core::{
        CheckoutErrorKind, FixedClock, Money, NewProduct, PaymentMethod, ValidationError,
    };

    struct SequentialIds;

    impl InvoiceIdGenerator for SequentialIds {
        fn next_id(&self, now: DateTime<Utc>) -> String {
            format!("INV-{}-{}", now.format("%Y%m%d"), now.timestamp_subsec_nanos())
        }
    }

    struct RepeatedId(&'static str);

    impl InvoiceIdGenerator for RepeatedId {
        fn next_id(&self, _now: DateTime<Utc>) -> String {
            self.0.to_string()
        }
    }

    async fn setup(products: &[(&str, &str, i64, i64)]) -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        for (code, name, price_cents, quantity) in products {
            db.products()
                .insert(&NewProduct {
                    code: Some(code.to_string()),
                    name: name.to_string(),
                    price: Money::from_cents(*price_cents),
                    quantity: *quantity,
                    description: format!("{name} description"),
                    image: None,
                })
                .await
                .unwrap();
        }
        db
    }

    fn request(cart: Vec<CartLine>, received: &str) -> CheckoutRequest {
        CheckoutRequest {
            cart,
            payment_method: PaymentMethod::Cash,
            amount_received: received.parse().unwrap(),
            client_name: Some("Amina".to_string()),
            client_phone: None,
        }
    }

    async fn stock(db: &Database, code: &str) -> i64 {
        db.products().get_by_code(code).await.unwrap().unwrap().quantity
    }

    #[tokio::test]
    async fn test_successful_checkout() {
        let db = setup(&[("P1", "Tea", 1000, 5)]).await;

        let receipt = db
            .checkout()
            .checkout(&request(vec![CartLine::new("P1", 2)], "25.00"))
            .await
            .unwrap();

        assert_eq!(receipt.total_amount.to_string(), "20.00");
        assert_eq!(receipt.change_amount.to_string(), "5.00");
        assert_eq!(stock(&db, "P1").await, 3);

        let invoice = db
            .sales()
            .get_invoice(&receipt.invoice_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(invoice.total(), Money::from_cents(2000));
        assert_eq!(invoice.change(), Money::from_cents(500));
        assert_eq!(invoice.client_name.as_deref(), Some("Amina"));
        assert_eq!(invoice.payment_method, PaymentMethod::Cash);

        let sales = db
            .sales()
            .list_sales_for_invoice(&receipt.invoice_id)
            .await
            .unwrap();
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].product_name, "Tea");
        assert_eq!(sales[0].line_total(), Money::from_cents(2000));
    }

    #[tokio::test]
    async fn test_insufficient_payment_leaves_no_trace() {
        let db = setup(&[("P1", "Tea", 1000, 3)]).await;

        let err = db
            .checkout()
            .checkout(&request(vec![CartLine::new("P1", 2)], "10.00"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), CheckoutErrorKind::InsufficientPayment);
        assert_eq!(stock(&db, "P1").await, 3);
        assert_eq!(db.sales().count_sales().await.unwrap(), 0);
        assert!(db.sales().list_invoices(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_code_writes_nothing() {
        let db = setup(&[("P1", "Tea", 1000, 3)]).await;

        let err = db
            .checkout()
            .checkout(&request(
                vec![CartLine::new("P1", 1), CartLine::new("X9", 1)],
                "100",
            ))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), CheckoutErrorKind::ProductNotFound);
        assert!(err.to_string().contains("X9"));
        assert_eq!(stock(&db, "P1").await, 3);
        assert_eq!(db.sales().count_sales().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_codes_in_one_cart() {
        let db = setup(&[("P1", "Tea", 1000, 3)]).await;

        let receipt = db
            .checkout()
            .checkout(&request(
                vec![CartLine::new("P1", 1), CartLine::new("P1", 1)],
                "20",
            ))
            .await
            .unwrap();

        assert!(receipt.change_amount.is_zero());
        assert_eq!(stock(&db, "P1").await, 1);
        let sales = db
            .sales()
            .list_sales_for_invoice(&receipt.invoice_id)
            .await
            .unwrap();
        assert_eq!(sales.len(), 2);
    }

    #[tokio::test]
    async fn test_insufficient_stock_names_product() {
        let db = setup(&[("P1", "Tea", 1000, 1), ("P2", "Rice", 300, 10)]).await;

        let err = db
            .checkout()
            .checkout(&request(
                vec![CartLine::new("P2", 1), CartLine::new("P1", 2)],
                "100",
            ))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), CheckoutErrorKind::InsufficientStock);
        assert!(err.to_string().contains("Tea"));
        assert_eq!(stock(&db, "P2").await, 10);
    }

    #[tokio::test]
    async fn test_invalid_input_rejected_before_store() {
        let db = setup(&[]).await;

        let err = db
            .checkout()
            .checkout(&request(vec![], "10"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Rejected(CoreError::Validation(ValidationError::Required { .. }))
        ));

        let err = db
            .checkout()
            .checkout(&request(vec![CartLine::new("P1", 0)], "10"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), CheckoutErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_pinned_clock_and_ids() {
        let db = setup(&[("P1", "Tea", 1000, 5)]).await;
        let instant = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        let engine = db
            .checkout()
            .with_clock(Arc::new(FixedClock(instant)))
            .with_invoice_ids(Arc::new(SequentialIds));

        let receipt = engine
            .checkout(&request(vec![CartLine::new("P1", 1)], "10"))
            .await
            .unwrap();

        assert_eq!(receipt.invoice_id, "INV-20260314-0");
        assert_eq!(receipt.sale_date, NaiveDate::from_ymd_opt(2026, 3, 14).unwrap());
        assert_eq!(receipt.sale_time.to_string(), "09:26:53");

        let sales = db
            .sales()
            .list_sales_for_invoice("INV-20260314-0")
            .await
            .unwrap();
        assert_eq!(sales[0].sale_date, receipt.sale_date);
        assert_eq!(sales[0].sale_time, receipt.sale_time);
    }

    /// The invoice insert fails after the stock update already ran; the
    /// decrement must go with it.
    #[tokio::test]
    async fn test_failure_after_stock_write_rolls_back() {
        let db = setup(&[("P1", "Tea", 1000, 5)]).await;
        let engine = db.checkout().with_invoice_ids(Arc::new(RepeatedId("INV-SAME")));

        engine
            .checkout(&request(vec![CartLine::new("P1", 1)], "10"))
            .await
            .unwrap();

        let err = engine
            .checkout(&request(vec![CartLine::new("P1", 2)], "20"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), CheckoutErrorKind::StorageFailure);
        assert!(err.to_string().contains("INV-SAME"));
        assert_eq!(stock(&db, "P1").await, 4);
        assert_eq!(db.sales().count_sales().await.unwrap(), 1);
        assert_eq!(db.sales().list_invoices(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_large_quantity_and_free_form_codes() {
        let db = setup(&[("P1", "Rice", 100, 5000)]).await;

        let receipt = db
            .checkout()
            .checkout(&request(vec![CartLine::new("P1", 1000)], "1000.00"))
            .await
            .unwrap();
        assert_eq!(receipt.total_amount.to_string(), "1000.00");
        assert_eq!(stock(&db, "P1").await, 4000);

        let err = db
            .checkout()
            .checkout(&request(vec![CartLine::new("shelf.2/a", 1)], "1"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), CheckoutErrorKind::ProductNotFound);
    }

    #[tokio::test]
    async fn test_reports_reflect_committed_sales_only() {
        let db = setup(&[("P1", "Tea", 1000, 10), ("P2", "Rice", 300, 10)]).await;
        let engine = db.checkout();

        engine
            .checkout(&request(
                vec![CartLine::new("P1", 2), CartLine::new("P2", 5)],
                "50",
            ))
            .await
            .unwrap();
        engine
            .checkout(&request(vec![CartLine::new("P1", 1)], "10"))
            .await
            .unwrap();
        // Rejected: short payment
        engine
            .checkout(&request(vec![CartLine::new("P2", 5)], "1"))
            .await
            .unwrap_err();

        let top = db.reports().top_products(0).await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].product_name, "Rice");
        assert_eq!(top[0].total_sold, 5);
        assert_eq!(top[1].product_name, "Tea");
        assert_eq!(top[1].total_sold, 3);

        let daily = db.reports().daily_sales().await.unwrap();
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].total_sales(), Money::from_cents(4500));

        let invoices = db.sales().list_invoices(10).await.unwrap();
        assert_eq!(invoices.len(), 2);
    }

    #[tokio::test]
    async fn test_place_order() {
        let db = setup(&[("1", "Rice", 300, 10), ("2", "Tea", 500, 4)]).await;

        let confirmation = db
            .checkout()
            .place_order(&OrderRequest {
                cart: vec![CartLine::new("1", 2), CartLine::new("2", 1)],
                customer_name: " Karim ".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(confirmation.total_amount, Money::from_cents(1100));
        assert_eq!(stock(&db, "1").await, 8);
        assert_eq!(stock(&db, "2").await, 3);

        let order = db
            .orders()
            .get_order(confirmation.order_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(order.customer_name, "Karim");
        assert_eq!(order.total_cents, 1100);

        let lines = db
            .orders()
            .list_order_lines(confirmation.order_id)
            .await
            .unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].unit_price_cents, 500);
    }

    #[tokio::test]
    async fn test_order_reports_every_short_line() {
        let db = setup(&[
            ("1", "Rice", 300, 0),
            ("2", "Tea", 500, 4),
            ("3", "Oil", 900, 1),
        ])
        .await;

        let err = db
            .checkout()
            .place_order(&OrderRequest {
                cart: vec![
                    CartLine::new("1", 1),
                    CartLine::new("2", 1),
                    CartLine::new("3", 2),
                ],
                customer_name: "Karim".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), CheckoutErrorKind::InsufficientStock);
        assert_eq!(err.to_string(), "Insufficient stock for: Rice, Oil");
        assert_eq!(stock(&db, "2").await, 4);
        assert!(db.orders().list_orders(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_order_requires_customer_name() {
        let db = setup(&[("1", "Rice", 300, 5)]).await;

        let err = db
            .checkout()
            .place_order(&OrderRequest {
                cart: vec![CartLine::new("1", 1)],
                customer_name: String::new(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), CheckoutErrorKind::InvalidInput);
        assert_eq!(stock(&db, "1").await, 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_checkouts_on_last_unit() {
        let dir = tempfile::tempdir().unwrap();
        let config = DbConfig::new(dir.path().join("pos.db")).max_connections(4);
        let db = Database::new(config).await.unwrap();
        db.products()
            .insert(&NewProduct {
                code: Some("P1".to_string()),
                name: "Tea".to_string(),
                price: Money::from_cents(1000),
                quantity: 1,
                description: "Last box".to_string(),
                image: None,
            })
            .await
            .unwrap();

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let engine = db.checkout();
                let request = request(vec![CartLine::new("P1", 1)], "10");
                tokio::spawn(async move { engine.checkout(&request).await })
            })
            .collect();

        let mut committed = 0;
        let mut short = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => committed += 1,
                Err(err) => {
                    assert_eq!(err.kind(), CheckoutErrorKind::InsufficientStock);
                    short += 1;
                }
            }
        }

        assert_eq!((committed, short), (1, 1));
        assert_eq!(stock(&db, "P1").await, 0);
        assert_eq!(db.sales().count_sales().await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_stock_never_negative_under_load() {
        let dir = tempfile::tempdir().unwrap();
        let config = DbConfig::new(dir.path().join("pos.db")).max_connections(5);
        let db = Database::new(config).await.unwrap();
        db.products()
            .insert(&NewProduct {
                code: Some("P1".to_string()),
                name: "Tea".to_string(),
                price: Money::from_cents(250),
                quantity: 7,
                description: "Boxes".to_string(),
                image: None,
            })
            .await
            .unwrap();

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let engine = db.checkout();
                let request = request(vec![CartLine::new("P1", 2)], "5");
                tokio::spawn(async move { engine.checkout(&request).await })
            })
            .collect();

        let mut committed = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                committed += 1;
            }
        }

        assert_eq!(committed, 3);
        assert_eq!(stock(&db, "P1").await, 1);
    }
}
