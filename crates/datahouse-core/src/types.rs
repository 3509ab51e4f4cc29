//! # Domain Types
//!
//! Core domain types used throughout Datahouse POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    Invoice      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  code (key)     │   │  one per line   │   │  one per        │       │
//! │  │  price_cents    │   │  invoice_id ────┼──►│  checkout       │       │
//! │  │  quantity ≥ 0   │   │  line_total     │   │  total / change │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   CartLine      │   │ PaymentMethod   │   │  Order (+lines) │       │
//! │  │  (ephemeral)    │   │  Cash | Card    │   │  customer order │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Sale, Invoice and Order rows are append-only: created by exactly one
//! successful transaction and never mutated afterwards.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Business key, unique across the catalogue.
    pub code: String,

    /// Display name shown to cashier and on receipts.
    pub name: String,

    /// Price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Units in stock. Never negative.
    pub quantity: i64,

    pub description: String,

    /// Reference (path or URL) returned by the file store for the image.
    pub image: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

/// Fields for creating a product.
///
/// When `code` is `None` the store allocates the next numeric code.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub code: Option<String>,
    pub name: String,
    #[ts(as = "String")]
    pub price: Money,
    pub quantity: i64,
    pub description: String,
    pub image: Option<String>,
}

/// Fields for updating a product.
///
/// An `image` of `None` keeps the stored reference.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub name: String,
    #[ts(as = "String")]
    pub price: Money,
    pub quantity: i64,
    pub description: String,
    pub image: Option<String>,
}

// =============================================================================
// Cart
// =============================================================================

/// One requested product in a cart. Consumed once per checkout attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub code: String,
    pub quantity: i64,
}

impl CartLine {
    pub fn new(code: impl Into<String>, quantity: i64) -> Self {
        CartLine {
            code: code.into(),
            quantity,
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on an external terminal.
    Card,
}

impl PaymentMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses the enumerated string sent by the cashier page.
///
/// `credit` and `debit` are accepted as card aliases; anything else is
/// rejected rather than guessed.
impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" | "credit" | "debit" => Ok(PaymentMethod::Card),
            _ => Err(ValidationError::NotAllowed {
                field: "paymentMethod".to_string(),
                allowed: vec!["cash".to_string(), "card".to_string()],
            }),
        }
    }
}

// =============================================================================
// Checkout Request / Receipt
// =============================================================================

/// Everything the cashier submits for one checkout.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub cart: Vec<CartLine>,
    pub payment_method: PaymentMethod,
    #[ts(as = "String")]
    pub amount_received: Money,
    pub client_name: Option<String>,
    pub client_phone: Option<String>,
}

/// One sold line as reported back to the cashier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLine {
    pub code: String,
    pub name: String,
    pub quantity: i64,
    #[ts(as = "String")]
    pub unit_price: Money,
    #[ts(as = "String")]
    pub line_total: Money,
}

/// Result of a committed checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    pub invoice_id: String,
    #[ts(as = "String")]
    pub total_amount: Money,
    #[ts(as = "String")]
    pub amount_received: Money,
    #[ts(as = "String")]
    pub change_amount: Money,
    pub payment_method: PaymentMethod,
    #[ts(as = "String")]
    pub sale_date: NaiveDate,
    #[ts(as = "String")]
    pub sale_time: NaiveTime,
    pub lines: Vec<ReceiptLine>,
}

impl CheckoutReceipt {
    /// The compact success payload returned to the cashier page.
    pub fn to_response(&self) -> CheckoutResponse {
        CheckoutResponse {
            success: true,
            invoice_id: self.invoice_id.clone(),
            total_amount: self.total_amount,
            change: self.change_amount,
        }
    }
}

/// `{ success, invoiceId, totalAmount, change }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub success: bool,
    pub invoice_id: String,
    #[ts(as = "String")]
    pub total_amount: Money,
    #[ts(as = "String")]
    pub change: Money,
}

// =============================================================================
// Sale
// =============================================================================

/// One persisted line of a checkout. Product name and price are frozen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: i64,
    pub invoice_id: String,
    pub product_code: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
    pub payment_method: PaymentMethod,
    #[ts(as = "String")]
    pub sale_date: NaiveDate,
    #[ts(as = "String")]
    pub sale_time: NaiveTime,
}

impl Sale {
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Invoice
// =============================================================================

/// The durable record of one completed checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Invoice {
    pub invoice_id: String,
    pub client_name: Option<String>,
    pub client_phone: Option<String>,
    pub total_cents: i64,
    pub amount_received_cents: i64,
    pub change_cents: i64,
    pub payment_method: PaymentMethod,
    #[ts(as = "String")]
    pub invoice_date: NaiveDate,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn change(&self) -> Money {
        Money::from_cents(self.change_cents)
    }
}

// =============================================================================
// Customer Orders
// =============================================================================

/// A customer order submitted from the client page.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub cart: Vec<CartLine>,
    pub customer_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: i64,
    pub customer_name: String,
    pub total_cents: i64,
    #[ts(as = "String")]
    pub order_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderLine {
    pub id: i64,
    pub order_id: i64,
    pub product_code: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

/// Result of a committed customer order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    pub order_id: i64,
    #[ts(as = "String")]
    pub total_amount: Money,
    pub lines: Vec<ReceiptLine>,
}

// =============================================================================
// Reports
// =============================================================================

/// A row of the best-sellers report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    pub product_name: String,
    pub total_sold: i64,
}

/// A row of the daily sales report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DailySales {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub total_sales_cents: i64,
}

impl DailySales {
    #[inline]
    pub fn total_sales(&self) -> Money {
        Money::from_cents(self.total_sales_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_method_parsing() {
        assert_eq!("cash".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert_eq!(" CARD ".parse::<PaymentMethod>().unwrap(), PaymentMethod::Card);
        assert_eq!("debit".parse::<PaymentMethod>().unwrap(), PaymentMethod::Card);
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_checkout_request_wire_shape() {
        let json = r#"{
            "cart": [{"code": "P1", "quantity": 2}],
            "paymentMethod": "cash",
            "amountReceived": 25.00,
            "clientName": "Amina",
            "clientPhone": null
        }"#;
        let request: CheckoutRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.cart, vec![CartLine::new("P1", 2)]);
        assert_eq!(request.payment_method, PaymentMethod::Cash);
        assert_eq!(request.amount_received, Money::from_cents(2500));
        assert_eq!(request.client_phone, None);
    }

    #[test]
    fn test_amount_received_is_in_currency_units() {
        let read = |amount: &str| {
            let json = format!(
                r#"{{"cart":[{{"code":"P1","quantity":1}}],"paymentMethod":"card","amountReceived":{amount}}}"#
            );
            serde_json::from_str::<CheckoutRequest>(&json)
                .unwrap()
                .amount_received
        };

        assert_eq!(read("25"), Money::from_cents(2500));
        assert_eq!(read("19.9"), Money::from_cents(1990));
        assert_eq!(read(r#""7.05""#), Money::from_cents(705));
    }

    #[test]
    fn test_receipt_response() {
        let receipt = CheckoutReceipt {
            invoice_id: "INV-1".to_string(),
            total_amount: Money::from_cents(2000),
            amount_received: Money::from_cents(2500),
            change_amount: Money::from_cents(500),
            payment_method: PaymentMethod::Cash,
            sale_date: NaiveDate::from_ymd_opt(2026, 10, 17).unwrap(),
            sale_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            lines: vec![],
        };

        let value = serde_json::to_value(receipt.to_response()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "success": true,
                "invoiceId": "INV-1",
                "totalAmount": "20.00",
                "change": "5.00"
            })
        );
    }
}
