//! # Error Types
//!
//! Domain-specific error types for datahouse-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  datahouse-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule rejections                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  datahouse-db errors (separate crate)                                  │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── CheckoutError    - Rejected(CoreError) | Storage(DbError)         │
//! │                                                                         │
//! │  Every failure maps onto one CheckoutErrorKind for the caller.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Error Kind
// =============================================================================

/// Machine-readable failure kind surfaced to callers of the checkout engine.
///
/// ## Serialization
/// ```json
/// { "kind": "INSUFFICIENT_STOCK", "message": "Insufficient stock for Milk ..." }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckoutErrorKind {
    ProductNotFound,
    InsufficientStock,
    InsufficientPayment,
    StorageFailure,
    InvalidInput,
}

impl CheckoutErrorKind {
    /// Whether the failure was caused by the request rather than the store.
    ///
    /// The routing layer maps `true` to 400 and `false` to 500.
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, CheckoutErrorKind::StorageFailure)
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// One cart line that could not be served from stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Shortfall {
    pub code: String,
    pub name: String,
    pub available: i64,
    pub requested: i64,
}

/// Business rule rejections.
///
/// None of these leave a trace in the store: they are raised before any
/// write is made durable.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A cart line references a product code that does not exist.
    #[error("Product not found: {code}")]
    ProductNotFound { code: String },

    /// A cart line asks for more units than remain.
    ///
    /// ## User Workflow
    /// ```text
    /// Cart: [{P1, 2}, {P1, 2}]     stock(P1) = 3
    ///      │
    ///      ▼
    /// line 1 takes 2 → 1 left
    ///      │
    ///      ▼
    /// line 2 wants 2 → InsufficientStock { available: 1, requested: 2 }
    /// ```
    #[error("Insufficient stock for {name} ({code}): available {available}, requested {requested}")]
    InsufficientStock {
        code: String,
        name: String,
        available: i64,
        requested: i64,
    },

    /// Several order lines are short at once (customer orders report all).
    #[error("Insufficient stock for: {}", names(.0))]
    StockShortfall(Vec<Shortfall>),

    /// The amount tendered does not cover the cart total.
    #[error("Insufficient payment: total {total}, received {received}")]
    InsufficientPayment { total: Money, received: Money },

    /// Input validation error (empty cart, non-positive quantity, ...).
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Returns the machine-readable kind of this error.
    pub fn kind(&self) -> CheckoutErrorKind {
        match self {
            CoreError::ProductNotFound { .. } => CheckoutErrorKind::ProductNotFound,
            CoreError::InsufficientStock { .. } | CoreError::StockShortfall(_) => {
                CheckoutErrorKind::InsufficientStock
            }
            CoreError::InsufficientPayment { .. } => CheckoutErrorKind::InsufficientPayment,
            CoreError::Validation(_) => CheckoutErrorKind::InvalidInput,
        }
    }
}

fn names(shortfalls: &[Shortfall]) -> String {
    shortfalls
        .iter()
        .map(|s| s.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These are raised before the store is touched.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., malformed decimal amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Arithmetic left the representable range.
    #[error("{field} is too large")]
    Overflow { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
