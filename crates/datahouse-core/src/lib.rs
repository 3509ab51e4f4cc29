//! # datahouse-core: Pure Business Logic for Datahouse POS
//!
//! This crate contains the business rules of the point-of-sale back office
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Datahouse POS Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │           HTTP routes / session store (outside)                 │   │
//! │  │    /process-sale, /process-order, /products, /topProducts       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                datahouse-db (CheckoutEngine)                    │   │
//! │  │       one SQLite transaction per checkout / order               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ calls                                  │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            ★ datahouse-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌───────────┐ ┌────────────────┐   │   │
//! │  │   │  types   │ │  money   │ │ checkout  │ │   validation   │   │   │
//! │  │   │ Product  │ │  Money   │ │ CartPlan  │ │     rules      │   │   │
//! │  │   │ Invoice  │ │          │ │ Phase     │ │                │   │   │
//! │  │   └──────────┘ └──────────┘ └───────────┘ └────────────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, CartLine, Sale, Invoice, Order, reports)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`checkout`] - Cart planning and the checkout state machine
//! - [`ports`] - Clock and invoice-id generator seams
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//!
//! ## Example Usage
//!
//! ```rust
//! use datahouse_core::money::Money;
//!
//! let price: Money = "10.00".parse().unwrap();
//! let total = price.checked_mul_quantity(2).unwrap();
//! let received: Money = "25.00".parse().unwrap();
//!
//! assert_eq!(received.checked_sub(total).unwrap().to_string(), "5.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod money;
pub mod ports;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use checkout::{CartPlan, CheckoutPhase, PlannedLine, Settlement, StockUpdate};
pub use error::{CheckoutErrorKind, CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use ports::{Clock, FixedClock, InvoiceIdGenerator, SystemClock, UuidInvoiceIds};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default number of rows returned by the top-products report.
pub const DEFAULT_TOP_PRODUCTS: u32 = 10;
