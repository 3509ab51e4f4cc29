//! # Checkout Planning
//!
//! The pure half of a checkout: given a cart and a snapshot of the products
//! it references, decide every line, the stock each product ends with, the
//! total, and whether the payment covers it. Nothing here writes anything;
//! the data crate applies a finished plan inside one transaction.
//!
//! ## Checkout State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Started ──► Validating ──► Reserving ──► Committing ──► Committed      │
//! │     │            │  │           │              │                        │
//! │     │            │  └───────────┴──────────────┴──► RolledBack          │
//! │     │            ▼                                                      │
//! │     └──────► Rejected(reason)                                           │
//! │                                                                         │
//! │  Validating = read-only: lookups, stock checks, totals, payment        │
//! │  Reserving  = stock write-back inside the transaction                  │
//! │  Committing = sale rows + invoice + COMMIT                             │
//! │  No partial-commit state is observable from outside.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Duplicate Codes
//! Lines are folded in the order submitted. A second line for the same code
//! sees the stock left by the first one.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{CoreError, CoreResult, Shortfall, ValidationError};
use crate::money::Money;
use crate::types::{CartLine, Product, ReceiptLine};

// =============================================================================
// Phase
// =============================================================================

/// Where a checkout attempt currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutPhase {
    Started,
    Validating,
    Rejected,
    Reserving,
    Committing,
    Committed,
    RolledBack,
}

impl CheckoutPhase {
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            CheckoutPhase::Rejected | CheckoutPhase::Committed | CheckoutPhase::RolledBack
        )
    }

    /// Whether `next` is a legal successor of this phase.
    pub const fn can_transition_to(&self, next: CheckoutPhase) -> bool {
        use CheckoutPhase::*;
        matches!(
            (*self, next),
            (Started, Validating)
                | (Started, Rejected)
                | (Validating, Rejected)
                | (Validating, Reserving)
                | (Validating, RolledBack)
                | (Reserving, Committing)
                | (Reserving, RolledBack)
                | (Committing, Committed)
                | (Committing, RolledBack)
        )
    }
}

// =============================================================================
// Plan
// =============================================================================

/// One cart line after pricing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedLine {
    pub code: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
}

impl PlannedLine {
    pub fn to_receipt_line(&self) -> ReceiptLine {
        ReceiptLine {
            code: self.code.clone(),
            name: self.name.clone(),
            quantity: self.quantity,
            unit_price: self.unit_price,
            line_total: self.line_total,
        }
    }
}

/// Net stock change for one product, summed over all of its cart lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockUpdate {
    pub code: String,
    /// Stock read at the start of the transaction.
    pub before: i64,
    /// Units leaving stock.
    pub decrement: i64,
}

impl StockUpdate {
    #[inline]
    pub fn after(&self) -> i64 {
        self.before - self.decrement
    }
}

/// Payment outcome of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    pub total: Money,
    pub received: Money,
    pub change: Money,
}

/// A fully evaluated cart, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartPlan {
    pub lines: Vec<PlannedLine>,
    /// In first-seen cart order, one entry per product.
    pub stock_updates: Vec<StockUpdate>,
    pub total: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShortfallPolicy {
    /// Stop at the first short line.
    FailFast,
    /// Keep going and report every short line together.
    CollectAll,
}

impl CartPlan {
    /// Plans a cashier checkout: the first failing line, in cart order,
    /// decides the error.
    ///
    /// ## Example
    /// ```rust
    /// use std::collections::HashMap;
    /// use chrono::Utc;
    /// use datahouse_core::{CartLine, CartPlan, Money, Product};
    ///
    /// let p1 = Product {
    ///     code: "P1".into(), name: "Tea".into(), price_cents: 1000, quantity: 5,
    ///     description: "Green tea".into(), image: None,
    ///     created_at: Utc::now(), updated_at: Utc::now(),
    /// };
    /// let catalogue = HashMap::from([("P1".to_string(), p1)]);
    ///
    /// let plan = CartPlan::for_checkout(&[CartLine::new("P1", 2)], &catalogue).unwrap();
    /// assert_eq!(plan.total, Money::from_cents(2000));
    /// assert_eq!(plan.stock_updates[0].after(), 3);
    /// ```
    pub fn for_checkout(cart: &[CartLine], catalogue: &HashMap<String, Product>) -> CoreResult<Self> {
        Self::fold(cart, catalogue, ShortfallPolicy::FailFast)
    }

    /// Plans a customer order: unknown codes fail immediately, but every
    /// short line is collected into one [`CoreError::StockShortfall`].
    pub fn for_order(cart: &[CartLine], catalogue: &HashMap<String, Product>) -> CoreResult<Self> {
        Self::fold(cart, catalogue, ShortfallPolicy::CollectAll)
    }

    fn fold(
        cart: &[CartLine],
        catalogue: &HashMap<String, Product>,
        policy: ShortfallPolicy,
    ) -> CoreResult<Self> {
        let acc = cart
            .iter()
            .try_fold(Accumulator::default(), |acc, line| {
                acc.apply(line, catalogue, policy)
            })?;
        acc.finish(catalogue)
    }

    /// Checks the tendered amount against the total and computes change.
    ///
    /// Exact payment is accepted with zero change.
    pub fn settle(&self, received: Money) -> CoreResult<Settlement> {
        if received < self.total {
            return Err(CoreError::InsufficientPayment {
                total: self.total,
                received,
            });
        }

        let change = received
            .checked_sub(self.total)
            .ok_or_else(|| ValidationError::Overflow {
                field: "change".to_string(),
            })?;

        Ok(Settlement {
            total: self.total,
            received,
            change,
        })
    }

    pub fn receipt_lines(&self) -> Vec<ReceiptLine> {
        self.lines.iter().map(PlannedLine::to_receipt_line).collect()
    }
}

/// Running state of the fold over cart lines.
#[derive(Debug, Default)]
struct Accumulator {
    lines: Vec<PlannedLine>,
    remaining: HashMap<String, i64>,
    touched: Vec<String>,
    total: Money,
    shortfalls: Vec<Shortfall>,
}

impl Accumulator {
    fn apply(
        mut self,
        line: &CartLine,
        catalogue: &HashMap<String, Product>,
        policy: ShortfallPolicy,
    ) -> CoreResult<Self> {
        let product = catalogue
            .get(&line.code)
            .ok_or_else(|| CoreError::ProductNotFound {
                code: line.code.clone(),
            })?;

        let available = match self.remaining.get(&line.code) {
            Some(left) => *left,
            None => {
                self.touched.push(line.code.clone());
                self.remaining.insert(line.code.clone(), product.quantity);
                product.quantity
            }
        };

        if line.quantity > available {
            return match policy {
                ShortfallPolicy::FailFast => Err(CoreError::InsufficientStock {
                    code: product.code.clone(),
                    name: product.name.clone(),
                    available,
                    requested: line.quantity,
                }),
                ShortfallPolicy::CollectAll => {
                    self.shortfalls.push(Shortfall {
                        code: product.code.clone(),
                        name: product.name.clone(),
                        available,
                        requested: line.quantity,
                    });
                    Ok(self)
                }
            };
        }

        let unit_price = product.price();
        let line_total = unit_price
            .checked_mul_quantity(line.quantity)
            .ok_or_else(|| ValidationError::Overflow {
                field: "lineTotal".to_string(),
            })?;
        self.total = self
            .total
            .checked_add(line_total)
            .ok_or_else(|| ValidationError::Overflow {
                field: "totalAmount".to_string(),
            })?;

        self.remaining
            .insert(line.code.clone(), available - line.quantity);
        self.lines.push(PlannedLine {
            code: product.code.clone(),
            name: product.name.clone(),
            quantity: line.quantity,
            unit_price,
            line_total,
        });

        Ok(self)
    }

    fn finish(self, catalogue: &HashMap<String, Product>) -> CoreResult<CartPlan> {
        if !self.shortfalls.is_empty() {
            return Err(CoreError::StockShortfall(self.shortfalls));
        }

        let stock_updates = self
            .touched
            .iter()
            .filter_map(|code| {
                let before = catalogue.get(code)?.quantity;
                let after = *self.remaining.get(code)?;
                (before != after).then(|| StockUpdate {
                    code: code.clone(),
                    before,
                    decrement: before - after,
                })
            })
            .collect();

        Ok(CartPlan {
            lines: self.lines,
            stock_updates,
            total: self.total,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
