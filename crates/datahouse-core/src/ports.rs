//! # Ports
//!
//! Collaborators the checkout engine consumes but does not own: a clock for
//! the sale stamp and a generator for invoice identifiers.
//!
//! Both are traits so tests can pin time and ids; production uses
//! [`SystemClock`] and [`UuidInvoiceIds`].

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Produces invoice identifiers.
///
/// Implementations must not collide under concurrent use; a timestamp alone
/// is not enough.
pub trait InvoiceIdGenerator: Send + Sync {
    fn next_id(&self, now: DateTime<Utc>) -> String;
}

/// `INV-<yyyymmdd>-<uuid v4, 32 hex chars>`
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use datahouse_core::ports::{InvoiceIdGenerator, UuidInvoiceIds};
///
/// let id = UuidInvoiceIds.next_id(Utc::now());
/// assert!(id.starts_with("INV-"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidInvoiceIds;

impl InvoiceIdGenerator for UuidInvoiceIds {
    fn next_id(&self, now: DateTime<Utc>) -> String {
        format!("INV-{}-{}", now.format("%Y%m%d"), Uuid::new_v4().simple())
    }
}
