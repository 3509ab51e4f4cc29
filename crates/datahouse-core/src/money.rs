//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  A cashier page that sums prices in floats:                            │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Thousands of small sales later, totals and change drift.              │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Minor Units                                      │
//! │    "10.00" is parsed straight into 1000 cents, never into an f64       │
//! │    Line totals, cart totals and change are exact integer math          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use datahouse_core::money::Money;
//!
//! let price = Money::from_cents(1099);          // 10.99
//! let line = price.checked_mul_quantity(3);     // Some(32.97)
//! let received: Money = "40".parse().unwrap();  // 40.00
//!
//! assert_eq!(line.unwrap().cents(), 3297);
//! assert_eq!(received.cents(), 4000);
//! ```

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Differences such as change can be computed before
///   they are checked for sign
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Serde**: Written as a decimal string (`"20.00"`). Read from a
///   decimal string or a JSON number (`25`, `25.00`), both through `FromStr`
///
/// ## Where Money is Used
/// ```text
/// Product.price_cents ──► PlannedLine.unit_price ──► PlannedLine.line_total
///                                                          │
///                                          CartPlan.total ◄┘
///                                                │
///                 amount_received ──► Settlement.change
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use datahouse_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents 10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit price by a quantity, returning `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use datahouse_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.checked_mul_quantity(3), Some(Money::from_cents(897)));
    /// assert_eq!(Money::from_cents(i64::MAX).checked_mul_quantity(2), None);
    /// ```
    #[inline]
    pub const fn checked_mul_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Adds two amounts, returning `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Subtracts two amounts, returning `None` on overflow.
    #[inline]
    pub const fn checked_sub(&self, other: Money) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Parses a decimal string ("25", "25.5", "25.00", "-3.10") into Money.
///
/// ## Rules
/// - At most two fractional digits (the currency's minor unit)
/// - Digits only, an optional leading `-`, and one optional `.`
/// - Never goes through floating point
///
/// ## Example
/// ```rust
/// use datahouse_core::money::Money;
///
/// assert_eq!("25.5".parse::<Money>().unwrap().cents(), 2550);
/// assert!("25.555".parse::<Money>().is_err());
/// assert!("abc".parse::<Money>().is_err());
/// ```
impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        let s = s.trim();
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let (major_str, minor_str) = match digits.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (digits, ""),
        };

        if major_str.is_empty() || !major_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("expected a decimal number such as 25.00"));
        }
        if digits.contains('.') && minor_str.is_empty() {
            return Err(invalid("missing digits after the decimal point"));
        }
        if minor_str.len() > 2 {
            return Err(invalid("at most two decimal places are allowed"));
        }
        if !minor_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("expected a decimal number such as 25.00"));
        }

        let overflow = || ValidationError::Overflow {
            field: "amount".to_string(),
        };

        let major: i64 = major_str.parse().map_err(|_| overflow())?;
        // "5" in the minor position means 50 cents
        let minor: i64 = match minor_str.len() {
            0 => 0,
            1 => minor_str.parse::<i64>().map_err(|_| overflow())? * 10,
            _ => minor_str.parse().map_err(|_| overflow())?,
        };

        let cents = major
            .checked_mul(100)
            .and_then(|c| c.checked_add(minor))
            .ok_or_else(overflow)?;

        Ok(Money(if negative { -cents } else { cents }))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Renders the amount with two decimals, e.g. `20.00` or `-5.50`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

/// Accepts `"25.00"`, `25` and `25.0`.
///
/// A JSON float is turned back into its shortest decimal text before parsing,
/// so `10.1` becomes 1010 cents rather than whatever the nearest f64 rounds to.
struct MoneyVisitor;

impl<'de> Visitor<'de> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal amount such as 25.00 or \"25.00\"")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        self.visit_str(&v.to_string())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        self.visit_str(&v.to_string())
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        if !v.is_finite() {
            return Err(E::custom("amount must be a finite number"));
        }
        self.visit_str(&v.to_string())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(2000).to_string(), "20.00");
        assert_eq!(Money::from_cents(505).to_string(), "5.05");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_parse() {
        assert_eq!("25".parse::<Money>().unwrap().cents(), 2500);
        assert_eq!("25.00".parse::<Money>().unwrap().cents(), 2500);
        assert_eq!("25.5".parse::<Money>().unwrap().cents(), 2550);
        assert_eq!("0.07".parse::<Money>().unwrap().cents(), 7);
        assert_eq!(" 10.10 ".parse::<Money>().unwrap().cents(), 1010);
        assert_eq!("-3.10".parse::<Money>().unwrap().cents(), -310);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        for bad in ["", "abc", "1.234", "1.", ".5", "1,50", "1.5a", "--1", "1e3"] {
            assert!(bad.parse::<Money>().is_err(), "accepted {bad:?}");
        }
        assert!(matches!(
            "99999999999999999999".parse::<Money>(),
            Err(ValidationError::Overflow { .. })
        ));
    }

    #[test]
    fn test_checked_operations() {
        let max = Money::from_cents(i64::MAX);
        assert_eq!(max.checked_add(Money::from_cents(1)), None);
        assert_eq!(Money::from_cents(i64::MIN).checked_sub(Money::from_cents(1)), None);
        assert_eq!(max.checked_mul_quantity(2), None);
        assert_eq!(
            Money::from_cents(299).checked_mul_quantity(3),
            Some(Money::from_cents(897))
        );
    }

    /// A float accumulator drifts after many 0.10 sales; integer cents do not.
    #[test]
    fn test_no_drift_over_many_small_sales() {
        let dime: Money = "0.10".parse().unwrap();
        let total = (0..1000).try_fold(Money::zero(), |acc, _| acc.checked_add(dime)).unwrap();
        assert_eq!(total.to_string(), "100.00");

        let received: Money = "150.00".parse().unwrap();
        assert_eq!(received.checked_sub(total).unwrap().to_string(), "50.00");
    }

    #[test]
    fn test_serializes_as_decimal_string() {
        assert_eq!(serde_json::to_string(&Money::from_cents(2000)).unwrap(), r#""20.00""#);
        assert_eq!(serde_json::to_string(&Money::from_cents(505)).unwrap(), r#""5.05""#);
    }

    #[test]
    fn test_deserializes_decimal_numbers_and_strings() {
        let read = |json: &str| serde_json::from_str::<Money>(json).unwrap().cents();

        assert_eq!(read("25"), 2500);
        assert_eq!(read("25.00"), 2500);
        assert_eq!(read("25.5"), 2550);
        assert_eq!(read("10.1"), 1010);
        assert_eq!(read("0.07"), 7);
        assert_eq!(read(r#""25.00""#), 2500);
        assert_eq!(read("-3.1"), -310);
    }

    #[test]
    fn test_deserialize_rejects_sub_cent_amounts() {
        assert!(serde_json::from_str::<Money>("1.005").is_err());
        assert!(serde_json::from_str::<Money>(r#""abc""#).is_err());
        assert!(serde_json::from_str::<Money>("true").is_err());
    }
}
