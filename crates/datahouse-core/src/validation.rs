//! # Validation Module
//!
//! Input validation for Datahouse POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Browser pages (cashier.js, client.js)                        │
//! │  └── Immediate feedback, never trusted                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (before any store access)                        │
//! │  ├── Cart shape: non-empty, positive quantities                        │
//! │  └── Amounts, names, codes                                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                       │
//! │  ├── PRIMARY KEY / UNIQUE constraints                                  │
//! │  └── CHECK (quantity >= 0)                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cart lines are checked only for shape: a code that is not blank and a
//! positive quantity. Whether the code exists and whether enough stock is
//! left is decided against the store, so a cart line for `"a.b"` or for
//! 5000 units fails there (`ProductNotFound`, `InsufficientStock`), not here.
//!
//! ## Usage
//! ```rust
//! use datahouse_core::validation::{validate_code, validate_quantity};
//!
//! validate_code("P1").unwrap();
//! validate_quantity(5000).unwrap();
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{CartLine, CheckoutRequest, NewProduct, OrderRequest, ProductUpdate};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates the code of a product being created or deleted.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Letters, digits, hyphens and underscores only
///
/// ## Example
/// ```rust
/// use datahouse_core::validation::validate_code;
///
/// assert!(validate_code("P1").is_ok());
/// assert!(validate_code("").is_err());
/// assert!(validate_code("has space").is_err());
/// ```
pub fn validate_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: 50,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_required_text("name", name, 200)
}

/// Validates a required free-text field (trimmed).
pub fn validate_required_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    validate_optional_text(field, Some(value), max)
}

/// Validates an optional free-text field; only the length is checked.
pub fn validate_optional_text(field: &str, value: Option<&str>, max: usize) -> ValidationResult<()> {
    match value {
        Some(v) if v.trim().chars().count() > max => Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a requested cart quantity: any positive integer.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a stock level set by the store manager (zero allowed).
pub fn validate_stock_level(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a price.
///
/// ## Example
/// ```rust
/// use datahouse_core::money::Money;
/// use datahouse_core::validation::validate_price;
///
/// assert!(validate_price(Money::from_cents(1099)).is_ok());
/// assert!(validate_price(Money::zero()).is_ok());   // free item
/// assert!(validate_price(Money::from_cents(-100)).is_err());
/// ```
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "price".to_string(),
        });
    }

    Ok(())
}

/// Validates the amount tendered by the customer (zero allowed).
pub fn validate_amount_received(amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "amountReceived".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the shape of a cart.
///
/// ## Rules
/// - At least one line
/// - Every line has a non-blank code and a positive quantity
///
/// Duplicate codes are allowed; they are applied cumulatively.
pub fn validate_cart(cart: &[CartLine]) -> ValidationResult<()> {
    if cart.is_empty() {
        return Err(ValidationError::Required {
            field: "cart".to_string(),
        });
    }

    for line in cart {
        if line.code.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "code".to_string(),
            });
        }
        validate_quantity(line.quantity)?;
    }

    Ok(())
}

// =============================================================================
// Request Validators
// =============================================================================

/// Validates a checkout request before the store is touched.
pub fn validate_checkout_request(request: &CheckoutRequest) -> ValidationResult<()> {
    validate_cart(&request.cart)?;
    validate_amount_received(request.amount_received)?;
    validate_optional_text("clientName", request.client_name.as_deref(), 100)?;
    validate_optional_text("clientPhone", request.client_phone.as_deref(), 30)?;
    Ok(())
}

/// Validates a customer order before the store is touched.
pub fn validate_order_request(request: &OrderRequest) -> ValidationResult<()> {
    validate_cart(&request.cart)?;
    validate_required_text("customerName", &request.customer_name, 100)?;
    Ok(())
}

/// Validates the fields of a new product.
pub fn validate_new_product(product: &NewProduct) -> ValidationResult<()> {
    if let Some(code) = &product.code {
        validate_code(code)?;
    }
    validate_product_name(&product.name)?;
    validate_price(product.price)?;
    validate_stock_level(product.quantity)?;
    validate_required_text("description", &product.description, 2000)?;
    Ok(())
}

/// Validates the fields of a product update.
pub fn validate_product_update(update: &ProductUpdate) -> ValidationResult<()> {
    validate_product_name(&update.name)?;
    validate_price(update.price)?;
    validate_stock_level(update.quantity)?;
    validate_required_text("description", &update.description, 2000)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PaymentMethod;

    fn request(cart: Vec<CartLine>, received: i64) -> CheckoutRequest {
        CheckoutRequest {
            cart,
            payment_method: PaymentMethod::Cash,
            amount_received: Money::from_cents(received),
            client_name: None,
            client_phone: None,
        }
    }

    #[test]
    fn test_validate_code() {
        assert!(validate_code("P1").is_ok());
        assert!(validate_code("12").is_ok());
        assert!(validate_code("milk_1L").is_ok());

        assert!(validate_code("").is_err());
        assert!(validate_code("   ").is_err());
        assert!(validate_code("has space").is_err());
        assert!(validate_code(&"A".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(1000).is_ok());
        assert!(validate_quantity(i64::MAX).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
    }

    #[test]
    fn test_validate_cart() {
        assert!(matches!(
            validate_cart(&[]),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_cart(&[CartLine::new("P1", 0)]),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(matches!(
            validate_cart(&[CartLine::new("  ", 1)]),
            Err(ValidationError::Required { .. })
        ));
        assert!(validate_cart(&[CartLine::new("P1", 1), CartLine::new("P1", 1)]).is_ok());
    }

    #[test]
    fn test_validate_cart_leaves_existence_and_size_to_the_store() {
        assert!(validate_cart(&[CartLine::new("P1", 1000)]).is_ok());
        assert!(validate_cart(&[CartLine::new("shelf.2/a", 1)]).is_ok());

        let long_cart: Vec<CartLine> = (0..250).map(|i| CartLine::new(format!("P{i}"), 1)).collect();
        assert!(validate_cart(&long_cart).is_ok());
    }

    #[test]
    fn test_validate_checkout_request() {
        assert!(validate_checkout_request(&request(vec![CartLine::new("P1", 2)], 0)).is_ok());
        assert!(validate_checkout_request(&request(vec![CartLine::new("P1", 2)], -1)).is_err());
        assert!(validate_checkout_request(&request(vec![], 100)).is_err());

        let mut long_phone = request(vec![CartLine::new("P1", 1)], 100);
        long_phone.client_phone = Some("0".repeat(31));
        assert!(validate_checkout_request(&long_phone).is_err());
    }

    #[test]
    fn test_validate_order_request() {
        let ok = OrderRequest {
            cart: vec![CartLine::new("P1", 1)],
            customer_name: "Karim".to_string(),
        };
        assert!(validate_order_request(&ok).is_ok());

        let blank_name = OrderRequest {
            cart: vec![CartLine::new("P1", 1)],
            customer_name: "  ".to_string(),
        };
        assert!(matches!(
            validate_order_request(&blank_name),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_validate_new_product() {
        let mut product = NewProduct {
            code: None,
            name: "Olive oil".to_string(),
            price: Money::from_cents(1250),
            quantity: 0,
            description: "1L bottle".to_string(),
            image: Some("uploads/oil.png".to_string()),
        };
        assert!(validate_new_product(&product).is_ok());

        product.quantity = -1;
        assert!(validate_new_product(&product).is_err());

        product.quantity = 3;
        product.price = Money::from_cents(-1);
        assert!(validate_new_product(&product).is_err());
    }
}
