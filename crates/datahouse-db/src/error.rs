//! # Database Error Types
//!
//! Error types for database operations and for the checkout engine.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)          Business rule (CoreError)          │
//! │       │                                   │                             │
//! │       ▼                                   │                             │
//! │  DbError ← adds categorization            │                             │
//! │       │                                   │                             │
//! │       └──────────────┬────────────────────┘                             │
//! │                      ▼                                                  │
//! │  CheckoutError = Storage(DbError) | Rejected(CoreError)                 │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │  CheckoutFailure { kind, message } ← serialized for the routing layer  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;

use datahouse_core::{CheckoutErrorKind, CoreError, ValidationError};

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - `fetch_one` returns no rows
    /// - Product code doesn't exist on update/delete
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Inserting a product with a code that is already taken
    /// - Invoice id collision
    ///
    /// `value` is `None` when the error came straight from SQLite, which
    /// only names the column.
    #[error("Duplicate {field}{} already exists", quoted_value(.value))]
    UniqueViolation { field: String, value: Option<String> },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file can't be created
    /// - File permissions issue
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed (including CHECK constraint failures).
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// The transaction could not be completed and was rolled back.
    ///
    /// ## When This Occurs
    /// - COMMIT failed
    /// - A guarded stock update matched no row
    /// - The write lock could not be taken within `busy_timeout`
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Input rejected before reaching SQL (catalogue writes).
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: Some(value.into()),
        }
    }
}

fn quoted_value(value: &Option<String>) -> String {
    match value {
        Some(v) => format!(": '{v}'"),
        None => String::new(),
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // "UNIQUE constraint failed: <table>.<column>"
                if let Some(field) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    DbError::UniqueViolation {
                        field: field.to_string(),
                        value: None,
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("database is locked") {
                    DbError::TransactionFailed(msg.to_string())
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Checkout Error
// =============================================================================

/// Why a checkout or customer order did not commit.
///
/// Either way nothing was written: rejections happen before the transaction
/// commits, and storage failures roll it back.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The request broke a business rule (stock, payment, input).
    #[error(transparent)]
    Rejected(#[from] CoreError),

    /// The store failed. Never retried automatically.
    #[error(transparent)]
    Storage(#[from] DbError),
}

impl CheckoutError {
    pub fn kind(&self) -> CheckoutErrorKind {
        match self {
            CheckoutError::Rejected(err) => err.kind(),
            CheckoutError::Storage(DbError::Validation(_)) => CheckoutErrorKind::InvalidInput,
            CheckoutError::Storage(_) => CheckoutErrorKind::StorageFailure,
        }
    }

    /// The serializable form handed to the routing layer.
    pub fn to_failure(&self) -> CheckoutFailure {
        CheckoutFailure {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

impl From<ValidationError> for CheckoutError {
    fn from(err: ValidationError) -> Self {
        CheckoutError::Rejected(CoreError::Validation(err))
    }
}

impl From<sqlx::Error> for CheckoutError {
    fn from(err: sqlx::Error) -> Self {
        CheckoutError::Storage(err.into())
    }
}

/// `{ "kind": "INSUFFICIENT_STOCK", "message": "..." }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutFailure {
    pub kind: CheckoutErrorKind,
    pub message: String,
}

impl From<&CheckoutError> for CheckoutFailure {
    fn from(err: &CheckoutError) -> Self {
        err.to_failure()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use datahouse_core::Money;

    #[test]
    fn test_storage_failures_are_server_errors() {
        let err = CheckoutError::from(DbError::TransactionFailed("commit".to_string()));
        assert_eq!(err.kind(), CheckoutErrorKind::StorageFailure);
        assert!(!err.kind().is_client_error());
    }

    #[test]
    fn test_failure_payload() {
        let err = CheckoutError::from(CoreError::InsufficientPayment {
            total: Money::from_cents(2000),
            received: Money::from_cents(1000),
        });

        let value = serde_json::to_value(err.to_failure()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "kind": "INSUFFICIENT_PAYMENT",
                "message": "Insufficient payment: total 20.00, received 10.00"
            })
        );
    }

    #[test]
    fn test_duplicate_message() {
        assert_eq!(
            DbError::duplicate("code", "P1").to_string(),
            "Duplicate code: 'P1' already exists"
        );

        let bare = DbError::UniqueViolation {
            field: "invoices.invoice_id".to_string(),
            value: None,
        };
        assert_eq!(bare.to_string(), "Duplicate invoices.invoice_id already exists");
    }

    #[test]
    fn test_validation_maps_to_invalid_input() {
        let err = CheckoutError::from(ValidationError::Required {
            field: "cart".to_string(),
        });
        assert_eq!(err.kind(), CheckoutErrorKind::InvalidInput);
    }
}
