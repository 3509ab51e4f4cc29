//! # datahouse-db: Database Layer for Datahouse POS
//!
//! SQLite storage for the catalogue, sales, invoices and customer orders,
//! plus the transactional checkout engine that ties them together.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Datahouse POS Data Flow                            │
//! │                                                                         │
//! │  /process-sale, /process-order (routing layer, outside this repo)     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  datahouse-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌───────────────┐   ┌───────────────┐    │   │
//! │  │   │CheckoutEngine │   │ Repositories  │   │  Migrations   │    │   │
//! │  │   │ (checkout.rs) │──►│ product, sale │   │  (embedded)   │    │   │
//! │  │   │ one tx / cart │   │ order, report │   │ 001_init.sql  │    │   │
//! │  │   └───────┬───────┘   └───────────────┘   └───────────────┘    │   │
//! │  │           │ CartPlan (datahouse-core, pure)                    │   │
//! │  └───────────┼─────────────────────────────────────────────────────┘   │
//! │              ▼                                                          │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │             SQLite Database (WAL, busy_timeout)                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`config`] - Environment-based configuration
//! - [`migrations`] - Embedded database migrations
//! - [`checkout`] - Transactional checkout and customer orders
//! - [`error`] - Database and checkout error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use datahouse_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::from_env()?).await?;
//!
//! let receipt = db.checkout().checkout(&request).await?;
//! println!("{}", serde_json::to_string(&receipt.to_response())?);
//! ```

use tracing_subscriber::EnvFilter;

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use checkout::CheckoutEngine;
pub use config::ConfigError;
pub use error::{CheckoutError, CheckoutFailure, DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::order::OrderRepository;
pub use repository::product::ProductRepository;
pub use repository::report::ReportRepository;
pub use repository::sale::SaleRepository;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,datahouse=debug,sqlx=warn";

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=datahouse_db=trace` - Trace this crate only
/// - Default: [`DEFAULT_LOG_FILTER`]
///
/// Calling it twice is harmless; the second call is ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
