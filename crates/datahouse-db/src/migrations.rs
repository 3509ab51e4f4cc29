//! # Database Migrations
//!
//! The schema lives in `migrations/sqlite/` and is compiled into the crate.
//! `Database::new` applies whatever is pending before the pool is handed to
//! the repositories and the checkout engine.
//!
//! ```text
//! migrations/sqlite/
//! └── 001_initial_schema.sql   products, invoices, sales, orders, order_products
//! ```
//!
//! The stock invariant is enforced twice: the checkout engine's guarded
//! decrement, and `CHECK (quantity >= 0)` on `products`. Applied files are
//! checksummed, so schema changes go in a new `NNN_*.sql` file.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies pending migrations; a no-op on an up-to-date store.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    MIGRATOR.run(pool).await?;
    info!(migrations = MIGRATOR.migrations.len(), "Schema up to date");
    Ok(())
}

/// `(embedded, applied)` migration counts.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    // Missing table means nothing applied yet
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((total, applied as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    #[tokio::test]
    async fn test_status_before_and_after() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        let (total, applied) = migration_status(&pool).await.unwrap();
        assert!(total >= 1);
        assert_eq!(applied, 0);

        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let (total, applied) = migration_status(&pool).await.unwrap();
        assert_eq!(total, applied);
    }
}
