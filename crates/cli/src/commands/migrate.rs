//! Database migration command.
//!
//! Applies the schema migrations in `crates/server/migrations/`, then creates
//! the session store table.
//!
//! # Environment Variables
//!
//! - `FOOD_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

use thiserror::Error;
use tower_sessions_sqlx_store::PostgresStore;

use food_order_server::db::MIGRATOR;

use super::{CommandError, connect};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Session store migration error: {0}")]
    SessionStore(#[from] sqlx::Error),
}

/// Run all migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let pool = connect().await?;

    tracing::info!("Running schema migrations...");
    MIGRATOR.run(&pool).await?;

    tracing::info!("Creating session store table...");
    PostgresStore::new(pool.clone()).migrate().await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
