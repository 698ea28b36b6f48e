//! Database migration runner.

use sqlx::PgPool;
use tracing::info;

use keygate_core::AuthError;

/// Run all pending database migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), AuthError> {
    info!("Running database migrations...");

    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(|e| AuthError::store_unavailable(format!("Failed to run migrations: {e}"), e))?;

    info!("Database migrations completed successfully");
    Ok(())
}
