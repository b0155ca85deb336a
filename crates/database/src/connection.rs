use crate::error::DbError;
use crate::schema;
use configuration::DatabaseSettings;
use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;
use std::sync::Once;
use std::time::Duration;

static INSTALL_DRIVERS: Once = Once::new();

/// Establishes a connection pool to the configured database.
///
/// The driver (PostgreSQL or SQLite) is selected by the settings; pool size
/// and acquisition timeout come from the same settings so no operation can
/// wait on a connection indefinitely.
pub async fn connect(settings: &DatabaseSettings) -> Result<AnyPool, DbError> {
    settings
        .validate()
        .map_err(|e| DbError::Configuration(e.to_string()))?;

    INSTALL_DRIVERS.call_once(sqlx::any::install_default_drivers);

    let pool = AnyPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .connect(&settings.connection_url())
        .await
        .map_err(DbError::Connection)?;

    tracing::debug!(driver = %settings.driver, "Database connection pool established.");
    Ok(pool)
}

/// Applies the embedded schema, ensuring all tables exist.
///
/// This is useful for ensuring the database schema is up-to-date when the
/// application starts, which is especially important in fresh deployments.
pub async fn run_migrations(pool: &AnyPool) -> Result<(), DbError> {
    for statement in schema::TABLES {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

/// Connection test for startup diagnostics: acquires a connection, issues a
/// trivial query and returns it to the pool. Never fails; a broken
/// configuration simply reports `false`.
pub async fn ping(pool: &AnyPool) -> bool {
    match sqlx::query("SELECT 1").execute(pool).await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Database connection test failed.");
            false
        }
    }
}
