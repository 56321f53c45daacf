//! Database access: async PostgreSQL pool (diesel_async + bb8) and the
//! embedded schema migrations.

mod migrate;
mod pool;

pub use migrate::{pending_migrations, revert_migrations, run_pending_migrations};
pub use pool::{AsyncDbPool, MIGRATIONS, establish_async_connection_pool, lazy_connection_pool};

/// Database used by the tests that need a real PostgreSQL server
#[cfg(test)]
pub(crate) const TEST_DATABASE_URL_ENV: &str = "STOCK_TEST_DATABASE_URL";

/// Pool on the database named by `STOCK_TEST_DATABASE_URL`, migrated once per
/// test binary. `None` when the variable is unset, so callers skip.
#[cfg(test)]
pub(crate) async fn test_pool() -> Option<AsyncDbPool> {
    static MIGRATED: tokio::sync::OnceCell<()> = tokio::sync::OnceCell::const_new();

    let url = std::env::var(TEST_DATABASE_URL_ENV).ok()?;
    MIGRATED
        .get_or_try_init(|| async { run_pending_migrations(&url).await.map(drop) })
        .await
        .expect("migrate test database");

    let config = crate::config::DatabaseConfig {
        url,
        min_connections: 0,
        ..crate::config::DatabaseConfig::default()
    };
    Some(lazy_connection_pool(&config))
}
