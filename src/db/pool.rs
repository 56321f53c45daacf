//! Async database connection pool implementation.
//!
//! Uses bb8 connection pool manager with diesel_async for PostgreSQL connections.

use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::Pool;
use diesel_migrations::{EmbeddedMigrations, embed_migrations};

use crate::config::DatabaseConfig;
use crate::error::AppError;

/// Async connection pool type alias.
///
/// bb8::Pool internally uses Arc, so Clone is cheap (just reference count increment).
/// Structures holding AsyncDbPool can derive Clone without additional Arc wrapping.
pub type AsyncDbPool = Pool<AsyncPgConnection>;

/// Migrations compiled into the binary from `migrations/`.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

fn manager(config: &DatabaseConfig) -> AsyncDieselConnectionManager<AsyncPgConnection> {
    AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.url.as_str())
}

fn builder(config: &DatabaseConfig) -> bb8::Builder<AsyncDieselConnectionManager<AsyncPgConnection>> {
    Pool::builder()
        .max_size(config.max_connections)
        .min_idle(Some(config.min_connections))
        .connection_timeout(Duration::from_secs(config.connection_timeout))
}

/// Creates an async database connection pool and opens the minimum idle
/// connections.
///
/// # Errors
///
/// `AppError::ConnectionPool` when the initial connections cannot be opened.
///
/// # Example
///
/// ```ignore
/// let pool = establish_async_connection_pool(&settings.database).await?;
/// let mut conn = pool.get().await?;
/// ```
pub async fn establish_async_connection_pool(
    config: &DatabaseConfig,
) -> Result<AsyncDbPool, AppError> {
    builder(config)
        .build(manager(config))
        .await
        .map_err(|e| AppError::ConnectionPool {
            source: anyhow::Error::from(e),
        })
}

/// Builds a pool without connecting. Connections are opened on first use.
pub fn lazy_connection_pool(config: &DatabaseConfig) -> AsyncDbPool {
    builder(config).build_unchecked(manager(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::migration::MigrationSource;

    #[test]
    fn test_embedded_migrations_are_ordered() {
        let migrations =
            MigrationSource::<diesel::pg::Pg>::migrations(&MIGRATIONS).expect("migrations load");
        let names: Vec<String> = migrations.iter().map(|m| m.name().to_string()).collect();

        assert_eq!(names.len(), 3);
        assert!(names[0].ends_with("create_users"));
        assert!(names[1].ends_with("create_categories"));
        assert!(names[2].ends_with("create_products"));
    }

    #[tokio::test]
    async fn test_lazy_pool_does_not_connect() {
        let config = DatabaseConfig {
            url: "postgres://nobody@127.0.0.1:1/none".to_string(),
            min_connections: 0,
            ..DatabaseConfig::default()
        };

        let pool = lazy_connection_pool(&config);
        assert_eq!(pool.state().connections, 0);
    }
}
