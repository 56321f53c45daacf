//! Application state for Axum web framework.
//!
//! Contains shared services and resources that are accessible
//! across all request handlers.

use std::sync::Arc;

use crate::api::middleware::RateLimiter;
use crate::config::{JwtConfig, RateLimitConfig, Settings};
use crate::db::AsyncDbPool;
use crate::repositories::Repositories;
use crate::services::Services;
use crate::utils::storage::Storage;

/// Application state containing all shared services and resources.
///
/// Cloning is cheap: the pool and the rate limiter are reference counted.
#[derive(Clone)]
pub struct AppState {
    /// All business logic services
    pub services: Services,
    /// Direct access to the database connection pool
    pub db_pool: AsyncDbPool,
    /// JWT configuration for token generation and validation
    pub jwt_config: JwtConfig,
    pub rate_limit: RateLimitConfig,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Creates a new AppState from a database connection pool and settings.
    ///
    /// # Example
    /// ```ignore
    /// let pool = establish_async_connection_pool(&settings.database).await?;
    /// let state = AppState::new(pool, &settings);
    /// ```
    pub fn new(pool: AsyncDbPool, settings: &Settings) -> Self {
        let repos = Repositories::new(pool.clone());
        let services = Services::new(repos, Storage::from_config(&settings.storage));

        Self {
            services,
            db_pool: pool,
            jwt_config: settings.jwt.clone(),
            rate_limit: settings.rate_limit.clone(),
            rate_limiter: Arc::new(RateLimiter::new()),
        }
    }
}
