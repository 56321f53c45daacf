//! Repository layer for data access operations.
//!
//! Provides async CRUD operations for all domain entities.

mod category_repo;
mod product_repo;
mod user_repo;

pub use category_repo::CategoryRepository;
pub use product_repo::ProductRepository;
pub use user_repo::UserRepository;

use crate::db::AsyncDbPool;

/// Aggregates all repositories for convenient access.
///
/// Since `AsyncDbPool` uses `Arc` internally, cloning is cheap.
#[derive(Clone)]
pub struct Repositories {
    pub users: UserRepository,
    pub categories: CategoryRepository,
    pub products: ProductRepository,
}

impl Repositories {
    /// Creates a new Repositories instance with all repositories initialized.
    pub fn new(pool: AsyncDbPool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            categories: CategoryRepository::new(pool.clone()),
            products: ProductRepository::new(pool),
        }
    }
}
