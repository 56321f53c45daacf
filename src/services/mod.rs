//! Service layer for business logic operations.
//!
//! Services encapsulate business logic and coordinate between
//! repositories and handlers.

mod category_service;
mod product_service;
mod user_service;

pub use category_service::CategoryService;
pub use product_service::ProductService;
pub use user_service::UserService;

use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::repositories::Repositories;
use crate::utils::storage::Storage;

/// Aggregates all services for convenient access.
///
/// Cloning is cheap since underlying pools use `Arc` internally.
#[derive(Clone)]
pub struct Services {
    pub users: UserService,
    pub categories: CategoryService,
    pub products: ProductService,
}

impl Services {
    /// Creates a new Services instance from Repositories.
    pub fn new(repos: Repositories, storage: Storage) -> Self {
        Self {
            users: UserService::new(repos.users, storage.clone()),
            categories: CategoryService::new(repos.categories.clone(), repos.products.clone()),
            products: ProductService::new(repos.products, repos.categories, storage),
        }
    }
}

/// `Conflict` with `message` when the name is held by a record other than `id`.
///
/// `holder` is the id currently holding the name; `id` is `None` on create.
pub(crate) fn ensure_name_free(
    holder: Option<Uuid>,
    id: Option<Uuid>,
    message: &str,
) -> AppResult<()> {
    match holder {
        Some(holder) if Some(holder) != id => Err(AppError::conflict(message)),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_free_on_create() {
        assert!(ensure_name_free(None, None, "taken").is_ok());

        let err = ensure_name_free(Some(Uuid::new_v4()), None, "taken").unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
        assert_eq!(err.to_string(), "taken");
    }

    #[test]
    fn test_own_name_is_free_on_update() {
        let id = Uuid::new_v4();

        assert!(ensure_name_free(Some(id), Some(id), "taken").is_ok());
        assert!(ensure_name_free(None, Some(id), "taken").is_ok());
        assert!(ensure_name_free(Some(Uuid::new_v4()), Some(id), "taken").is_err());
    }
}
