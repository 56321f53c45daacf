//! Category service: name uniqueness and the "no products left" delete rule.

use uuid::Uuid;

use super::ensure_name_free;
use crate::error::{AppError, AppResult};
use crate::models::{Category, NewCategory};
use crate::repositories::{CategoryRepository, ProductRepository};

const HAS_PRODUCTS: &str = "Category has registered products";

fn ensure_no_products(has_products: bool) -> AppResult<()> {
    if has_products {
        return Err(AppError::UnprocessableContent {
            message: HAS_PRODUCTS.to_string(),
        });
    }
    Ok(())
}

#[derive(Clone)]
pub struct CategoryService {
    repo: CategoryRepository,
    products: ProductRepository,
}

impl CategoryService {
    pub fn new(repo: CategoryRepository, products: ProductRepository) -> Self {
        Self { repo, products }
    }

    pub async fn create(&self, user_id: Uuid, name: String) -> AppResult<Category> {
        let holder = self.repo.find_by_name(&name).await?.map(|c| c.id);
        ensure_name_free(holder, None, "Category is already registered")?;

        let category = self.repo.create(NewCategory { name, user_id }).await?;
        tracing::info!(category_id = %category.id, %user_id, "Category created");
        Ok(category)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Category> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Category", "id", id))
    }

    /// Categories created by `user_id`, newest first, with the total count
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Category>, i64)> {
        self.repo.list_by_user(user_id, offset, limit).await
    }

    /// Renames a category. Keeping its own current name is allowed.
    pub async fn update(&self, id: Uuid, name: String) -> AppResult<Category> {
        self.get(id).await?;

        let holder = self.repo.find_by_name(&name).await?.map(|c| c.id);
        ensure_name_free(holder, Some(id), "Category name already exists")?;

        self.repo.update_name(id, &name).await
    }

    /// Deletes a category that no product references.
    ///
    /// # Errors
    /// `UnprocessableContent` while products still belong to it
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.get(id).await?;

        ensure_no_products(self.products.exists_for_category(id).await?)?;

        self.repo.delete(id).await?;
        tracing::info!(category_id = %id, "Category deleted");
        Ok(())
    }
}
