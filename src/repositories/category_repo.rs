//! Category repository for async database operations.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult, DatabaseErrorConverter};
use crate::models::{Category, NewCategory};

#[derive(Clone)]
pub struct CategoryRepository {
    pool: AsyncDbPool,
}

impl CategoryRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new_category: NewCategory) -> AppResult<Category> {
        use crate::schema::categories::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::insert_into(categories)
            .values(&new_category)
            .returning(Category::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(DatabaseErrorConverter::for_operation("create category"))
    }

    pub async fn find_by_id(&self, category_id: Uuid) -> AppResult<Option<Category>> {
        use crate::schema::categories::dsl::*;
        let mut conn = self.pool.get().await?;

        categories
            .filter(id.eq(category_id))
            .select(Category::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    pub async fn find_by_name(&self, category_name: &str) -> AppResult<Option<Category>> {
        use crate::schema::categories::dsl::*;
        let mut conn = self.pool.get().await?;

        categories
            .filter(name.eq(category_name))
            .select(Category::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    /// Lists the categories created by a user, newest first
    ///
    /// # Returns
    /// Tuple of (categories vector, total count)
    pub async fn list_by_user(
        &self,
        owner_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Category>, i64)> {
        use crate::schema::categories::dsl::*;
        let mut conn = self.pool.get().await?;

        let items = categories
            .filter(user_id.eq(owner_id))
            .order((created_at.desc(), id.desc()))
            .offset(offset)
            .limit(limit)
            .select(Category::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)?;

        let total = categories
            .filter(user_id.eq(owner_id))
            .count()
            .get_result::<i64>(&mut conn)
            .await
            .map_err(AppError::from)?;

        Ok((items, total))
    }

    pub async fn update_name(&self, category_id: Uuid, new_name: &str) -> AppResult<Category> {
        use crate::schema::categories::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::update(categories.filter(id.eq(category_id)))
            .set((name.eq(new_name), updated_at.eq(diesel::dsl::now)))
            .returning(Category::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// # Returns
    /// The number of affected rows (0 or 1)
    pub async fn delete(&self, category_id: Uuid) -> AppResult<usize> {
        use crate::schema::categories::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::delete(categories.filter(id.eq(category_id)))
            .execute(&mut conn)
            .await
            .map_err(DatabaseErrorConverter::for_operation("delete category"))
    }
}
