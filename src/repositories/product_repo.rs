//! Product repository for async database operations.
//!
//! Provides CRUD operations for the products table.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult, DatabaseErrorConverter};
use crate::models::{NewProduct, Product, UpdateProduct};

/// Product repository
#[derive(Clone)]
pub struct ProductRepository {
    pool: AsyncDbPool,
}

impl ProductRepository {
    /// Creates a new ProductRepository with the given connection pool.
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    /// Creates a new product
    ///
    /// # Returns
    /// The created product with generated id and timestamps
    pub async fn create(&self, new_product: NewProduct) -> AppResult<Product> {
        use crate::schema::products::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::insert_into(products)
            .values(&new_product)
            .returning(Product::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(DatabaseErrorConverter::for_operation("create product"))
    }

    /// Finds a product by ID
    pub async fn find_by_id(&self, product_id: Uuid) -> AppResult<Option<Product>> {
        use crate::schema::products::dsl::*;
        let mut conn = self.pool.get().await?;

        products
            .filter(id.eq(product_id))
            .select(Product::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    /// Finds a product by its unique name
    pub async fn find_by_name(&self, product_name: &str) -> AppResult<Option<Product>> {
        use crate::schema::products::dsl::*;
        let mut conn = self.pool.get().await?;

        products
            .filter(name.eq(product_name))
            .select(Product::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    /// Lists all products with pagination, newest first
    ///
    /// # Returns
    /// Tuple of (products vector, total count)
    pub async fn list(&self, offset: i64, limit: i64) -> AppResult<(Vec<Product>, i64)> {
        use crate::schema::products::dsl::*;
        let mut conn = self.pool.get().await?;

        let items = products
            .order((created_at.desc(), id.desc()))
            .offset(offset)
            .limit(limit)
            .select(Product::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)?;

        let total = products
            .count()
            .get_result::<i64>(&mut conn)
            .await
            .map_err(AppError::from)?;

        Ok((items, total))
    }

    /// Lists the products of one category with pagination
    ///
    /// # Returns
    /// Tuple of (products vector, total count)
    pub async fn list_by_category(
        &self,
        cid: Uuid,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Product>, i64)> {
        use crate::schema::products::dsl::*;
        let mut conn = self.pool.get().await?;

        let items = products
            .filter(category_id.eq(cid))
            .order((created_at.desc(), id.desc()))
            .offset(offset)
            .limit(limit)
            .select(Product::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)?;

        let total = products
            .filter(category_id.eq(cid))
            .count()
            .get_result::<i64>(&mut conn)
            .await
            .map_err(AppError::from)?;

        Ok((items, total))
    }

    /// Whether any product references the category
    pub async fn exists_for_category(&self, cid: Uuid) -> AppResult<bool> {
        use crate::schema::products::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::select(diesel::dsl::exists(products.filter(category_id.eq(cid))))
            .get_result::<bool>(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Updates a product and bumps `updated_at`
    pub async fn update(&self, product_id: Uuid, update_data: UpdateProduct) -> AppResult<Product> {
        use crate::schema::products::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::update(products.filter(id.eq(product_id)))
            .set((&update_data, updated_at.eq(diesel::dsl::now)))
            .returning(Product::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// # Returns
    /// The number of affected rows (0 or 1)
    pub async fn delete(&self, product_id: Uuid) -> AppResult<usize> {
        use crate::schema::products::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::delete(products.filter(id.eq(product_id)))
            .execute(&mut conn)
            .await
            .map_err(DatabaseErrorConverter::for_operation("delete product"))
    }
}
