//! Product service for business logic operations.
//!
//! Besides the uniqueness and existence checks, this service owns the banner
//! file lifecycle: replacing a banner removes the old file, and deleting a
//! product removes its banner.

use uuid::Uuid;

use super::ensure_name_free;
use crate::error::{AppError, AppResult};
use crate::models::{NewProduct, Product, UpdateProduct};
use crate::repositories::{CategoryRepository, ProductRepository};
use crate::utils::storage::{INVALID_FILE_TYPE_MESSAGE, Storage, StorageFolder, StoredFile};

#[derive(Clone)]
pub struct ProductService {
    repo: ProductRepository,
    categories: CategoryRepository,
    storage: Storage,
}

impl ProductService {
    pub fn new(repo: ProductRepository, categories: CategoryRepository, storage: Storage) -> Self {
        Self {
            repo,
            categories,
            storage,
        }
    }

    /// Creates a product in an existing category.
    ///
    /// # Errors
    /// - `NotFound` when the category does not exist
    /// - `Conflict` when the name is taken
    pub async fn create(
        &self,
        name: String,
        description: String,
        category_id: Uuid,
    ) -> AppResult<Product> {
        if self.categories.find_by_id(category_id).await?.is_none() {
            return Err(AppError::not_found("Category", "id", category_id));
        }

        let holder = self.repo.find_by_name(&name).await?.map(|p| p.id);
        ensure_name_free(holder, None, "Product name already exists")?;

        let product = self
            .repo
            .create(NewProduct {
                name,
                description,
                category_id,
            })
            .await?;
        tracing::info!(product_id = %product.id, %category_id, "Product created");
        Ok(product)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Product> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Product", "id", id))
    }

    pub async fn list(&self, offset: i64, limit: i64) -> AppResult<(Vec<Product>, i64)> {
        self.repo.list(offset, limit).await
    }

    /// Products of one category; an unknown category yields an empty page
    pub async fn list_by_category(
        &self,
        category_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Product>, i64)> {
        self.repo.list_by_category(category_id, offset, limit).await
    }

    pub async fn update(&self, id: Uuid, name: String, description: String) -> AppResult<Product> {
        self.get(id).await?;

        let holder = self.repo.find_by_name(&name).await?.map(|p| p.id);
        ensure_name_free(holder, Some(id), "Product name already exists")?;

        let changes = UpdateProduct {
            name: Some(name),
            description: Some(description),
            ..UpdateProduct::default()
        };
        self.repo.update(id, changes).await
    }

    /// Replaces the banner image of a product
    pub async fn upload_banner(&self, id: Uuid, filename: &str, bytes: &[u8]) -> AppResult<Product> {
        let product = self.get(id).await?;
        let stored_name = self.store_banner(&product, filename, bytes).await?;

        let changes = UpdateProduct {
            banner: Some(stored_name),
            ..UpdateProduct::default()
        };
        self.repo.update(id, changes).await
    }

    pub async fn banner(&self, id: Uuid) -> AppResult<StoredFile> {
        let product = self.get(id).await?;
        self.load_banner(&product).await
    }

    /// Deletes a product and its banner file
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let product = self.get(id).await?;

        self.remove_banner(&product).await?;
        self.repo.delete(id).await?;
        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }

    /// Writes a new banner file for `product` and removes the old one.
    ///
    /// # Returns
    /// The stored name to persist on the product
    ///
    /// # Errors
    /// `NotAcceptable` when the extension is not jpg, jpeg or png
    async fn store_banner(
        &self,
        product: &Product,
        filename: &str,
        bytes: &[u8],
    ) -> AppResult<String> {
        if !Storage::verify_extension(filename) {
            return Err(AppError::NotAcceptable {
                message: INVALID_FILE_TYPE_MESSAGE.to_string(),
            });
        }

        let stored_name = Storage::generate_filename(filename);

        self.remove_banner(product).await?;
        self.storage
            .save(StorageFolder::Products, &stored_name, bytes)
            .await?;
        Ok(stored_name)
    }

    async fn load_banner(&self, product: &Product) -> AppResult<StoredFile> {
        let not_found = || AppError::not_found("Banner", "product_id", product.id);

        if !product.has_banner() {
            return Err(not_found());
        }

        self.storage
            .load(StorageFolder::Products, &product.banner)
            .await?
            .ok_or_else(not_found)
    }

    async fn remove_banner(&self, product: &Product) -> AppResult<()> {
        if product.has_banner() {
            self.storage
                .delete(StorageFolder::Products, &product.banner)
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::db::{AsyncDbPool, lazy_connection_pool, test_pool};
    use crate::models::{NewCategory, NewUser};
    use crate::repositories::UserRepository;
    use tempfile::TempDir;

    fn product(banner: &str) -> Product {
        let now = jiff::civil::date(2024, 6, 1).at(12, 0, 0, 0);
        Product {
            id: Uuid::new_v4(),
            name: "Brush".to_string(),
            description: "Flat brush".to_string(),
            banner: banner.to_string(),
            category_id: Uuid::new_v4(),
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    fn service_on(pool: AsyncDbPool, dir: &TempDir) -> ProductService {
        ProductService::new(
            ProductRepository::new(pool.clone()),
            CategoryRepository::new(pool),
            Storage::new(dir.path()),
        )
    }

    /// Service whose pool never connects; only file handling is usable
    fn offline_service(dir: &TempDir) -> ProductService {
        let config = DatabaseConfig {
            url: "postgres://nobody@127.0.0.1:1/none".to_string(),
            min_connections: 0,
            ..DatabaseConfig::default()
        };
        service_on(lazy_connection_pool(&config), dir)
    }

    fn unique(name: &str) -> String {
        format!("{} {}", name, Uuid::new_v4())
    }

    #[tokio::test]
    async fn test_store_banner_rejects_disallowed_extension_before_writing() {
        let dir = TempDir::new().unwrap();
        let service = offline_service(&dir);

        let err = service
            .store_banner(&product(""), "banner.gif", b"GIF89a")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotAcceptable { .. }));
        assert_eq!(err.to_string(), INVALID_FILE_TYPE_MESSAGE);
        assert!(!dir.path().join("products").exists());
    }

    #[tokio::test]
    async fn test_store_banner_replaces_previous_file() {
        let dir = TempDir::new().unwrap();
        let service = offline_service(&dir);
        service
            .storage
            .save(StorageFolder::Products, "old.png", b"old")
            .await
            .unwrap();

        let stored = service
            .store_banner(&product("old.png"), "New Banner.JPG", b"new")
            .await
            .unwrap();

        assert!(stored.ends_with(".jpg"));
        assert!(!dir.path().join("products/old.png").exists());
        assert_eq!(
            std::fs::read(dir.path().join("products").join(&stored)).unwrap(),
            b"new".to_vec()
        );
    }

    #[tokio::test]
    async fn test_banner_not_set() {
        let dir = TempDir::new().unwrap();
        let err = offline_service(&dir)
            .load_banner(&product(""))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
        assert_eq!(err.to_string(), "Banner not found");
    }

    #[tokio::test]
    async fn test_banner_file_missing_on_disk() {
        let dir = TempDir::new().unwrap();
        let err = offline_service(&dir)
            .load_banner(&product("gone.png"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Banner not found");
    }

    #[tokio::test]
    async fn test_remove_banner_deletes_file() {
        let dir = TempDir::new().unwrap();
        let service = offline_service(&dir);
        service
            .storage
            .save(StorageFolder::Products, "b.png", b"png")
            .await
            .unwrap();

        let file = service.load_banner(&product("b.png")).await.unwrap();
        assert_eq!(file.content_type, "image/png");

        service.remove_banner(&product("b.png")).await.unwrap();
        assert!(!dir.path().join("products/b.png").exists());
        assert!(service.remove_banner(&product("")).await.is_ok());
    }

    /// Category owned by a fresh user, on the test database
    async fn category(pool: &AsyncDbPool) -> Uuid {
        let user = UserRepository::new(pool.clone())
            .create(NewUser {
                name: "Owner".to_string(),
                email: format!("{}@example.com", Uuid::new_v4()),
                password: "not-a-hash".to_string(),
            })
            .await
            .unwrap();

        CategoryRepository::new(pool.clone())
            .create(NewCategory {
                name: unique("Paint"),
                user_id: user.id,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_create_in_unknown_category_is_not_found() {
        let Some(pool) = test_pool().await else { return };
        let dir = TempDir::new().unwrap();
        let service = service_on(pool, &dir);

        let err = service
            .create(unique("Brush"), "Flat".to_string(), Uuid::new_v4())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
        assert_eq!(err.to_string(), "Category not found");
    }

    #[tokio::test]
    async fn test_names_are_unique_except_for_self() {
        let Some(pool) = test_pool().await else { return };
        let dir = TempDir::new().unwrap();
        let category_id = category(&pool).await;
        let service = service_on(pool, &dir);

        let first = service
            .create(unique("Brush"), "Flat".to_string(), category_id)
            .await
            .unwrap();
        let second = service
            .create(unique("Roller"), "Foam".to_string(), category_id)
            .await
            .unwrap();

        let err = service
            .create(first.name.clone(), "Again".to_string(), category_id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
        assert_eq!(err.to_string(), "Product name already exists");

        let renamed = service
            .update(first.id, first.name.clone(), "Wide".to_string())
            .await
            .unwrap();
        assert_eq!(renamed.description, "Wide");

        let err = service
            .update(first.id, second.name, "Wide".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_banner_lifecycle() {
        let Some(pool) = test_pool().await else { return };
        let dir = TempDir::new().unwrap();
        let category_id = category(&pool).await;
        let service = service_on(pool, &dir);
        let created = service
            .create(unique("Brush"), "Flat".to_string(), category_id)
            .await
            .unwrap();

        let err = service.banner(created.id).await.unwrap_err();
        assert_eq!(err.to_string(), "Banner not found");

        let err = service
            .upload_banner(created.id, "banner.bmp", b"BM")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotAcceptable { .. }));

        let first = service
            .upload_banner(created.id, "banner.png", b"one")
            .await
            .unwrap();
        let second = service
            .upload_banner(created.id, "banner.jpeg", b"two")
            .await
            .unwrap();
        let products = dir.path().join("products");
        assert!(!products.join(&first.banner).exists());
        assert_eq!(service.banner(created.id).await.unwrap().bytes, b"two".to_vec());

        service.delete(created.id).await.unwrap();
        assert!(!products.join(&second.banner).exists());
        let err = service.get(created.id).await.unwrap_err();
        assert_eq!(err.to_string(), "Product not found");
    }
}
