//! Product DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::Product;

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    #[schema(example = "Ballpoint pen", min_length = 1, max_length = 255)]
    pub name: String,
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    #[schema(example = "Blue ink, medium point", max_length = 5000)]
    pub description: String,
    pub category_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    #[schema(min_length = 1, max_length = 255)]
    pub name: String,
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    #[schema(max_length = 5000)]
    pub description: String,
}

/// Multipart body of the banner upload.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct BannerUpload {
    #[schema(value_type = String, format = Binary)]
    pub banner: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Stored banner filename, empty when none was uploaded
    pub banner: String,
    pub category_id: Uuid,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            banner: product.banner,
            category_id: product.category_id,
        }
    }
}
