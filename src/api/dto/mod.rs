//! Data Transfer Objects for API requests and responses.
//!
//! DTOs are organized by domain:
//! - `user`, `category`, `product` - resource request/response DTOs
//! - `error` - error bodies
//! - `pagination` - page parameters and page wrapper
//! - `health` - health check bodies

mod category;
mod error;
mod health;
mod pagination;
mod product;
mod user;

pub use category::{CategoryRequest, CategoryResponse};
pub use error::{ErrorResponse, RateLimitResponse};
pub use health::{ComponentHealth, HealthResponse, HealthStatus};
pub use pagination::{Page, PageParams};
pub use product::{BannerUpload, CreateProductRequest, ProductResponse, UpdateProductRequest};
pub use user::{
    AvatarUpload, ResetPasswordRequest, SigninForm, SignupRequest, TokenResponse,
    UpdateProfileRequest, UserResponse,
};
