//! Pagination-related DTOs for API requests and responses.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Query parameters for pagination.
#[derive(Debug, Clone, Copy, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// Page number (1-based)
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    #[param(minimum = 1, example = 1)]
    pub page: u32,

    /// Number of items per page (max 100)
    #[serde(default = "default_size")]
    #[validate(range(min = 1, max = 100, message = "Size must be between 1 and 100"))]
    #[param(minimum = 1, maximum = 100, example = 50)]
    pub size: u32,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            size: default_size(),
        }
    }
}

impl PageParams {
    /// Rows to skip for the current page.
    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1).max(0) * i64::from(self.size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }
}

fn default_page() -> u32 {
    1
}

fn default_size() -> u32 {
    50
}

/// One page of results.
#[derive(Debug, Serialize, ToSchema)]
pub struct Page<T> {
    pub items: Vec<T>,

    /// Total number of items across all pages
    #[schema(example = 120)]
    pub total: u64,

    #[schema(example = 1)]
    pub page: u32,

    #[schema(example = 50)]
    pub size: u32,

    /// Total number of pages
    #[schema(example = 3)]
    pub pages: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, params: &PageParams, total: i64) -> Self {
        let total = u64::try_from(total).unwrap_or(0);
        let size = u64::from(params.size.max(1));
        let pages = u32::try_from(total.div_ceil(size)).unwrap_or(u32::MAX);

        Self {
            items,
            total,
            page: params.page,
            size: params.size,
            pages,
        }
    }

    /// Builds a page from database rows, converting each into its response type.
    pub fn from_rows<R>(rows: Vec<R>, params: &PageParams, total: i64) -> Self
    where
        T: From<R>,
    {
        Self::new(rows.into_iter().map(T::from).collect(), params, total)
    }
}
