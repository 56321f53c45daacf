//! Category handlers. Every route requires authentication.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    middleware,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use uuid::Uuid;

use crate::api::doc::CATEGORY_TAG;
use crate::api::dto::{CategoryRequest, CategoryResponse, ErrorResponse, Page, PageParams};
use crate::api::middleware::{CurrentUser, auth_middleware};
use crate::error::AppResult;
use crate::state::AppState;
use crate::utils::validate::{ValidatedJson, ValidatedQuery};

/// Creates category routes.
///
/// Routes:
/// - POST /          - Create category
/// - GET /           - List the caller's categories
/// - GET /{id}       - Get category
/// - PUT /{id}       - Rename category
/// - DELETE /{id}    - Delete category without products
pub fn category_routes(state: AppState) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(create_category))
        .routes(routes!(list_categories))
        .routes(routes!(get_category))
        .routes(routes!(update_category))
        .routes(routes!(delete_category))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

#[utoipa::path(
    post,
    path = "/",
    tag = CATEGORY_TAG,
    request_body = CategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 409, description = "Category is already registered", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn create_category(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<CategoryRequest>,
) -> AppResult<(StatusCode, Json<CategoryResponse>)> {
    let category = state
        .services
        .categories
        .create(user.id, payload.name)
        .await?;

    Ok((StatusCode::CREATED, Json(CategoryResponse::from(category))))
}

/// GET /categories - Categories created by the caller, newest first
#[utoipa::path(
    get,
    path = "/",
    tag = CATEGORY_TAG,
    params(PageParams),
    responses(
        (status = 200, description = "Paginated list of categories", body = Page<CategoryResponse>)
    ),
    security(("bearerAuth" = []))
)]
async fn list_categories(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ValidatedQuery(params): ValidatedQuery<PageParams>,
) -> AppResult<Json<Page<CategoryResponse>>> {
    let (categories, total) = state
        .services
        .categories
        .list_for_user(user.id, params.offset(), params.limit())
        .await?;

    Ok(Json(Page::from_rows(categories, &params, total)))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = CATEGORY_TAG,
    params(("id" = Uuid, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category", body = CategoryResponse),
        (status = 404, description = "Category not found", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CategoryResponse>> {
    let category = state.services.categories.get(id).await?;
    Ok(Json(CategoryResponse::from(category)))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = CATEGORY_TAG,
    params(("id" = Uuid, Path, description = "Category id")),
    request_body = CategoryRequest,
    responses(
        (status = 202, description = "Category renamed", body = CategoryResponse),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 409, description = "Category name already exists", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<CategoryRequest>,
) -> AppResult<(StatusCode, Json<CategoryResponse>)> {
    let category = state.services.categories.update(id, payload.name).await?;
    Ok((StatusCode::ACCEPTED, Json(CategoryResponse::from(category))))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = CATEGORY_TAG,
    params(("id" = Uuid, Path, description = "Category id")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 422, description = "Category has registered products", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.categories.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
