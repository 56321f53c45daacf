//! Product handlers, including banner upload and download.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    middleware,
    response::Response,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use uuid::Uuid;

use crate::api::doc::PRODUCT_TAG;
use crate::api::dto::{
    BannerUpload, CreateProductRequest, ErrorResponse, Page, PageParams, ProductResponse,
    UpdateProductRequest,
};
use crate::api::handlers::{file_response, read_upload};
use crate::api::middleware::auth_middleware;
use crate::error::AppResult;
use crate::state::AppState;
use crate::utils::validate::{ValidatedJson, ValidatedQuery};

/// Creates product routes.
///
/// Routes:
/// - POST /                          - Create product
/// - GET /                           - List products
/// - GET /category/{category_id}     - List products of a category
/// - GET /{id}                       - Get product
/// - PUT /{id}                       - Update name and description
/// - PATCH /{id}                     - Upload banner
/// - GET /file/{id}                  - Download banner
/// - DELETE /{id}                    - Delete product and banner
pub fn product_routes(state: AppState) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(create_product))
        .routes(routes!(list_products))
        .routes(routes!(list_products_by_category))
        .routes(routes!(get_product))
        .routes(routes!(update_product))
        .routes(routes!(upload_banner))
        .routes(routes!(banner_file))
        .routes(routes!(delete_product))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

#[utoipa::path(
    post,
    path = "/",
    tag = PRODUCT_TAG,
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 409, description = "Product name already exists", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn create_product(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateProductRequest>,
) -> AppResult<(StatusCode, Json<ProductResponse>)> {
    let product = state
        .services
        .products
        .create(payload.name, payload.description, payload.category_id)
        .await?;

    Ok((StatusCode::CREATED, Json(ProductResponse::from(product))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = PRODUCT_TAG,
    params(PageParams),
    responses(
        (status = 200, description = "Paginated list of products", body = Page<ProductResponse>)
    ),
    security(("bearerAuth" = []))
)]
async fn list_products(
    State(state): State<AppState>,
    ValidatedQuery(params): ValidatedQuery<PageParams>,
) -> AppResult<Json<Page<ProductResponse>>> {
    let (products, total) = state
        .services
        .products
        .list(params.offset(), params.limit())
        .await?;

    Ok(Json(Page::from_rows(products, &params, total)))
}

#[utoipa::path(
    get,
    path = "/category/{category_id}",
    tag = PRODUCT_TAG,
    params(
        ("category_id" = Uuid, Path, description = "Category id"),
        PageParams
    ),
    responses(
        (status = 200, description = "Paginated products of the category", body = Page<ProductResponse>)
    ),
    security(("bearerAuth" = []))
)]
async fn list_products_by_category(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
    ValidatedQuery(params): ValidatedQuery<PageParams>,
) -> AppResult<Json<Page<ProductResponse>>> {
    let (products, total) = state
        .services
        .products
        .list_by_category(category_id, params.offset(), params.limit())
        .await?;

    Ok(Json(Page::from_rows(products, &params, total)))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = PRODUCT_TAG,
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product", body = ProductResponse),
        (status = 404, description = "Product not found", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ProductResponse>> {
    let product = state.services.products.get(id).await?;
    Ok(Json(ProductResponse::from(product)))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = PRODUCT_TAG,
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 202, description = "Product updated", body = ProductResponse),
        (status = 404, description = "Product not found", body = ErrorResponse),
        (status = 409, description = "Product name already exists", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateProductRequest>,
) -> AppResult<(StatusCode, Json<ProductResponse>)> {
    let product = state
        .services
        .products
        .update(id, payload.name, payload.description)
        .await?;

    Ok((StatusCode::ACCEPTED, Json(ProductResponse::from(product))))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = PRODUCT_TAG,
    params(("id" = Uuid, Path, description = "Product id")),
    request_body(content = BannerUpload, content_type = "multipart/form-data"),
    responses(
        (status = 202, description = "Banner stored", body = ProductResponse),
        (status = 404, description = "Product not found", body = ErrorResponse),
        (status = 406, description = "Invalid file type", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn upload_banner(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<ProductResponse>)> {
    let upload = read_upload(multipart, "banner").await?;
    let product = state
        .services
        .products
        .upload_banner(id, &upload.filename, &upload.bytes)
        .await?;

    Ok((StatusCode::ACCEPTED, Json(ProductResponse::from(product))))
}

#[utoipa::path(
    get,
    path = "/file/{id}",
    tag = PRODUCT_TAG,
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Banner image, jpeg or png"),
        (status = 404, description = "Product or banner not found", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn banner_file(State(state): State<AppState>, Path(id): Path<Uuid>) -> AppResult<Response> {
    let file = state.services.products.banner(id).await?;
    Ok(file_response(file))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = PRODUCT_TAG,
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Product not found", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.products.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
