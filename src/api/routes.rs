//! Router configuration for the API.
//!
//! Collects every handler group into one `OpenApiRouter`, serves the
//! generated document through Swagger UI and applies the middleware stack.

use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, StatusCode},
    middleware,
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::doc::ApiDoc;
use crate::api::handlers;
use crate::api::middleware::{
    logging_middleware, normalize_error_body, rate_limit_middleware, request_id_middleware,
};
use crate::config::{ServerConfig, Settings};
use crate::state::AppState;

pub const DOCS_PATH: &str = "/docs";
pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

/// Creates the main application router with all routes and middleware.
///
/// # Middleware Order
/// Layers run outermost first:
/// 1. Compression and CORS
/// 2. Request timeout and body size limit
/// 3. Request ID, then logging (so log lines carry the ID)
/// 4. Error body normalization
/// 5. Rate limiting (needs the matched route)
///
/// # Routes
/// - `{prefix}/users`, `{prefix}/categories`, `{prefix}/products` where
///   the prefix is `/api/{version}`
/// - `/health`, `/health/live`, `/health/ready`
/// - `/docs` Swagger UI
pub fn create_router(state: AppState, settings: &Settings) -> Router {
    let prefix = settings.api.prefix();

    let (router, openapi) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest(
            &format!("{prefix}/users"),
            handlers::users::user_routes(state.clone()),
        )
        .nest(
            &format!("{prefix}/categories"),
            handlers::categories::category_routes(state.clone()),
        )
        .nest(
            &format!("{prefix}/products"),
            handlers::products::product_routes(state.clone()),
        )
        .merge(handlers::health::health_routes())
        .split_for_parts();

    router
        .merge(SwaggerUi::new(DOCS_PATH).url(OPENAPI_JSON_PATH, openapi))
        .fallback(route_not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(middleware::from_fn(normalize_error_body))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(DefaultBodyLimit::max(settings.storage.max_upload_size))
        .layer(TimeoutLayer::new(Duration::from_secs(
            settings.server.request_timeout,
        )))
        .layer(cors_layer(&settings.server))
        .layer(CompressionLayer::new())
        .with_state(state)
}

/// Empty 404; `normalize_error_body` turns it into `{"detail": "Not Found"}`.
async fn route_not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring unparsable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
