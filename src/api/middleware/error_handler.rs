//! Error handler for converting AppError to HTTP responses.
//!
//! Every error leaves the service as JSON: `{"detail": ...}`, or
//! `{"error": ...}` for rate limiting. Server-side failures are logged and
//! replaced by a generic detail.

use axum::{
    Json,
    body::Body,
    extract::Request,
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::dto::{ErrorResponse, RateLimitResponse};
use crate::error::AppError;

/// Largest framework error body read back when normalizing
const MAX_PLAIN_ERROR_BODY: usize = 64 * 1024;

/// Response extension set on errors for requests that never reached the
/// endpoint; the rate limiter does not count them.
#[derive(Debug, Clone, Copy)]
pub struct RejectedRequest;

/// Maps an AppError variant to its HTTP status code.
pub fn error_to_status_code(error: &AppError) -> StatusCode {
    match error {
        AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
        AppError::NotFound { .. } => StatusCode::NOT_FOUND,
        AppError::NotAcceptable { .. } => StatusCode::NOT_ACCEPTABLE,
        AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        AppError::Duplicate { .. } | AppError::Conflict { .. } => StatusCode::CONFLICT,
        AppError::Validation { .. }
        | AppError::ValidationErrors { .. }
        | AppError::InvalidRequest { .. }
        | AppError::UnprocessableContent { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        AppError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
        AppError::ConnectionPool { .. } => StatusCode::SERVICE_UNAVAILABLE,
        AppError::Database { .. } | AppError::Storage { .. } | AppError::Internal { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = error_to_status_code(&self);

        if let AppError::TooManyRequests { retry_after, .. } = &self {
            let mut response =
                (status, Json(RateLimitResponse::new(self.to_string()))).into_response();
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(*retry_after));
            return response;
        }

        let detail = if self.is_server_error() {
            let cause = std::error::Error::source(&self).map(|e| format!("{:#}", e));
            tracing::error!(error = %self, cause = ?cause, status = status.as_u16(), "Request failed");
            match status {
                StatusCode::SERVICE_UNAVAILABLE => "Service temporarily unavailable".to_string(),
                _ => "Internal server error".to_string(),
            }
        } else {
            self.to_string()
        };

        let mut response = (status, Json(ErrorResponse::new(detail))).into_response();
        if self.is_request_rejection() {
            response.extensions_mut().insert(RejectedRequest);
        }
        if matches!(self, AppError::Unauthorized { .. }) {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer"),
            );
        }
        response
    }
}

fn default_detail(status: StatusCode) -> String {
    match status {
        StatusCode::NOT_FOUND => "Not Found".to_string(),
        StatusCode::METHOD_NOT_ALLOWED => "Method Not Allowed".to_string(),
        StatusCode::PAYLOAD_TOO_LARGE => "Request payload too large".to_string(),
        other => other
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string(),
    }
}

/// Rewrites non-JSON error responses produced by the framework (unknown
/// routes, wrong methods, body limits) into the `{detail}` shape.
pub async fn normalize_error_body(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let status = response.status();

    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    if is_json {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let original = axum::body::to_bytes(body, MAX_PLAIN_ERROR_BODY)
        .await
        .map(|bytes| String::from_utf8_lossy(&bytes).trim().to_string())
        .unwrap_or_default();

    let detail = if original.is_empty() || status.is_server_error() {
        default_detail(status)
    } else {
        original
    };

    let body = serde_json::to_vec(&ErrorResponse::new(detail)).unwrap_or_default();
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );

    Response::from_parts(parts, Body::from(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, middleware, routing::get};
    use tower::ServiceExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::BadRequest { message: "x".into() }, 400),
            (AppError::unauthorized("x"), 401),
            (AppError::not_found("User", "id", 1), 404),
            (AppError::NotAcceptable { message: "x".into() }, 406),
            (AppError::PayloadTooLarge { message: "x".into() }, 413),
            (AppError::conflict("x"), 409),
            (AppError::duplicate("User", "email", "a"), 409),
            (AppError::UnprocessableContent { message: "x".into() }, 422),
            (AppError::ValidationErrors { errors: vec![] }, 422),
            (AppError::InvalidRequest { message: "x".into() }, 422),
            (AppError::TooManyRequests { limit: 5, retry_after: 3 }, 429),
            (AppError::Internal { source: anyhow::anyhow!("boom") }, 500),
            (AppError::ConnectionPool { source: anyhow::anyhow!("down") }, 503),
        ];

        for (error, expected) in cases {
            assert_eq!(error_to_status_code(&error).as_u16(), expected, "{error:?}");
        }
    }

    #[tokio::test]
    async fn test_detail_body() {
        let response = AppError::not_found("Product", "id", 1).into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"detail": "Product not found"})
        );
    }

    #[tokio::test]
    async fn test_unauthorized_sets_challenge() {
        let response = AppError::unauthorized("Invalid or expired token").into_response();

        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
        assert!(response.extensions().get::<RejectedRequest>().is_some());
    }

    #[test]
    fn test_endpoint_errors_are_not_marked_rejected() {
        let response = AppError::conflict("Category is already registered").into_response();
        assert!(response.extensions().get::<RejectedRequest>().is_none());

        let response = AppError::InvalidRequest {
            message: "Expected request with `Content-Type: application/json`".into(),
        }
        .into_response();
        assert!(response.extensions().get::<RejectedRequest>().is_some());
    }

    #[tokio::test]
    async fn test_rate_limit_body_and_retry_after() {
        let response = AppError::TooManyRequests {
            limit: 5,
            retry_after: 42,
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "42");
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": "Rate limit exceeded: 5 per 1 minute"})
        );
    }

    #[tokio::test]
    async fn test_server_error_is_sanitized() {
        let response = AppError::Database {
            operation: "select".into(),
            source: anyhow::anyhow!("password authentication failed for user"),
        }
        .into_response();

        assert_eq!(
            body_json(response).await,
            serde_json::json!({"detail": "Internal server error"})
        );
    }

    #[tokio::test]
    async fn test_normalizes_framework_errors() {
        let app = Router::new()
            .route("/only-get", get(|| async { "ok" }))
            .layer(middleware::from_fn(normalize_error_body));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/only-get")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"detail": "Method Not Allowed"})
        );
    }

    #[tokio::test]
    async fn test_keeps_plain_text_detail() {
        let app = Router::new()
            .route(
                "/bad",
                get(|| async { (StatusCode::BAD_REQUEST, "Invalid URL: bad segment") }),
            )
            .layer(middleware::from_fn(normalize_error_body));

        let response = app
            .oneshot(Request::builder().uri("/bad").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(
            body_json(response).await,
            serde_json::json!({"detail": "Invalid URL: bad segment"})
        );
    }
}
