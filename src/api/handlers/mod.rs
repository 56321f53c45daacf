//! HTTP request handlers for API endpoints.
//!
//! This module contains all request handlers organized by resource type.

pub mod categories;
pub mod health;
pub mod products;
pub mod users;

use axum::body::Bytes;
use axum::extract::Multipart;
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};

use crate::error::{AppError, AppResult};
use crate::utils::storage::StoredFile;

/// An uploaded file taken from a multipart body
pub(crate) struct Upload {
    pub filename: String,
    pub bytes: Bytes,
}

/// Reads the multipart field called `field`, ignoring any other fields.
pub(crate) async fn read_upload(mut multipart: Multipart, field: &str) -> AppResult<Upload> {
    while let Some(part) = multipart.next_field().await? {
        if part.name() != Some(field) {
            continue;
        }

        let filename = part.file_name().unwrap_or_default().to_string();
        let bytes = part.bytes().await?;
        return Ok(Upload { filename, bytes });
    }

    Err(AppError::InvalidRequest {
        message: format!("Missing file field '{}'", field),
    })
}

/// Serves a stored image inline.
pub(crate) fn file_response(file: StoredFile) -> Response {
    let disposition = HeaderValue::from_str(&format!("inline; filename=\"{}\"", file.name))
        .unwrap_or_else(|_| HeaderValue::from_static("inline"));

    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(file.content_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::body::Body;
    use axum::extract::DefaultBodyLimit;
    use axum::http::{Request, StatusCode};
    use axum::routing::post;
    use tower::ServiceExt;

    const BOUNDARY: &str = "stock-boundary";

    async fn upload(multipart: Multipart) -> AppResult<String> {
        read_upload(multipart, "file").await.map(|upload| upload.filename)
    }

    fn multipart_request(content: &[u8]) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.png\"\r\n\
             Content-Type: image/png\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn upload_router() -> Router {
        Router::new()
            .route("/upload", post(upload))
            .layer(DefaultBodyLimit::max(512))
    }

    #[tokio::test]
    async fn test_read_upload_within_limit() {
        let response = upload_router()
            .oneshot(multipart_request(b"\x89PNG"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"a.png");
    }

    #[tokio::test]
    async fn test_oversized_upload_is_payload_too_large() {
        let response = upload_router()
            .oneshot(multipart_request(&[0u8; 4096]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_file_response_headers() {
        let response = file_response(StoredFile {
            name: "b7.png".to_string(),
            content_type: "image/png",
            bytes: vec![1, 2, 3],
        });

        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "inline; filename=\"b7.png\""
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], &[1, 2, 3]);
    }
}
