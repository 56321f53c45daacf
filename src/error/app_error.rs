use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{FormRejection, JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use diesel_async::pooled_connection::PoolError;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::error::DatabaseErrorConverter;

/// A single failed field from request validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ValidationFieldError {
    pub field: String,
    pub message: String,
}

/// Application-wide error type.
///
/// Each variant maps to exactly one HTTP status in the API layer; the
/// `Display` output is what ends up in the `detail` field for client errors.
#[derive(Error, Debug)]
pub enum AppError {
    /// 404, `entity` is the human name of the missing thing ("Category", "Avatar")
    #[error("{entity} not found")]
    NotFound {
        entity: String,
        field: String,
        value: String,
    },

    /// 409, unique constraint on `entity.field`
    #[error("{entity} {field} already exists")]
    Duplicate {
        entity: String,
        field: String,
        value: String,
    },

    /// 409 with a caller-chosen message, raised by service-level checks
    #[error("{message}")]
    Conflict { message: String },

    /// 422, single-field validation failure
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    /// 422, request body failed `validator` rules
    #[error("Validation failed: {}", join_field_errors(.errors))]
    ValidationErrors { errors: Vec<ValidationFieldError> },

    /// 422, body, form or query that could not be read into the expected shape
    #[error("{message}")]
    InvalidRequest { message: String },

    /// 400
    #[error("{message}")]
    BadRequest { message: String },

    /// 401
    #[error("{message}")]
    Unauthorized { message: String },

    /// 413, upload larger than `storage.max_upload_size`
    #[error("{message}")]
    PayloadTooLarge { message: String },

    /// 406, upload with a file type outside the allowed set
    #[error("{message}")]
    NotAcceptable { message: String },

    /// 422, well-formed request that breaks a business rule
    #[error("{message}")]
    UnprocessableContent { message: String },

    /// 429
    #[error("Rate limit exceeded: {limit} per 1 minute")]
    TooManyRequests { limit: u32, retry_after: u64 },

    #[error("Database operation failed: {operation}")]
    Database {
        operation: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Connection pool error")]
    ConnectionPool {
        #[source]
        source: anyhow::Error,
    },

    /// Upload directory read/write failure
    #[error("Storage operation failed: {operation}")]
    Storage {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Internal error")]
    Internal {
        #[source]
        source: anyhow::Error,
    },
}

fn join_field_errors(errors: &[ValidationFieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl AppError {
    pub fn not_found(entity: &str, field: &str, value: impl ToString) -> Self {
        AppError::NotFound {
            entity: entity.to_string(),
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub fn duplicate(entity: &str, field: &str, value: impl ToString) -> Self {
        AppError::Duplicate {
            entity: entity.to_string(),
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        AppError::Conflict {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        AppError::Unauthorized {
            message: message.into(),
        }
    }

    pub fn storage(operation: impl Into<String>, source: std::io::Error) -> Self {
        AppError::Storage {
            operation: operation.into(),
            source,
        }
    }

    /// True for requests turned away before reaching the endpoint: failed
    /// authentication or a request that does not pass validation.
    pub fn is_request_rejection(&self) -> bool {
        matches!(
            self,
            AppError::Unauthorized { .. }
                | AppError::Validation { .. }
                | AppError::ValidationErrors { .. }
                | AppError::InvalidRequest { .. }
        )
    }

    /// True for variants whose cause lives on the server side; their
    /// details are logged and replaced by a generic message for the client.
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            AppError::Database { .. }
                | AppError::ConnectionPool { .. }
                | AppError::Storage { .. }
                | AppError::Internal { .. }
        )
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal { source: error }
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(error: diesel::result::Error) -> Self {
        DatabaseErrorConverter::convert_diesel_error(error, "database operation")
    }
}

impl From<bb8::RunError<PoolError>> for AppError {
    fn from(error: bb8::RunError<PoolError>) -> Self {
        AppError::ConnectionPool {
            source: anyhow::Error::from(error),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<ValidationFieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| ValidationFieldError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("invalid value ({})", e.code)),
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        AppError::ValidationErrors { errors: fields }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest {
            message: rejection.body_text(),
        }
    }
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        AppError::InvalidRequest {
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidRequest {
            message: rejection.body_text(),
        }
    }
}

/// Malformed path segments, e.g. an id that is not a UUID
impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest {
            message: rejection.body_text(),
        }
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::BadRequest {
            message: rejection.body_text(),
        }
    }
}

/// Body limit hits surface while reading a field, so the status decides
impl From<MultipartError> for AppError {
    fn from(error: MultipartError) -> Self {
        let message = error.body_text();
        match error.status() {
            StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge { message },
            _ => AppError::BadRequest { message },
        }
    }
}

/// Type alias for Result with AppError to simplify function signatures
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct SignupForm {
        #[validate(length(min = 3, message = "Name is too short"))]
        name: String,
        #[validate(email)]
        email: String,
    }

    #[test]
    fn test_display_is_client_facing() {
        assert_eq!(
            AppError::not_found("Category", "id", 7).to_string(),
            "Category not found"
        );
        assert_eq!(
            AppError::duplicate("Product", "name", "Pen").to_string(),
            "Product name already exists"
        );
        assert_eq!(
            AppError::TooManyRequests {
                limit: 10,
                retry_after: 30
            }
            .to_string(),
            "Rate limit exceeded: 10 per 1 minute"
        );
    }

    #[test]
    fn test_validation_errors_collects_every_field() {
        let form = SignupForm {
            name: "ab".to_string(),
            email: "nope".to_string(),
        };
        let err = AppError::from(form.validate().unwrap_err());

        match &err {
            AppError::ValidationErrors { errors } => {
                assert_eq!(errors.len(), 2);
                assert_eq!(errors[0].field, "email");
                assert!(errors[0].message.contains("email"));
                assert_eq!(errors[1].field, "name");
                assert_eq!(errors[1].message, "Name is too short");
            }
            other => panic!("Expected ValidationErrors, got {:?}", other),
        }
        assert!(err.to_string().contains("name: Name is too short"));
    }

    #[test]
    fn test_server_errors_are_flagged() {
        let err = AppError::storage("write avatar", std::io::Error::other("disk full"));
        assert!(err.is_server_error());
        assert!(!AppError::unauthorized("no").is_server_error());
    }

    #[test]
    fn test_request_rejections_are_flagged() {
        assert!(AppError::unauthorized("no").is_request_rejection());
        assert!(AppError::ValidationErrors { errors: vec![] }.is_request_rejection());
        assert!(
            AppError::InvalidRequest {
                message: "bad json".into()
            }
            .is_request_rejection()
        );

        // Business rules raised by the endpoint itself still count
        assert!(
            !AppError::UnprocessableContent {
                message: "Category has registered products".into()
            }
            .is_request_rejection()
        );
        assert!(
            !AppError::BadRequest {
                message: "Invalid credentials".into()
            }
            .is_request_rejection()
        );
    }
}
