use crate::error::AppError;
use diesel::result::{DatabaseErrorKind, DatabaseErrorInformation, Error as DieselError};

/// Unique constraints declared by the migrations, mapped to (entity, field).
const UNIQUE_CONSTRAINTS: &[(&str, &str, &str)] = &[
    ("users_email_key", "User", "email"),
    ("categories_name_key", "Category", "name"),
    ("products_name_key", "Product", "name"),
];

/// Foreign keys declared by the migrations, mapped to (parent, children).
const FOREIGN_KEYS: &[(&str, &str, &str)] = &[
    ("products_category_id_fkey", "Category", "products"),
    ("categories_user_id_fkey", "User", "categories"),
];

/// Converts Diesel errors into structured `AppError` variants.
///
/// Constraint violations are recognised by constraint name only; anything
/// unknown stays a `Database` error and is reported as a 500.
pub struct DatabaseErrorConverter;

impl DatabaseErrorConverter {
    /// Error mapper for `map_err` that records `operation`.
    ///
    /// Operations starting with `delete` treat a foreign key violation as a
    /// parent that still has children; any other operation treats it as a
    /// missing parent.
    pub fn for_operation(operation: &'static str) -> impl Fn(DieselError) -> AppError {
        move |error| Self::convert_diesel_error(error, operation)
    }

    pub fn convert_diesel_error(error: DieselError, operation: &str) -> AppError {
        match error {
            DieselError::DatabaseError(kind, info) => {
                Self::convert_database_error(kind, info.as_ref(), operation)
            }
            DieselError::NotFound => AppError::not_found("Resource", "id", "unknown"),
            other => AppError::Database {
                operation: operation.to_string(),
                source: anyhow::Error::from(other),
            },
        }
    }

    fn convert_database_error(
        kind: DatabaseErrorKind,
        info: &(dyn DatabaseErrorInformation + Send + Sync),
        operation: &str,
    ) -> AppError {
        let constraint = info.constraint_name().unwrap_or_default();

        match kind {
            DatabaseErrorKind::UniqueViolation => {
                if let Some((_, entity, field)) =
                    UNIQUE_CONSTRAINTS.iter().find(|(name, _, _)| *name == constraint)
                {
                    return AppError::duplicate(entity, field, info.details().unwrap_or_default());
                }
            }
            DatabaseErrorKind::ForeignKeyViolation => {
                if let Some((_, parent, children)) =
                    FOREIGN_KEYS.iter().find(|(name, _, _)| *name == constraint)
                {
                    if operation.starts_with("delete") {
                        return AppError::UnprocessableContent {
                            message: format!("{} has registered {}", parent, children),
                        };
                    }
                    return AppError::not_found(parent, "id", info.details().unwrap_or_default());
                }
            }
            _ => {}
        }

        AppError::Database {
            operation: operation.to_string(),
            source: anyhow::anyhow!("{:?}: {}", kind, info.message()),
        }
    }
}
