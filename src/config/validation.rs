//! Configuration validation logic
//!
//! Range and format checks for every settings section. `Settings::validate`
//! returns the first failure it meets.

use jsonwebtoken::Algorithm;

use crate::config::error::ConfigError;
use crate::config::settings::{
    ApiConfig, DatabaseConfig, JwtConfig, LoggerSettings, RateLimitConfig, ServerConfig,
    Settings, StorageConfig,
};

const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::validation(
                "server.port",
                "Port must be between 1 and 65535. Please specify a valid port number.",
            ));
        }

        if self.request_timeout == 0 {
            return Err(ConfigError::validation(
                "server.request_timeout",
                "Request timeout must be greater than 0 seconds.",
            ));
        }

        if let Some(origin) = self
            .cors_origins
            .iter()
            .find(|o| !(o.starts_with("http://") || o.starts_with("https://")))
        {
            return Err(ConfigError::ValidationError {
                field: "server.cors_origins".to_string(),
                message: format!("Origin '{}' must start with http:// or https://", origin),
            });
        }

        Ok(())
    }
}

impl ApiConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid = !self.version.is_empty()
            && self
                .version
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_');
        if !valid {
            return Err(ConfigError::ValidationError {
                field: "api.version".to_string(),
                message: format!(
                    "API version '{}' must be a non-empty path segment (letters, digits, '.', '-', '_')",
                    self.version
                ),
            });
        }
        Ok(())
    }
}

impl DatabaseConfig {
    /// # Validation Rules
    /// - URL must not be empty and must use a postgres scheme
    /// - Connection counts must be positive, min must not exceed max
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.is_empty() {
            return Err(ConfigError::validation(
                "database.url",
                "Database URL is required. Please specify a valid database connection string.",
            ));
        }

        if !(self.url.starts_with("postgres://") || self.url.starts_with("postgresql://")) {
            return Err(ConfigError::validation(
                "database.url",
                "Invalid database URL format. Expected format: postgres://[user:password@]host[:port]/database",
            ));
        }

        if self.max_connections == 0 {
            return Err(ConfigError::validation(
                "database.max_connections",
                "Max connections must be greater than 0.",
            ));
        }

        if self.min_connections == 0 {
            return Err(ConfigError::validation(
                "database.min_connections",
                "Min connections must be greater than 0.",
            ));
        }

        if self.min_connections > self.max_connections {
            return Err(ConfigError::ValidationError {
                field: "database.min_connections".to_string(),
                message: format!(
                    "Min connections ({}) cannot exceed max connections ({}).",
                    self.min_connections, self.max_connections
                ),
            });
        }

        Ok(())
    }
}

impl JwtConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.is_empty() {
            return Err(ConfigError::validation(
                "jwt.secret",
                "JWT secret cannot be empty",
            ));
        }

        if self.secret.len() < 32 {
            return Err(ConfigError::validation(
                "jwt.secret",
                "JWT secret should be at least 32 characters for security",
            ));
        }

        if !matches!(
            self.algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(ConfigError::ValidationError {
                field: "jwt.algorithm".to_string(),
                message: format!(
                    "Unsupported algorithm {:?}. Valid algorithms are: HS256, HS384, HS512",
                    self.algorithm
                ),
            });
        }

        if self.access_token_expiration <= 0 {
            return Err(ConfigError::validation(
                "jwt.access_token_expiration",
                "Access token expiration must be positive",
            ));
        }

        Ok(())
    }
}

impl RateLimitConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }
        if self.requests_per_minute == 0 {
            return Err(ConfigError::validation(
                "rate_limit.requests_per_minute",
                "Requests per minute must be greater than 0 when rate limiting is enabled.",
            ));
        }
        if self.auth_requests_per_minute == 0 {
            return Err(ConfigError::validation(
                "rate_limit.auth_requests_per_minute",
                "Auth requests per minute must be greater than 0 when rate limiting is enabled.",
            ));
        }
        Ok(())
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upload_dir.trim().is_empty() {
            return Err(ConfigError::validation(
                "storage.upload_dir",
                "Upload directory cannot be empty.",
            ));
        }
        if self.max_upload_size == 0 {
            return Err(ConfigError::validation(
                "storage.max_upload_size",
                "Max upload size must be greater than 0 bytes.",
            ));
        }
        Ok(())
    }
}

impl LoggerSettings {
    /// # Validation Rules
    /// - Log level must be one of: trace, debug, info, warn, error
    /// - If file logging is enabled, path must not be empty
    /// - Log format must be one of: full, compact, json
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Valid levels are: {}",
                    self.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        if self.file.enabled && self.file.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.file.path",
                "File path is required when file logging is enabled.",
            ));
        }

        if !VALID_LOG_FORMATS.contains(&self.file.format.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.file.format".to_string(),
                message: format!(
                    "Invalid log format '{}'. Valid formats are: {}",
                    self.file.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            });
        }

        if !self.console.enabled && !self.file.enabled {
            return Err(ConfigError::validation(
                "logger",
                "At least one output (console or file) must be enabled.",
            ));
        }

        Ok(())
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.api.validate()?;
        self.database.validate()?;
        self.jwt.validate()?;
        self.rate_limit.validate()?;
        self.storage.validate()?;
        self.logger.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_settings() -> Settings {
        let mut settings = Settings::default();
        settings.database.url = "postgres://localhost/stock".to_string();
        settings.jwt.secret = "a".repeat(32);
        settings
    }

    fn failing_field(settings: &Settings) -> String {
        match settings.validate().unwrap_err() {
            ConfigError::ValidationError { field, .. } => field,
            other => panic!("Expected ValidationError, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_settings() {
        assert!(valid_settings().validate().is_ok());
    }

    #[test]
    fn test_server_port_zero() {
        let mut settings = valid_settings();
        settings.server.port = 0;
        assert_eq!(failing_field(&settings), "server.port");
    }

    #[test]
    fn test_server_bad_cors_origin() {
        let mut settings = valid_settings();
        settings.server.cors_origins = vec!["localhost:3000".to_string()];
        assert_eq!(failing_field(&settings), "server.cors_origins");
    }

    #[test]
    fn test_api_version_with_slash_rejected() {
        let mut settings = valid_settings();
        settings.api.version = "v1/admin".to_string();
        assert_eq!(failing_field(&settings), "api.version");
    }

    #[test]
    fn test_database_url_required() {
        let mut settings = valid_settings();
        settings.database.url.clear();
        assert_eq!(failing_field(&settings), "database.url");
    }

    #[test]
    fn test_database_non_postgres_scheme() {
        let mut settings = valid_settings();
        settings.database.url = "mysql://localhost/stock".to_string();
        assert_eq!(failing_field(&settings), "database.url");
    }

    #[test]
    fn test_database_min_exceeds_max() {
        let mut settings = valid_settings();
        settings.database.min_connections = 20;
        settings.database.max_connections = 5;
        assert_eq!(failing_field(&settings), "database.min_connections");
    }

    #[test]
    fn test_jwt_secret_too_short() {
        let mut settings = valid_settings();
        settings.jwt.secret = "short".to_string();
        match settings.validate().unwrap_err() {
            ConfigError::ValidationError { field, message } => {
                assert_eq!(field, "jwt.secret");
                assert!(message.contains("at least 32 characters"));
            }
            other => panic!("Expected ValidationError, got {:?}", other),
        }
    }

    #[test]
    fn test_jwt_asymmetric_algorithm_rejected() {
        let mut settings = valid_settings();
        settings.jwt.algorithm = Algorithm::RS256;
        assert_eq!(failing_field(&settings), "jwt.algorithm");
    }

    #[test]
    fn test_jwt_expiration_must_be_positive() {
        let mut settings = valid_settings();
        settings.jwt.access_token_expiration = 0;
        assert_eq!(failing_field(&settings), "jwt.access_token_expiration");
    }

    #[test]
    fn test_rate_limit_zero_only_checked_when_enabled() {
        let mut settings = valid_settings();
        settings.rate_limit.requests_per_minute = 0;
        assert_eq!(failing_field(&settings), "rate_limit.requests_per_minute");

        settings.rate_limit.enabled = false;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_storage_upload_dir_required() {
        let mut settings = valid_settings();
        settings.storage.upload_dir = "  ".to_string();
        assert_eq!(failing_field(&settings), "storage.upload_dir");
    }

    #[test]
    fn test_logger_invalid_level() {
        let mut settings = valid_settings();
        settings.logger.level = "verbose".to_string();
        assert_eq!(failing_field(&settings), "logger.level");
    }

    #[test]
    fn test_logger_needs_an_output() {
        let mut settings = valid_settings();
        settings.logger.console.enabled = false;
        settings.logger.file.enabled = false;
        assert_eq!(failing_field(&settings), "logger");
    }
}
