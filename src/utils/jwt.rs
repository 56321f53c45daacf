use jiff::{SignedDuration, Timestamp};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::error::{AppError, AppResult};

/// The only token type this service issues
pub const ACCESS_TOKEN_TYPE: &str = "access_token";

/// Message returned for every token failure so callers cannot tell them apart
pub const INVALID_TOKEN_MESSAGE: &str = "Invalid or expired token";

/// JWT claims carried by access tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    pub token_type: String,
    /// Issued at, seconds since the epoch
    pub iat: i64,
    /// Expiration, seconds since the epoch
    pub exp: i64,
}

impl Claims {
    /// Builds access-token claims valid for `lifetime_minutes` from now
    pub fn access(user_id: Uuid, lifetime_minutes: i64) -> AppResult<Self> {
        let now = Timestamp::now();
        let exp = now
            .checked_add(SignedDuration::from_mins(lifetime_minutes))
            .map_err(|e| AppError::Internal {
                source: anyhow::anyhow!("Token expiration out of range: {}", e),
            })?;

        Ok(Self {
            sub: user_id.to_string(),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
            iat: now.as_second(),
            exp: exp.as_second(),
        })
    }

    /// Parses the subject as a user id
    pub fn user_id(&self) -> AppResult<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|_| AppError::unauthorized(INVALID_TOKEN_MESSAGE))
    }
}

/// Signs an access token for a user with the configured secret and algorithm
///
/// # Example
/// ```ignore
/// let token = generate_access_token(user.id, &settings.jwt)?;
/// ```
pub fn generate_access_token(user_id: Uuid, config: &JwtConfig) -> AppResult<String> {
    let claims = Claims::access(user_id, config.access_token_expiration)?;
    encode_claims(&claims, config)
}

pub(crate) fn encode_claims(claims: &Claims, config: &JwtConfig) -> AppResult<String> {
    encode(
        &Header::new(config.algorithm),
        claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal {
        source: anyhow::anyhow!("Failed to generate JWT token: {}", e),
    })
}

/// Decodes and validates an access token
///
/// Signature, algorithm, `exp` and `token_type` are all checked. Every
/// failure maps to the same `Unauthorized` error; the cause is only logged.
pub fn validate_access_token(token: &str, config: &JwtConfig) -> AppResult<Claims> {
    let mut validation = Validation::new(config.algorithm);
    validation.set_required_spec_claims(&["exp", "sub"]);

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!(error = %e, kind = ?e.kind(), "Rejected bearer token");
        AppError::unauthorized(INVALID_TOKEN_MESSAGE)
    })?;

    if claims.token_type != ACCESS_TOKEN_TYPE {
        tracing::debug!(token_type = %claims.token_type, "Rejected bearer token type");
        return Err(AppError::unauthorized(INVALID_TOKEN_MESSAGE));
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::Algorithm;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "a-test-secret-that-is-long-enough-for-hs256".to_string(),
            algorithm: Algorithm::HS256,
            access_token_expiration: 30,
        }
    }

    fn assert_rejected(result: AppResult<Claims>) {
        match result {
            Err(AppError::Unauthorized { message }) => assert_eq!(message, INVALID_TOKEN_MESSAGE),
            other => panic!("Expected Unauthorized error, got {:?}", other),
        }
    }

    #[test]
    fn test_generate_and_validate() {
        let user_id = Uuid::new_v4();
        let token = generate_access_token(user_id, &config()).unwrap();

        let claims = validate_access_token(&token, &config()).unwrap();
        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.token_type, ACCESS_TOKEN_TYPE);
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn test_wrong_secret() {
        let token = generate_access_token(Uuid::new_v4(), &config()).unwrap();
        let other = JwtConfig {
            secret: "another-secret-that-is-also-long-enough".to_string(),
            ..config()
        };

        assert_rejected(validate_access_token(&token, &other));
    }

    #[test]
    fn test_algorithm_mismatch() {
        let token = generate_access_token(Uuid::new_v4(), &config()).unwrap();
        let hs512 = JwtConfig {
            algorithm: Algorithm::HS512,
            ..config()
        };

        assert_rejected(validate_access_token(&token, &hs512));
    }

    #[test]
    fn test_expired_token() {
        let mut claims = Claims::access(Uuid::new_v4(), 30).unwrap();
        claims.iat -= 7200;
        claims.exp = claims.iat + 60;
        let token = encode_claims(&claims, &config()).unwrap();

        assert_rejected(validate_access_token(&token, &config()));
    }

    #[test]
    fn test_wrong_token_type() {
        let mut claims = Claims::access(Uuid::new_v4(), 30).unwrap();
        claims.token_type = "refresh_token".to_string();
        let token = encode_claims(&claims, &config()).unwrap();

        assert_rejected(validate_access_token(&token, &config()));
    }

    #[test]
    fn test_garbage_token() {
        assert_rejected(validate_access_token("not.a.token", &config()));
    }

    #[test]
    fn test_subject_must_be_uuid() {
        let claims = Claims {
            sub: "42".to_string(),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
            iat: 0,
            exp: 0,
        };
        assert!(matches!(claims.user_id(), Err(AppError::Unauthorized { .. })));
    }
}
