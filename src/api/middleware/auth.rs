//! Bearer-token authentication middleware.
//!
//! Resolves the caller from `Authorization: Bearer <token>` and stores it in
//! the request extensions as [`CurrentUser`].

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::models::User;
use crate::state::AppState;
use crate::utils::jwt::{INVALID_TOKEN_MESSAGE, validate_access_token};

/// The authenticated user, extracted in handlers with `Extension<CurrentUser>`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Token part of a `Bearer` authorization header. The scheme is matched
/// case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// JWT authentication middleware
///
/// # Errors
/// 401 with `WWW-Authenticate: Bearer` when the header is missing or
/// malformed, the token fails validation, or its subject is not a known user.
///
/// # Example
/// ```ignore
/// OpenApiRouter::new()
///     .routes(routes!(me))
///     .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
/// ```
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let rejected = || AppError::unauthorized(INVALID_TOKEN_MESSAGE);

    let token = bearer_token(request.headers()).ok_or_else(rejected)?;
    let claims = validate_access_token(token, &state.jwt_config)?;
    let user_id = claims.user_id()?;

    let user = state
        .services
        .users
        .find_user(user_id)
        .await?
        .ok_or_else(|| {
            tracing::debug!(%user_id, "Token subject no longer exists");
            rejected()
        })?;

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}
