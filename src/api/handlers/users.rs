//! User account handlers: registration, sign-in, profile and avatar.

use axum::{
    Extension, Json,
    extract::{Multipart, State},
    http::StatusCode,
    middleware,
    response::Response,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::USER_TAG;
use crate::api::dto::{
    AvatarUpload, ErrorResponse, RateLimitResponse, ResetPasswordRequest, SigninForm,
    SignupRequest, TokenResponse, UpdateProfileRequest, UserResponse,
};
use crate::api::handlers::{file_response, read_upload};
use crate::api::middleware::{CurrentUser, auth_middleware};
use crate::error::AppResult;
use crate::state::AppState;
use crate::utils::jwt::generate_access_token;
use crate::utils::validate::{ValidatedForm, ValidatedJson};

/// Creates user-related routes.
///
/// Routes:
/// - POST /signup          - Register (public)
/// - POST /signin          - Exchange credentials for a token (public)
/// - GET /me               - Current user
/// - PUT /update           - Change name
/// - PUT /reset-password   - Change password
/// - PATCH /               - Upload avatar
/// - GET /file             - Download avatar
pub fn user_routes(state: AppState) -> OpenApiRouter<AppState> {
    let protected = OpenApiRouter::new()
        .routes(routes!(me))
        .routes(routes!(update_profile))
        .routes(routes!(reset_password))
        .routes(routes!(upload_avatar))
        .routes(routes!(avatar_file))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    OpenApiRouter::new()
        .routes(routes!(signup))
        .routes(routes!(signin))
        .merge(protected)
}

/// POST /users/signup - Register a new user
#[utoipa::path(
    post,
    path = "/signup",
    tag = USER_TAG,
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 409, description = "Email is already registered", body = ErrorResponse),
        (status = 422, description = "Invalid request body", body = ErrorResponse)
    )
)]
async fn signup(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<SignupRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let user = state
        .services
        .users
        .signup(payload.name, payload.email, &payload.password)
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// POST /users/signin - Obtain an access token
///
/// Takes an OAuth2 password form where `username` is the email address.
#[utoipa::path(
    post,
    path = "/signin",
    tag = USER_TAG,
    request_body(content = SigninForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Signed in", body = TokenResponse),
        (status = 400, description = "Invalid credentials", body = ErrorResponse),
        (status = 429, description = "Too many attempts", body = RateLimitResponse)
    )
)]
async fn signin(
    State(state): State<AppState>,
    ValidatedForm(form): ValidatedForm<SigninForm>,
) -> AppResult<Json<TokenResponse>> {
    let user = state
        .services
        .users
        .signin(&form.username, &form.password)
        .await?;
    let token = generate_access_token(user.id, &state.jwt_config)?;

    tracing::info!(user_id = %user.id, "User signed in");
    Ok(Json(TokenResponse::bearer(token)))
}

/// GET /users/me - Current user
#[utoipa::path(
    get,
    path = "/me",
    tag = USER_TAG,
    responses(
        (status = 200, description = "Authenticated user", body = UserResponse),
        (status = 401, description = "Invalid or expired token", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<UserResponse> {
    Json(UserResponse::from(user))
}

/// PUT /users/update - Change the current user's name
#[utoipa::path(
    put,
    path = "/update",
    tag = USER_TAG,
    request_body = UpdateProfileRequest,
    responses(
        (status = 202, description = "Profile updated", body = UserResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn update_profile(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<UpdateProfileRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let user = state
        .services
        .users
        .update_profile(user.id, payload.name)
        .await?;

    Ok((StatusCode::ACCEPTED, Json(UserResponse::from(user))))
}

/// PUT /users/reset-password - Change the current user's password
#[utoipa::path(
    put,
    path = "/reset-password",
    tag = USER_TAG,
    request_body = ResetPasswordRequest,
    responses(
        (status = 202, description = "Password changed", body = UserResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn reset_password(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<ResetPasswordRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let user = state
        .services
        .users
        .update_password(user.id, &payload.password)
        .await?;

    Ok((StatusCode::ACCEPTED, Json(UserResponse::from(user))))
}

/// PATCH /users - Upload a new avatar
#[utoipa::path(
    patch,
    path = "/",
    tag = USER_TAG,
    request_body(content = AvatarUpload, content_type = "multipart/form-data"),
    responses(
        (status = 202, description = "Avatar stored", body = UserResponse),
        (status = 406, description = "Invalid file type", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn upload_avatar(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let upload = read_upload(multipart, "avatar").await?;
    let user = state
        .services
        .users
        .upload_avatar(&user, &upload.filename, &upload.bytes)
        .await?;

    Ok((StatusCode::ACCEPTED, Json(UserResponse::from(user))))
}

/// GET /users/file - Download the current user's avatar
#[utoipa::path(
    get,
    path = "/file",
    tag = USER_TAG,
    responses(
        (status = 200, description = "Avatar image, jpeg or png"),
        (status = 404, description = "Avatar not found", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn avatar_file(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> AppResult<Response> {
    let file = state.services.users.avatar(&user).await?;
    Ok(file_response(file))
}
