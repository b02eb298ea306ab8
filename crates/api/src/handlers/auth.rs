//! Handlers for account registration, login, token refresh, and identity.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use storyweave_core::error::CoreError;
use storyweave_db::models::user::{CreateUser, User};
use storyweave_db::repositories::UserRepo;

use crate::auth::jwt::{generate_access_token, generate_refresh_token, hash_refresh_token};
use crate::auth::password::{hash_password, validate_password_strength, verify_password};
use crate::auth::{MIN_PASSWORD_LENGTH, ROLE_CREATOR};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for registration.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 40))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Token pair plus the authenticated account.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

/// POST /api/v1/auth/register
///
/// Create a creator account. Usernames and emails are unique; collisions
/// surface as 409 via the database constraint.
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    validate_password_strength(&input.password, MIN_PASSWORD_LENGTH)
        .map_err(CoreError::Validation)?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("password hashing failed: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            username: input.username,
            email: input.email,
            password_hash,
            display_name: input.display_name,
            role: ROLE_CREATOR.to_string(),
        },
    )
    .await?;

    tracing::info!(user_id = user.id, username = %user.username, "Account registered");

    Ok((StatusCode::CREATED, Json(DataResponse { data: user })))
}

/// POST /api/v1/auth/login
///
/// Verify credentials and issue an access/refresh token pair. The rejection
/// message is constant regardless of which check failed.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    const REJECTED: &str = "Invalid username or password";

    let user = UserRepo::find_by_username(&state.pool, &input.username)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized(REJECTED.into())))?;

    let verified = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("password verification failed: {e}")))?;
    if !verified {
        return Err(AppError::Core(CoreError::Unauthorized(REJECTED.into())));
    }

    let session = issue_session(&state, user).await?;
    Ok(Json(DataResponse { data: session }))
}

/// POST /api/v1/auth/refresh
///
/// Rotate a refresh token: the presented token is consumed and a fresh pair
/// is issued.
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> AppResult<impl IntoResponse> {
    let token_hash = hash_refresh_token(&input.refresh_token);
    let session = UserRepo::find_refresh_session(&state.pool, &token_hash)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired refresh token".into()))
        })?;

    UserRepo::delete_refresh_session(&state.pool, &token_hash).await?;

    let user = UserRepo::find_by_id(&state.pool, session.user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Account is not active".into())))?;

    let session = issue_session(&state, user).await?;
    Ok(Json(DataResponse { data: session }))
}

/// GET /api/v1/auth/me
pub async fn me(auth: AuthUser, State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("User", auth.user_id)))?;
    Ok(Json(DataResponse { data: user }))
}

async fn issue_session(state: &AppState, user: User) -> AppResult<SessionResponse> {
    let access_token = generate_access_token(user.id, &user.role, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("token generation failed: {e}")))?;

    let (refresh_token, refresh_hash) = generate_refresh_token();
    let expires_at = chrono::Utc::now()
        + chrono::Duration::days(state.config.jwt.refresh_token_expiry_days);
    UserRepo::create_refresh_session(&state.pool, user.id, &refresh_hash, expires_at).await?;

    tracing::info!(user_id = user.id, "Session issued");

    Ok(SessionResponse {
        access_token,
        refresh_token,
        user,
    })
}
