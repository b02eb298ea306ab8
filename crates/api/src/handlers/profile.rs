//! Handlers for the creator profile.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use storyweave_core::error::CoreError;
use storyweave_db::models::profile::UpsertCreatorProfile;
use storyweave_db::repositories::ProfileRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/creator-profile
pub async fn get_my_profile(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let profile = ProfileRepo::find_by_user(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("CreatorProfile", auth.user_id)))?;
    Ok(Json(DataResponse { data: profile }))
}

/// PUT /api/v1/creator-profile
///
/// Create or update the caller's profile. Recording a pen name stamps
/// `completed_at`, which unlocks story submission.
pub async fn upsert_my_profile(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpsertCreatorProfile>,
) -> AppResult<impl IntoResponse> {
    let profile = ProfileRepo::upsert_for_user(&state.pool, auth.user_id, &input).await?;

    tracing::info!(
        user_id = auth.user_id,
        complete = profile.completed_at.is_some(),
        "Creator profile saved"
    );

    Ok(Json(DataResponse { data: profile }))
}
