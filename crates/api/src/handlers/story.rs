//! Handlers for story listing, detail, versions, and audit trail.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use storyweave_core::error::CoreError;
use storyweave_core::types::DbId;
use storyweave_db::models::graph::StoryGraph;
use storyweave_db::models::story::Story;
use storyweave_db::repositories::{AuditRepo, StoryGraphRepo, StoryRepo, StoryVersionRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{require_admin, AuthUser};
use crate::response::DataResponse;
use crate::state::AppState;

/// Default page size for audit-log listings.
const AUDIT_LOG_LIMIT: i64 = 100;

/// A story together with its working graph.
#[derive(Debug, Serialize)]
pub struct StoryDetail {
    #[serde(flatten)]
    pub story: Story,
    pub graph: StoryGraph,
}

/// GET /api/v1/stories
///
/// List the caller's own stories, newest first.
pub async fn list_my_stories(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let stories = StoryRepo::list_for_owner(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: stories }))
}

/// GET /api/v1/stories/{story_id}
///
/// Fetch a story with its graph. Owner or admin only.
pub async fn get_story(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(story_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let story = StoryRepo::find_by_id(&state.pool, story_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Story", story_id)))?;
    if story.user_id != auth.user_id && !auth.is_admin() {
        return Err(AppError::Core(CoreError::Forbidden(
            "You do not own this story".into(),
        )));
    }

    let mut conn = state.pool.acquire().await?;
    let graph = StoryGraphRepo::fetch_graph(&mut conn, story.id).await?;
    Ok(Json(DataResponse {
        data: StoryDetail { story, graph },
    }))
}

/// GET /api/v1/stories/slug/{slug}
///
/// Fetch a public story with its graph. No authentication required.
pub async fn get_public_story(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    let story = StoryRepo::find_public_by_slug(&state.pool, &slug)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::NotFound {
            entity: "Story",
            id: slug,
        }))?;

    let mut conn = state.pool.acquire().await?;
    let graph = StoryGraphRepo::fetch_graph(&mut conn, story.id).await?;
    Ok(Json(DataResponse {
        data: StoryDetail { story, graph },
    }))
}

/// GET /api/v1/stories/{story_id}/versions
///
/// List review snapshots for a story (without snapshot bodies). Owner or
/// admin only.
pub async fn list_versions(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(story_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let story = StoryRepo::find_by_id(&state.pool, story_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Story", story_id)))?;
    if story.user_id != auth.user_id && !auth.is_admin() {
        return Err(AppError::Core(CoreError::Forbidden(
            "You do not own this story".into(),
        )));
    }

    let versions = StoryVersionRepo::list_for_story(&state.pool, story.id).await?;
    Ok(Json(DataResponse { data: versions }))
}

/// GET /api/v1/stories/{story_id}/audit-log
///
/// List the story's append-only audit trail. Admin only.
pub async fn list_audit_log(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(story_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    require_admin(&auth)?;

    let story = StoryRepo::find_by_id(&state.pool, story_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Story", story_id)))?;

    let entries = AuditRepo::list_for_story(&state.pool, story.id, AUDIT_LOG_LIMIT).await?;
    Ok(Json(DataResponse { data: entries }))
}
