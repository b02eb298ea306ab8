//! Handlers for the Twine/Twison import pipeline and the story graph store.
//!
//! Import flow: parse (HTML only) → repair → validate → convert → persist.
//! Persistence replaces the story's whole graph inside one transaction with
//! the story row locked, so a failed import never leaves a half-written
//! graph and no reader observes one mid-replace.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use storyweave_core::audit::{ACTION_GRAPH_REPLACED, ACTION_STORY_CREATED};
use storyweave_core::error::CoreError;
use storyweave_core::graph::{
    convert, validate_visibility, StoryOverrides, StoryPayload, VISIBILITY_PRIVATE,
};
use storyweave_core::naming::resolve_credit;
use storyweave_core::twine::parse_twine_html;
use storyweave_core::twison::{repair_and_validate, TwisonStory};
use storyweave_core::types::DbId;
use storyweave_db::models::audit::CreateAuditLog;
use storyweave_db::models::story::{CreateStory, Story, UpdateStoryMeta};
use storyweave_db::repositories::{
    AuditRepo, ProfileRepo, ReplaceGraphOutcome, StoryGraphRepo, StoryRepo, UserRepo,
};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for a raw Twine 2 HTML import.
#[derive(Debug, Deserialize)]
pub struct TwineImportRequest {
    /// The full HTML export text.
    pub html: String,
    #[serde(default)]
    pub overrides: StoryOverrides,
    /// Update this existing story instead of upserting by slug.
    pub story_id: Option<DbId>,
}

/// Request body for a Twison JSON import.
#[derive(Debug, Deserialize)]
pub struct TwisonImportRequest {
    pub story: TwisonStory,
    #[serde(default)]
    pub overrides: StoryOverrides,
    pub story_id: Option<DbId>,
}

/// Import result: the stored story plus graph counts, including how many
/// transitions were dropped for unresolved references.
#[derive(Debug, Serialize)]
pub struct ImportResult {
    pub story: Story,
    pub created: bool,
    pub nodes: usize,
    pub paths: usize,
    pub transitions: usize,
    pub dropped_transitions: usize,
}

/// POST /api/v1/stories/import/twine
///
/// Import a Twine 2 HTML export. The story lands `private`; publication only
/// ever happens through the approval workflow.
pub async fn import_twine(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<TwineImportRequest>,
) -> AppResult<impl IntoResponse> {
    let story = parse_twine_html(&input.html)?;
    run_import(auth, state, story, input.overrides, input.story_id).await
}

/// POST /api/v1/stories/import/twison
///
/// Import a Twison JSON story. Same pipeline as the HTML route minus parsing.
pub async fn import_twison(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<TwisonImportRequest>,
) -> AppResult<impl IntoResponse> {
    run_import(auth, state, input.story, input.overrides, input.story_id).await
}

async fn run_import(
    auth: AuthUser,
    state: AppState,
    story: TwisonStory,
    overrides: StoryOverrides,
    story_id: Option<DbId>,
) -> AppResult<(StatusCode, Json<DataResponse<ImportResult>>)> {
    let repaired = repair_and_validate(story)?;
    let payload = convert(&repaired, &overrides);
    payload.validate()?;
    if let Some(visibility) = &payload.visibility {
        validate_visibility(visibility).map_err(CoreError::Validation)?;
    }

    let outcome = upsert_story_graph(
        &state,
        &auth,
        &payload,
        UpsertOptions {
            story_id,
            // Creators never self-publish; the approval flow flips visibility.
            enforce_visibility: Some(VISIBILITY_PRIVATE.to_string()),
        },
    )
    .await?;

    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    tracing::info!(
        user_id = auth.user_id,
        story_id = outcome.story.id,
        slug = %outcome.story.slug,
        nodes = outcome.graph.nodes,
        dropped = outcome.graph.dropped_transitions,
        "Story graph imported"
    );

    Ok((
        status,
        Json(DataResponse {
            data: ImportResult {
                created: outcome.created,
                nodes: outcome.graph.nodes,
                paths: outcome.graph.paths,
                transitions: outcome.graph.transitions,
                dropped_transitions: outcome.graph.dropped_transitions,
                story: outcome.story,
            },
        }),
    ))
}

/// Options for [`upsert_story_graph`].
pub struct UpsertOptions {
    /// Update this story's metadata instead of upserting by slug.
    pub story_id: Option<DbId>,
    /// Force this visibility regardless of what the payload requests.
    pub enforce_visibility: Option<String>,
}

/// Outcome of [`upsert_story_graph`].
pub struct UpsertOutcome {
    pub story: Story,
    pub created: bool,
    pub graph: ReplaceGraphOutcome,
}

/// Persist a story payload for an owner: resolve credit, create or update
/// the story row, and replace its graph — all in one transaction.
pub async fn upsert_story_graph(
    state: &AppState,
    auth: &AuthUser,
    payload: &StoryPayload,
    options: UpsertOptions,
) -> AppResult<UpsertOutcome> {
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Unknown account".into())))?;
    let profile = ProfileRepo::find_by_user(&state.pool, auth.user_id).await?;

    let credit = resolve_credit(
        profile.as_ref().and_then(|p| p.pen_name.as_deref()),
        user.display_name.as_deref(),
        Some(&user.username),
        Some(&user.email),
    );

    let visibility = options
        .enforce_visibility
        .or_else(|| payload.visibility.clone())
        .unwrap_or_else(|| VISIBILITY_PRIVATE.to_string());

    let mut tx = state.pool.begin().await?;

    let (existing, created) = match options.story_id {
        Some(id) => {
            let story = StoryRepo::lock_for_update(&mut tx, id)
                .await?
                .ok_or_else(|| AppError::Core(CoreError::not_found("Story", id)))?;
            if story.user_id != auth.user_id && !auth.is_admin() {
                return Err(AppError::Core(CoreError::Forbidden(
                    "You do not own this story".into(),
                )));
            }
            (Some(story), false)
        }
        None => match StoryRepo::lock_by_slug(&mut tx, &payload.slug).await? {
            Some(story) => {
                if story.user_id != auth.user_id && !auth.is_admin() {
                    return Err(AppError::Core(CoreError::Conflict(format!(
                        "slug '{}' is already in use",
                        payload.slug
                    ))));
                }
                (Some(story), false)
            }
            None => (None, true),
        },
    };

    let story = match existing {
        Some(existing) => {
            StoryRepo::update_meta(
                &mut tx,
                existing.id,
                &UpdateStoryMeta {
                    title: payload.title.clone(),
                    summary: payload.summary.clone(),
                    tags: payload.tags.clone(),
                    visibility,
                    credit: Some(credit),
                },
            )
            .await?
        }
        None => {
            let story = StoryRepo::create(
                &mut tx,
                &CreateStory {
                    slug: payload.slug.clone(),
                    title: payload.title.clone(),
                    summary: payload.summary.clone(),
                    tags: payload.tags.clone(),
                    visibility,
                    user_id: auth.user_id,
                    original_creator_id: Some(auth.user_id),
                    original_creator_profile_id: profile.as_ref().map(|p| p.id),
                    credit: Some(credit),
                },
            )
            .await?;
            AuditRepo::append(
                &mut tx,
                &CreateAuditLog {
                    story_id: story.id,
                    actor_id: Some(auth.user_id),
                    action: ACTION_STORY_CREATED.to_string(),
                    note: None,
                    metadata: Some(serde_json::json!({ "slug": story.slug })),
                },
            )
            .await?;
            story
        }
    };

    let graph = StoryGraphRepo::replace_graph(&mut tx, story.id, payload).await?;

    AuditRepo::append(
        &mut tx,
        &CreateAuditLog {
            story_id: story.id,
            actor_id: Some(auth.user_id),
            action: ACTION_GRAPH_REPLACED.to_string(),
            note: None,
            metadata: Some(serde_json::json!({
                "nodes": graph.nodes,
                "paths": graph.paths,
                "transitions": graph.transitions,
                "dropped_transitions": graph.dropped_transitions,
            })),
        },
    )
    .await?;

    tx.commit().await?;

    Ok(UpsertOutcome {
        story,
        created,
        graph,
    })
}
