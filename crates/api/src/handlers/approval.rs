//! Handlers for the approval decision endpoints.
//!
//! One decision routine serves both surfaces: the admin UI POSTs JSON, and
//! the emailed one-click links GET with a query string and receive an HTML
//! confirmation panel. Authorization precedence: an admin session always
//! wins and needs no token; otherwise a token matching the one stored on the
//! version at submission time is mandatory, and the story-level expiry is
//! enforced. All token failures share one constant message.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use storyweave_core::approval::{
    decision_status, ensure_pending, token_expired, token_matches, validate_decision,
    DECISION_APPROVE, STATUS_APPROVED, TOKEN_REJECTED_MESSAGE,
};
use storyweave_core::audit::{ACTION_APPROVED, ACTION_REJECTED};
use storyweave_core::error::CoreError;
use storyweave_core::types::DbId;
use storyweave_db::models::audit::CreateAuditLog;
use storyweave_db::models::story::Story;
use storyweave_db::models::version::StoryVersion;
use storyweave_db::repositories::{
    AuditRepo, AvatarRepo, StoryRepo, StoryVersionRepo, UserRepo,
};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for the JSON decision endpoint.
#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub decision: String,
    pub token: Option<String>,
}

/// Query string for the emailed-link decision endpoint.
#[derive(Debug, Deserialize)]
pub struct DecisionLinkQuery {
    pub decision: Option<String>,
    pub token: Option<String>,
}

/// Query string for the preview endpoint.
#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    pub token: Option<String>,
}

/// Outcome of a decision, returned to both surfaces.
#[derive(Debug, Serialize)]
pub struct DecisionResult {
    pub version: StoryVersion,
    pub story: Story,
    pub avatars_activated: u64,
}

/// POST /api/v1/approvals/{version_id}
///
/// JSON decision submission for the admin UI (also accepts a token in the
/// body for non-session callers).
pub async fn decide_version_json(
    auth: Option<AuthUser>,
    State(state): State<AppState>,
    Path(version_id): Path<DbId>,
    Json(input): Json<DecisionRequest>,
) -> AppResult<impl IntoResponse> {
    let result = apply_decision(
        &state,
        version_id,
        &input.decision,
        auth.as_ref(),
        input.token.as_deref(),
    )
    .await?;
    Ok(Json(DataResponse { data: result }))
}

/// GET /api/v1/approvals/{version_id}?decision=...&token=...
///
/// Query-string decision submission for emailed one-click links. Returns an
/// HTML confirmation panel on both success and failure, with the same
/// status codes as the JSON surface.
pub async fn decide_version_link(
    auth: Option<AuthUser>,
    State(state): State<AppState>,
    Path(version_id): Path<DbId>,
    Query(query): Query<DecisionLinkQuery>,
) -> Response {
    let Some(decision) = query.decision.as_deref() else {
        return panel_response(
            StatusCode::BAD_REQUEST,
            "Missing decision",
            "The link did not carry a decision. Use the approve or reject link from the review email.",
        );
    };

    match apply_decision(&state, version_id, decision, auth.as_ref(), query.token.as_deref())
        .await
    {
        Ok(result) => {
            let verdict = if result.version.status == STATUS_APPROVED {
                "approved and published"
            } else {
                "rejected and returned to its creator"
            };
            panel_response(
                StatusCode::OK,
                "Decision recorded",
                &format!(
                    "\"{}\" (version {}) has been {verdict}.",
                    result.story.title, result.version.version_number
                ),
            )
        }
        Err(err) => {
            let (status, _, message) = err.parts();
            panel_response(status, "Decision not recorded", &message)
        }
    }
}

/// GET /api/v1/approvals/{version_id}/preview?token=...
///
/// Token-gated review preview of the submitted snapshot. Shares the decision
/// path's authorization, including expiry.
pub async fn preview_version(
    auth: Option<AuthUser>,
    State(state): State<AppState>,
    Path(version_id): Path<DbId>,
    Query(query): Query<PreviewQuery>,
) -> AppResult<impl IntoResponse> {
    let version = StoryVersionRepo::find_by_id(&state.pool, version_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("StoryVersion", version_id)))?;
    let story = StoryRepo::find_by_id(&state.pool, version.story_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Story", version.story_id)))?;

    authorize_review(auth.as_ref(), &version, &story, query.token.as_deref())?;

    Ok(Json(DataResponse {
        data: serde_json::json!({
            "version": version,
            "story": story,
        }),
    }))
}

/// Authorize a review action: admin session, or matching unexpired token.
///
/// Returns the reviewer's user id when the actor is an admin session.
fn authorize_review(
    actor: Option<&AuthUser>,
    version: &StoryVersion,
    story: &Story,
    token: Option<&str>,
) -> Result<Option<DbId>, AppError> {
    if let Some(actor) = actor {
        if actor.is_admin() {
            return Ok(Some(actor.user_id));
        }
    }

    let supplied = token.ok_or_else(forbidden_token)?;
    if !token_matches(supplied, version.approval_token()) {
        return Err(forbidden_token());
    }
    if token_expired(story.approval_token_expires_at, chrono::Utc::now()) {
        return Err(forbidden_token());
    }
    Ok(None)
}

fn forbidden_token() -> AppError {
    AppError::Core(CoreError::Forbidden(TOKEN_REJECTED_MESSAGE.into()))
}

/// Apply a decision to a pending version and fan out its side effects.
async fn apply_decision(
    state: &AppState,
    version_id: DbId,
    decision: &str,
    actor: Option<&AuthUser>,
    token: Option<&str>,
) -> AppResult<DecisionResult> {
    validate_decision(decision).map_err(CoreError::Validation)?;
    let new_status = decision_status(decision)
        .ok_or_else(|| AppError::InternalError("unmapped decision".into()))?;

    let mut tx = state.pool.begin().await?;

    // Resolve the parent story first and lock it; the version re-read below
    // then sees any decision that committed before we got the lock.
    let version = StoryVersionRepo::find_by_id_tx(&mut tx, version_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("StoryVersion", version_id)))?;
    let story = StoryRepo::lock_for_update(&mut tx, version.story_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Story", version.story_id)))?;
    let version = StoryVersionRepo::find_by_id_tx(&mut tx, version_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("StoryVersion", version_id)))?;

    let reviewer_id = authorize_review(actor, &version, &story, token)?;

    let decided = StoryVersionRepo::decide(&mut tx, version.id, new_status, reviewer_id).await?;
    let Some(decided) = decided else {
        // The version was already terminal; answer with its current status.
        ensure_pending(&version.status)?;
        return Err(AppError::InternalError(
            "decision update matched no pending version".into(),
        ));
    };

    let approved = decision == DECISION_APPROVE;
    let (story, avatars_activated) = if approved {
        let story =
            StoryRepo::apply_approval(&mut tx, story.id, decided.id, reviewer_id).await?;
        let activated = AvatarRepo::set_playable_for_story(&mut tx, story.id, true).await?;
        (story, activated)
    } else {
        let story = StoryRepo::apply_rejection(&mut tx, story.id).await?;
        (story, 0)
    };

    AuditRepo::append(
        &mut tx,
        &CreateAuditLog {
            story_id: story.id,
            actor_id: reviewer_id,
            action: if approved {
                ACTION_APPROVED.to_string()
            } else {
                ACTION_REJECTED.to_string()
            },
            note: None,
            metadata: Some(serde_json::json!({
                "version_id": decided.id,
                "version_number": decided.version_number,
                "via_token": reviewer_id.is_none(),
            })),
        },
    )
    .await?;

    tx.commit().await?;

    tracing::info!(
        story_id = story.id,
        version_id = decided.id,
        status = %decided.status,
        avatars_activated,
        "Approval decision applied"
    );

    // The decision is committed and authoritative; creator notification is
    // best-effort from here.
    notify_creator(state, &story, &decided, approved).await;

    Ok(DecisionResult {
        version: decided,
        story,
        avatars_activated,
    })
}

/// Best-effort decision notice to the original creator. Failures are logged,
/// never propagated — the state change has already committed.
async fn notify_creator(state: &AppState, story: &Story, version: &StoryVersion, approved: bool) {
    let creator_id = story.original_creator_id.unwrap_or(story.user_id);
    let creator = match UserRepo::find_by_id(&state.pool, creator_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::warn!(story_id = story.id, creator_id, "Creator not found for notice");
            return;
        }
        Err(err) => {
            tracing::warn!(error = %err, story_id = story.id, "Creator lookup failed for notice");
            return;
        }
    };

    if let Err(err) = state
        .notifier
        .send_decision_notice(&creator.email, &story.title, version.version_number, approved)
        .await
    {
        tracing::warn!(
            error = %err,
            story_id = story.id,
            to = %creator.email,
            "Decision notice delivery failed"
        );
    }
}

/// Minimal self-contained HTML confirmation panel for emailed links.
fn panel_response(status: StatusCode, heading: &str, message: &str) -> Response {
    let body = format!(
        "<!doctype html>\n\
         <html lang=\"en\">\n\
         <head><meta charset=\"utf-8\"><title>Storyweave review</title></head>\n\
         <body style=\"font-family: sans-serif; max-width: 32rem; margin: 4rem auto;\">\n\
           <h1 style=\"font-size: 1.25rem;\">{heading}</h1>\n\
           <p>{}</p>\n\
         </body>\n\
         </html>\n",
        escape_html(message)
    );
    (status, Html(body)).into_response()
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
