//! Handler for submitting a story version for approval.
//!
//! Submission snapshots the current graph into a new pending version, mints
//! the one-time approval token, and emails the review inbox. The whole cycle
//! is all-or-nothing: the notification is sent *before* the transaction
//! commits, so a failed send rolls back the version instead of leaving a
//! pending version nobody was told about. An unconfigured mailer is not a
//! failure — the submission commits and reports `notified: false`.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use storyweave_core::approval::{
    mint_approval_token, validate_consent, ConsentAck, APPROVAL_TOKEN_TTL_DAYS,
};
use storyweave_core::audit::ACTION_SUBMITTED_FOR_APPROVAL;
use storyweave_core::error::CoreError;
use storyweave_core::types::DbId;
use storyweave_db::models::audit::CreateAuditLog;
use storyweave_db::models::story::ConsentProvenance;
use storyweave_db::models::version::{CreateStoryVersion, StoryVersion};
use storyweave_db::repositories::{
    AuditRepo, ProfileRepo, StoryGraphRepo, StoryRepo, StoryVersionRepo,
};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for submitting a story for approval.
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    /// Two-part ownership acknowledgement; both halves must be `true`.
    pub consent: ConsentAck,
    /// Optional note for the reviewer, recorded in the audit trail.
    pub note: Option<String>,
}

/// Submission result: the pending version plus whether the review inbox was
/// actually notified (`false` when no mailer is configured).
#[derive(Debug, Serialize)]
pub struct SubmitResult {
    pub version: StoryVersion,
    pub notified: bool,
}

/// POST /api/v1/stories/{story_id}/submit
pub async fn submit_story(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(story_id): Path<DbId>,
    headers: HeaderMap,
    Json(input): Json<SubmitRequest>,
) -> AppResult<impl IntoResponse> {
    validate_consent(&input.consent)?;

    // Non-admin actors need a complete, non-suspended creator profile.
    if !auth.is_admin() {
        let profile = ProfileRepo::find_by_user(&state.pool, auth.user_id)
            .await?
            .ok_or_else(|| {
                AppError::Core(CoreError::Validation(
                    "A completed creator profile is required before submission".into(),
                ))
            })?;
        if profile.is_suspended {
            return Err(AppError::Core(CoreError::Forbidden(
                "Suspended profiles cannot submit stories".into(),
            )));
        }
        if profile.completed_at.is_none() {
            return Err(AppError::Core(CoreError::Validation(
                "A completed creator profile is required before submission".into(),
            )));
        }
    }

    let mut tx = state.pool.begin().await?;

    // The story lock serializes concurrent submissions, so the version
    // number computed inside this transaction cannot collide.
    let story = StoryRepo::lock_for_update(&mut tx, story_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Story", story_id)))?;
    if story.user_id != auth.user_id && !auth.is_admin() {
        return Err(AppError::Core(CoreError::Forbidden(
            "You do not own this story".into(),
        )));
    }

    let graph = StoryGraphRepo::fetch_graph(&mut tx, story.id).await?;
    if graph.nodes.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "A story with no nodes cannot be submitted for review".into(),
        )));
    }

    let token = mint_approval_token();
    let token_expires_at =
        chrono::Utc::now() + chrono::Duration::days(APPROVAL_TOKEN_TTL_DAYS);

    let snapshot = serde_json::json!({
        "story": {
            "slug": story.slug,
            "title": story.title,
            "summary": story.summary,
            "tags": story.tags,
            "visibility": story.visibility,
            "credit": story.credit,
        },
        "nodes": graph.nodes,
        "paths": graph.paths,
        "transitions": graph.transitions,
    });

    let provenance = provenance_from_headers(&headers);
    let consent = serde_json::json!({
        "transfer": input.consent.transfer,
        "contact": input.consent.contact,
        "ip": provenance.ip,
        "user_agent": provenance.user_agent,
    });

    let version = StoryVersionRepo::create(
        &mut tx,
        &CreateStoryVersion {
            story_id: story.id,
            snapshot,
            metadata: serde_json::json!({
                "approval_token": token,
                "decision_trail": [],
            }),
            consent: Some(consent),
            submitted_by_id: Some(auth.user_id),
        },
    )
    .await?;

    StoryRepo::stamp_submission(&mut tx, story.id, &token, token_expires_at, &provenance)
        .await?;

    AuditRepo::append(
        &mut tx,
        &CreateAuditLog {
            story_id: story.id,
            actor_id: Some(auth.user_id),
            action: ACTION_SUBMITTED_FOR_APPROVAL.to_string(),
            note: input.note,
            metadata: Some(serde_json::json!({
                "version_id": version.id,
                "version_number": version.version_number,
            })),
        },
    )
    .await?;

    // Notify before committing: a configured-but-failing mailer aborts the
    // whole submission rather than stranding an unreviewable pending version.
    let base = &state.config.public_base_url;
    let approve_url =
        format!("{base}/api/v1/approvals/{}?decision=approve&token={token}", version.id);
    let reject_url =
        format!("{base}/api/v1/approvals/{}?decision=reject&token={token}", version.id);

    let outcome = state
        .notifier
        .send_review_request(
            &state.config.review_inbox,
            &story.title,
            version.version_number,
            &approve_url,
            &reject_url,
        )
        .await;

    let notified = match outcome {
        Ok(outcome) => outcome.delivered(),
        Err(err) => {
            tx.rollback().await?;
            return Err(AppError::Notification(err));
        }
    };

    tx.commit().await?;

    tracing::info!(
        user_id = auth.user_id,
        story_id = story.id,
        version_id = version.id,
        version_number = version.version_number,
        notified,
        "Story submitted for approval"
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: SubmitResult { version, notified },
        }),
    ))
}

fn provenance_from_headers(headers: &HeaderMap) -> ConsentProvenance {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    ConsentProvenance {
        ip: header("x-forwarded-for")
            .map(|list| list.split(',').next().unwrap_or("").trim().to_string())
            .filter(|ip| !ip.is_empty()),
        user_agent: header("user-agent"),
    }
}
