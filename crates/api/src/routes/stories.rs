//! Route definitions for stories: import, listing, detail, submission.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{import, story, submission};
use crate::state::AppState;

/// Story routes, nested under `/stories`.
///
/// ```text
/// GET    /                          list_my_stories
/// POST   /import/twine              import_twine
/// POST   /import/twison             import_twison
/// GET    /{story_id}                get_story
/// GET    /slug/{slug}               get_public_story
/// GET    /{story_id}/versions       list_versions
/// GET    /{story_id}/audit-log      list_audit_log
/// POST   /{story_id}/submit         submit_story
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(story::list_my_stories))
        .route("/import/twine", post(import::import_twine))
        .route("/import/twison", post(import::import_twison))
        .route("/slug/{slug}", get(story::get_public_story))
        .route("/{story_id}", get(story::get_story))
        .route("/{story_id}/versions", get(story::list_versions))
        .route("/{story_id}/audit-log", get(story::list_audit_log))
        .route("/{story_id}/submit", post(submission::submit_story))
}
