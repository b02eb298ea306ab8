pub mod approval;
pub mod auth;
pub mod health;
pub mod profile;
pub mod stories;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register                        register (public)
/// /auth/login                           login (public)
/// /auth/refresh                         refresh (public)
/// /auth/me                              current account (requires auth)
///
/// /creator-profile                      get, upsert (requires auth)
///
/// /stories                              list own stories
/// /stories/import/twine                 import Twine HTML
/// /stories/import/twison                import Twison JSON
/// /stories/{story_id}                   story + graph (owner/admin)
/// /stories/slug/{slug}                  public story + graph
/// /stories/{story_id}/versions          version list (owner/admin)
/// /stories/{story_id}/audit-log         audit trail (admin)
/// /stories/{story_id}/submit            submit for approval
///
/// /approvals/{version_id}               decide: GET (token link, HTML),
///                                       POST (admin UI, JSON)
/// /approvals/{version_id}/preview       review preview (token or admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .merge(profile::router())
        .nest("/stories", stories::router())
        .nest("/approvals", approval::router())
}
