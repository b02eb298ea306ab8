//! Route definitions for approval decisions.
//!
//! GET and POST on the same path share one state machine: GET serves the
//! emailed one-click token links (HTML panel), POST serves the admin UI
//! (JSON).

use axum::routing::get;
use axum::Router;

use crate::handlers::approval;
use crate::state::AppState;

/// Approval routes, nested under `/approvals`.
///
/// ```text
/// GET    /{version_id}            decide_version_link (HTML)
/// POST   /{version_id}            decide_version_json (JSON)
/// GET    /{version_id}/preview    preview_version
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{version_id}",
            get(approval::decide_version_link).post(approval::decide_version_json),
        )
        .route("/{version_id}/preview", get(approval::preview_version))
}
