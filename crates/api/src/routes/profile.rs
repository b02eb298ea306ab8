//! Route definitions for the creator profile.

use axum::routing::get;
use axum::Router;

use crate::handlers::profile;
use crate::state::AppState;

/// Creator-profile routes.
///
/// ```text
/// GET    /creator-profile    get_my_profile
/// PUT    /creator-profile    upsert_my_profile
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/creator-profile",
        get(profile::get_my_profile).put(profile::upsert_my_profile),
    )
}
