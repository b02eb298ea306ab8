//! Avatar models.

use serde::Serialize;
use sqlx::FromRow;
use storyweave_core::types::{DbId, Timestamp};

/// A row from the `avatars` table. Avatars become playable when the story
/// they reference is approved.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Avatar {
    pub id: DbId,
    pub story_id: DbId,
    pub user_id: Option<DbId>,
    pub name: String,
    pub is_playable: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
