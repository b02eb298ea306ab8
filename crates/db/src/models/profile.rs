//! Creator profile models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use storyweave_core::types::{DbId, Timestamp};

/// A row from the `creator_profiles` table.
///
/// A profile is "complete" once `completed_at` is set; completion is the
/// submission gate for non-admin creators.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CreatorProfile {
    pub id: DbId,
    pub user_id: DbId,
    pub pen_name: Option<String>,
    pub bio: Option<String>,
    pub social_links: Option<serde_json::Value>,
    pub is_suspended: bool,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CreatorProfile {
    /// Whether this profile satisfies the submission gate.
    pub fn is_complete(&self) -> bool {
        !self.is_suspended && self.completed_at.is_some()
    }
}

/// DTO for creating or updating a creator profile.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertCreatorProfile {
    pub pen_name: Option<String>,
    pub bio: Option<String>,
    pub social_links: Option<serde_json::Value>,
}
