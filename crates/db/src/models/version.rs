//! Story version (review snapshot) models.

use serde::Serialize;
use sqlx::FromRow;
use storyweave_core::types::{DbId, Timestamp};

/// A row from the `story_versions` table: an immutable snapshot of a story's
/// graph and metadata at submission time.
///
/// `metadata` carries the one-time approval token (removed once the version
/// is decided) and the decision audit trail; it never serializes into API
/// responses.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StoryVersion {
    pub id: DbId,
    pub story_id: DbId,
    pub version_number: i32,
    pub status: String,
    pub snapshot: serde_json::Value,
    #[serde(skip_serializing)]
    pub metadata: serde_json::Value,
    pub consent: Option<serde_json::Value>,
    pub submitted_at: Timestamp,
    pub submitted_by_id: Option<DbId>,
    pub reviewed_by_id: Option<DbId>,
    pub reviewed_at: Option<Timestamp>,
}

impl StoryVersion {
    /// The approval token recorded at submission time, if still present.
    pub fn approval_token(&self) -> Option<&str> {
        self.metadata.get("approval_token").and_then(|t| t.as_str())
    }
}

/// DTO for creating a new pending version.
#[derive(Debug, Clone)]
pub struct CreateStoryVersion {
    pub story_id: DbId,
    pub snapshot: serde_json::Value,
    pub metadata: serde_json::Value,
    pub consent: Option<serde_json::Value>,
    pub submitted_by_id: Option<DbId>,
}

/// A version list item without the (potentially large) snapshot body.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StoryVersionSummary {
    pub id: DbId,
    pub story_id: DbId,
    pub version_number: i32,
    pub status: String,
    pub submitted_at: Timestamp,
    pub submitted_by_id: Option<DbId>,
    pub reviewed_by_id: Option<DbId>,
    pub reviewed_at: Option<Timestamp>,
}
