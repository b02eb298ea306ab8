//! Story container models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use storyweave_core::types::{DbId, Timestamp};

/// A row from the `stories` table.
///
/// The approval token is a bearer credential; it never serializes into API
/// responses.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Story {
    pub id: DbId,
    pub slug: String,
    pub title: String,
    pub summary: Option<String>,
    pub tags: Vec<String>,
    pub visibility: String,
    pub ownership_status: String,
    pub user_id: DbId,
    pub original_creator_id: Option<DbId>,
    pub original_creator_profile_id: Option<DbId>,
    pub credit: Option<String>,
    #[serde(skip_serializing)]
    pub approval_token: Option<String>,
    #[serde(skip_serializing)]
    pub approval_token_expires_at: Option<Timestamp>,
    #[serde(skip_serializing)]
    pub consent_ip: Option<String>,
    #[serde(skip_serializing)]
    pub consent_user_agent: Option<String>,
    pub consented_at: Option<Timestamp>,
    pub latest_version_id: Option<DbId>,
    pub approved_at: Option<Timestamp>,
    pub approved_by_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a story through the import pipeline.
#[derive(Debug, Clone)]
pub struct CreateStory {
    pub slug: String,
    pub title: String,
    pub summary: Option<String>,
    pub tags: Vec<String>,
    pub visibility: String,
    pub user_id: DbId,
    pub original_creator_id: Option<DbId>,
    pub original_creator_profile_id: Option<DbId>,
    pub credit: Option<String>,
}

/// DTO for updating a story's metadata fields (graph untouched).
#[derive(Debug, Clone)]
pub struct UpdateStoryMeta {
    pub title: String,
    pub summary: Option<String>,
    pub tags: Vec<String>,
    pub visibility: String,
    pub credit: Option<String>,
}

/// Consent provenance stamped onto the story at submission time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConsentProvenance {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}
