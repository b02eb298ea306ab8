//! Story audit log models. Append-only; rows are never mutated or deleted,
//! so there is no `updated_at` and no update DTO.

use serde::Serialize;
use sqlx::FromRow;
use storyweave_core::types::{DbId, Timestamp};

/// A row from the `story_audit_logs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StoryAuditLog {
    pub id: DbId,
    pub story_id: DbId,
    pub actor_id: Option<DbId>,
    pub action: String,
    pub note: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Timestamp,
}

/// DTO for appending an audit entry.
#[derive(Debug, Clone)]
pub struct CreateAuditLog {
    pub story_id: DbId,
    pub actor_id: Option<DbId>,
    pub action: String,
    pub note: Option<String>,
    pub metadata: Option<serde_json::Value>,
}
