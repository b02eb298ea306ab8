//! Repository for the `story_audit_logs` table. Append-only.

use sqlx::{PgConnection, PgPool};
use storyweave_core::types::DbId;

use crate::models::audit::{CreateAuditLog, StoryAuditLog};

/// Column list for story_audit_logs queries.
const COLUMNS: &str = "id, story_id, actor_id, action, note, metadata, created_at";

/// Provides append and list operations for the story audit trail.
pub struct AuditRepo;

impl AuditRepo {
    /// Append an audit entry on the caller's transaction.
    pub async fn append(
        conn: &mut PgConnection,
        input: &CreateAuditLog,
    ) -> Result<StoryAuditLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO story_audit_logs (story_id, actor_id, action, note, metadata)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, StoryAuditLog>(&query)
            .bind(input.story_id)
            .bind(input.actor_id)
            .bind(&input.action)
            .bind(&input.note)
            .bind(&input.metadata)
            .fetch_one(conn)
            .await
    }

    /// List a story's audit trail, newest first.
    pub async fn list_for_story(
        pool: &PgPool,
        story_id: DbId,
        limit: i64,
    ) -> Result<Vec<StoryAuditLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM story_audit_logs
             WHERE story_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2"
        );
        sqlx::query_as::<_, StoryAuditLog>(&query)
            .bind(story_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
