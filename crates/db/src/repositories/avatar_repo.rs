//! Repository for the `avatars` table.

use sqlx::{PgConnection, PgPool};
use storyweave_core::types::DbId;

use crate::models::avatar::Avatar;

/// Column list for avatars queries.
const COLUMNS: &str = "id, story_id, user_id, name, is_playable, created_at, updated_at";

/// Provides operations for avatars tied to stories.
pub struct AvatarRepo;

impl AvatarRepo {
    /// List avatars referencing a story.
    pub async fn list_for_story(
        pool: &PgPool,
        story_id: DbId,
    ) -> Result<Vec<Avatar>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM avatars WHERE story_id = $1 ORDER BY id ASC"
        );
        sqlx::query_as::<_, Avatar>(&query)
            .bind(story_id)
            .fetch_all(pool)
            .await
    }

    /// Flip the playable flag on every avatar referencing a story.
    /// Returns the number of avatars affected.
    pub async fn set_playable_for_story(
        conn: &mut PgConnection,
        story_id: DbId,
        playable: bool,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE avatars SET is_playable = $2, updated_at = now() WHERE story_id = $1",
        )
        .bind(story_id)
        .bind(playable)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }
}
