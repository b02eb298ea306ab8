//! Repository for the `creator_profiles` table.

use sqlx::PgPool;
use storyweave_core::types::DbId;

use crate::models::profile::{CreatorProfile, UpsertCreatorProfile};

/// Column list for creator_profiles queries.
const COLUMNS: &str = "id, user_id, pen_name, bio, social_links, is_suspended, \
    completed_at, created_at, updated_at";

/// Provides operations for creator profiles.
pub struct ProfileRepo;

impl ProfileRepo {
    /// Find the profile belonging to a user.
    pub async fn find_by_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<CreatorProfile>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM creator_profiles WHERE user_id = $1");
        sqlx::query_as::<_, CreatorProfile>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Create or update a user's profile.
    ///
    /// Completion is stamped the first time a pen name is recorded; an
    /// already-set `completed_at` is preserved.
    pub async fn upsert_for_user(
        pool: &PgPool,
        user_id: DbId,
        input: &UpsertCreatorProfile,
    ) -> Result<CreatorProfile, sqlx::Error> {
        let query = format!(
            "INSERT INTO creator_profiles (user_id, pen_name, bio, social_links, completed_at)
             VALUES ($1, $2, $3, $4, CASE WHEN $2 IS NOT NULL THEN now() END)
             ON CONFLICT ON CONSTRAINT uq_creator_profiles_user DO UPDATE SET
                 pen_name = EXCLUDED.pen_name,
                 bio = EXCLUDED.bio,
                 social_links = EXCLUDED.social_links,
                 completed_at = COALESCE(creator_profiles.completed_at, EXCLUDED.completed_at),
                 updated_at = now()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CreatorProfile>(&query)
            .bind(user_id)
            .bind(&input.pen_name)
            .bind(&input.bio)
            .bind(&input.social_links)
            .fetch_one(pool)
            .await
    }
}
