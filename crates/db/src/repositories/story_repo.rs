//! Repository for the `stories` table.
//!
//! Mutations that belong to a larger unit of work (graph replace, submission,
//! decision) take `&mut PgConnection` so the caller owns the transaction.

use sqlx::{PgConnection, PgPool};
use storyweave_core::approval::{
    OWNERSHIP_PENDING_TRANSFER, OWNERSHIP_PLATFORM_OWNED, OWNERSHIP_RETURNED,
};
use storyweave_core::graph::VISIBILITY_PUBLIC;
use storyweave_core::types::{DbId, Timestamp};

use crate::models::story::{ConsentProvenance, CreateStory, Story, UpdateStoryMeta};

/// Column list for stories queries.
const COLUMNS: &str = "id, slug, title, summary, tags, visibility, ownership_status, \
    user_id, original_creator_id, original_creator_profile_id, credit, \
    approval_token, approval_token_expires_at, consent_ip, consent_user_agent, \
    consented_at, latest_version_id, approved_at, approved_by_id, created_at, updated_at";

/// Provides CRUD and lifecycle operations for stories.
pub struct StoryRepo;

impl StoryRepo {
    /// Find a story by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Story>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM stories WHERE id = $1");
        sqlx::query_as::<_, Story>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a story by slug, regardless of visibility.
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Story>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM stories WHERE slug = $1");
        sqlx::query_as::<_, Story>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// Find a public story by slug.
    pub async fn find_public_by_slug(
        pool: &PgPool,
        slug: &str,
    ) -> Result<Option<Story>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM stories WHERE slug = $1 AND visibility = $2"
        );
        sqlx::query_as::<_, Story>(&query)
            .bind(slug)
            .bind(VISIBILITY_PUBLIC)
            .fetch_optional(pool)
            .await
    }

    /// List stories owned by a user, newest first.
    pub async fn list_for_owner(pool: &PgPool, user_id: DbId) -> Result<Vec<Story>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM stories WHERE user_id = $1 ORDER BY updated_at DESC"
        );
        sqlx::query_as::<_, Story>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Load a story inside a transaction, locking the row until commit.
    ///
    /// Every multi-statement story mutation (graph replace, submission,
    /// decision) starts here so concurrent writers serialize per story.
    pub async fn lock_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Story>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM stories WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Story>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Slug-keyed variant of [`Self::lock_for_update`], for upsert-by-slug.
    pub async fn lock_by_slug(
        conn: &mut PgConnection,
        slug: &str,
    ) -> Result<Option<Story>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM stories WHERE slug = $1 FOR UPDATE");
        sqlx::query_as::<_, Story>(&query)
            .bind(slug)
            .fetch_optional(conn)
            .await
    }

    /// Insert a new story, returning the created row.
    pub async fn create(
        conn: &mut PgConnection,
        input: &CreateStory,
    ) -> Result<Story, sqlx::Error> {
        let query = format!(
            "INSERT INTO stories
                (slug, title, summary, tags, visibility, user_id,
                 original_creator_id, original_creator_profile_id, credit)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Story>(&query)
            .bind(&input.slug)
            .bind(&input.title)
            .bind(&input.summary)
            .bind(&input.tags)
            .bind(&input.visibility)
            .bind(input.user_id)
            .bind(input.original_creator_id)
            .bind(input.original_creator_profile_id)
            .bind(&input.credit)
            .fetch_one(conn)
            .await
    }

    /// Update a story's metadata fields, returning the updated row.
    pub async fn update_meta(
        conn: &mut PgConnection,
        id: DbId,
        input: &UpdateStoryMeta,
    ) -> Result<Story, sqlx::Error> {
        let query = format!(
            "UPDATE stories SET
                 title = $2, summary = $3, tags = $4, visibility = $5,
                 credit = $6, updated_at = now()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Story>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.summary)
            .bind(&input.tags)
            .bind(&input.visibility)
            .bind(&input.credit)
            .fetch_one(conn)
            .await
    }

    /// Stamp submission state onto a story: fresh approval token + expiry,
    /// consent provenance, and `pending_transfer` ownership.
    pub async fn stamp_submission(
        conn: &mut PgConnection,
        id: DbId,
        token: &str,
        token_expires_at: Timestamp,
        provenance: &ConsentProvenance,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE stories SET
                 approval_token = $2,
                 approval_token_expires_at = $3,
                 consent_ip = $4,
                 consent_user_agent = $5,
                 consented_at = now(),
                 ownership_status = $6,
                 updated_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .bind(token)
        .bind(token_expires_at)
        .bind(&provenance.ip)
        .bind(&provenance.user_agent)
        .bind(OWNERSHIP_PENDING_TRANSFER)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Apply the approval side effects: public visibility, platform custody,
    /// latest-version pointer, approval stamps, token cleared (single use).
    pub async fn apply_approval(
        conn: &mut PgConnection,
        id: DbId,
        version_id: DbId,
        reviewer_id: Option<DbId>,
    ) -> Result<Story, sqlx::Error> {
        let query = format!(
            "UPDATE stories SET
                 visibility = $2,
                 ownership_status = $3,
                 latest_version_id = $4,
                 approved_at = now(),
                 approved_by_id = $5,
                 approval_token = NULL,
                 approval_token_expires_at = NULL,
                 updated_at = now()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Story>(&query)
            .bind(id)
            .bind(VISIBILITY_PUBLIC)
            .bind(OWNERSHIP_PLATFORM_OWNED)
            .bind(version_id)
            .bind(reviewer_id)
            .fetch_one(conn)
            .await
    }

    /// Apply the rejection side effects: custody returned, token cleared.
    /// Visibility and avatars are untouched.
    pub async fn apply_rejection(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Story, sqlx::Error> {
        let query = format!(
            "UPDATE stories SET
                 ownership_status = $2,
                 approval_token = NULL,
                 approval_token_expires_at = NULL,
                 updated_at = now()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Story>(&query)
            .bind(id)
            .bind(OWNERSHIP_RETURNED)
            .fetch_one(conn)
            .await
    }
}
