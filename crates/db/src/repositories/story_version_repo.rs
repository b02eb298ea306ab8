//! Repository for the `story_versions` table.
//!
//! Versions are immutable snapshots: created `pending`, decided exactly once.
//! The version number is computed as `MAX(version_number) + 1` inside the
//! caller's transaction; with the story row locked, concurrent submissions
//! cannot allocate the same number. `uq_story_versions_story_version` is the
//! backstop.

use sqlx::{PgConnection, PgPool};
use storyweave_core::types::DbId;

use crate::models::version::{CreateStoryVersion, StoryVersion, StoryVersionSummary};

/// Column list for story_versions queries.
const COLUMNS: &str = "id, story_id, version_number, status, snapshot, metadata, \
    consent, submitted_at, submitted_by_id, reviewed_by_id, reviewed_at";

/// Column list for snapshot-free listing queries.
const SUMMARY_COLUMNS: &str = "id, story_id, version_number, status, submitted_at, \
    submitted_by_id, reviewed_by_id, reviewed_at";

/// Provides snapshot and decision operations for story versions.
pub struct StoryVersionRepo;

impl StoryVersionRepo {
    /// Insert a new pending version, auto-incrementing the version number.
    pub async fn create(
        conn: &mut PgConnection,
        input: &CreateStoryVersion,
    ) -> Result<StoryVersion, sqlx::Error> {
        let query = format!(
            "INSERT INTO story_versions
                (story_id, version_number, snapshot, metadata, consent, submitted_by_id)
             VALUES (
                 $1,
                 COALESCE(
                     (SELECT MAX(version_number) FROM story_versions WHERE story_id = $1),
                     0
                 ) + 1,
                 $2, $3, $4, $5
             )
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, StoryVersion>(&query)
            .bind(input.story_id)
            .bind(&input.snapshot)
            .bind(&input.metadata)
            .bind(&input.consent)
            .bind(input.submitted_by_id)
            .fetch_one(conn)
            .await
    }

    /// Find a version by its ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<StoryVersion>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM story_versions WHERE id = $1");
        sqlx::query_as::<_, StoryVersion>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Transaction-scoped variant of [`Self::find_by_id`].
    pub async fn find_by_id_tx(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<StoryVersion>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM story_versions WHERE id = $1");
        sqlx::query_as::<_, StoryVersion>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// List versions for a story without snapshots, newest first.
    pub async fn list_for_story(
        pool: &PgPool,
        story_id: DbId,
    ) -> Result<Vec<StoryVersionSummary>, sqlx::Error> {
        let query = format!(
            "SELECT {SUMMARY_COLUMNS} FROM story_versions
             WHERE story_id = $1
             ORDER BY version_number DESC"
        );
        sqlx::query_as::<_, StoryVersionSummary>(&query)
            .bind(story_id)
            .fetch_all(pool)
            .await
    }

    /// Move a pending version to a terminal status.
    ///
    /// Conditional on the version still being pending; returns `None` when it
    /// was already decided, so the caller can answer with a conflict naming
    /// the current status. The same statement removes the single-use approval
    /// token from the metadata and appends the decision to its audit trail.
    pub async fn decide(
        conn: &mut PgConnection,
        id: DbId,
        new_status: &str,
        reviewer_id: Option<DbId>,
    ) -> Result<Option<StoryVersion>, sqlx::Error> {
        let query = format!(
            "UPDATE story_versions SET
                 status = $2,
                 reviewed_by_id = $3,
                 reviewed_at = now(),
                 metadata = jsonb_set(
                     metadata - 'approval_token',
                     '{{decision_trail}}',
                     COALESCE(metadata->'decision_trail', '[]'::jsonb)
                         || jsonb_build_object(
                                'status', $2::text,
                                'reviewer_id', $3::bigint,
                                'decided_at', now()
                            )
                 )
             WHERE id = $1 AND status = 'pending'
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, StoryVersion>(&query)
            .bind(id)
            .bind(new_status)
            .bind(reviewer_id)
            .fetch_optional(conn)
            .await
    }
}
