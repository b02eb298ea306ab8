//! Repository for a story's working graph (nodes, paths, transitions).
//!
//! The graph is replaced wholesale: delete everything, then insert the
//! incoming payload's sets in dependency order. [`StoryGraphRepo::replace_graph`]
//! runs on a transaction connection; callers lock the story row first so the
//! whole replace is atomic per story and readers never observe a half-written
//! graph.

use std::collections::HashMap;

use serde::Serialize;
use sqlx::PgConnection;
use storyweave_core::graph::{StoryPayload, NODE_TYPE_NARRATIVE};
use storyweave_core::types::DbId;

use crate::models::graph::{StoryGraph, StoryNode, StoryPath, StoryTransition};

/// Column list for story_nodes queries.
const NODE_COLUMNS: &str =
    "id, story_id, node_key, title, synopsis, node_type, content, media, created_at";

/// Column list for story_paths queries.
const PATH_COLUMNS: &str =
    "id, story_id, path_key, label, summary, metadata, created_at";

/// Column list for story_transitions queries.
const TRANSITION_COLUMNS: &str = "id, story_id, from_node_id, to_node_id, path_id, \
    ordering, condition, effect, created_at";

/// Result of a graph replace.
///
/// `dropped_transitions` counts incoming transitions skipped because their
/// `from` or `path` key resolved to nothing — data loss a caller can detect
/// instead of it being invisible.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ReplaceGraphOutcome {
    pub nodes: usize,
    pub paths: usize,
    pub transitions: usize,
    pub dropped_transitions: usize,
}

/// Provides replace/fetch operations for story graphs.
pub struct StoryGraphRepo;

impl StoryGraphRepo {
    /// Replace a story's entire graph with the payload's sets.
    ///
    /// Runs on the caller's transaction. Inserts in dependency order (nodes,
    /// paths, transitions), resolving transition foreign keys through the
    /// key→id maps built during insertion. Transitions with unresolved
    /// `from`/`path` keys are skipped and counted; unresolved `to` keys
    /// become NULL (a dead-end, not a dangling edge).
    pub async fn replace_graph(
        conn: &mut PgConnection,
        story_id: DbId,
        payload: &StoryPayload,
    ) -> Result<ReplaceGraphOutcome, sqlx::Error> {
        // Delete in reverse dependency order.
        sqlx::query("DELETE FROM story_transitions WHERE story_id = $1")
            .bind(story_id)
            .execute(&mut *conn)
            .await?;
        sqlx::query("DELETE FROM story_paths WHERE story_id = $1")
            .bind(story_id)
            .execute(&mut *conn)
            .await?;
        sqlx::query("DELETE FROM story_nodes WHERE story_id = $1")
            .bind(story_id)
            .execute(&mut *conn)
            .await?;

        let mut outcome = ReplaceGraphOutcome::default();

        let mut node_ids: HashMap<&str, DbId> = HashMap::new();
        for node in &payload.nodes {
            let row: (DbId,) = sqlx::query_as(
                "INSERT INTO story_nodes
                     (story_id, node_key, title, synopsis, node_type, content, media)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)
                 RETURNING id",
            )
            .bind(story_id)
            .bind(&node.key)
            .bind(&node.title)
            .bind(&node.synopsis)
            .bind(node.node_type.as_deref().unwrap_or(NODE_TYPE_NARRATIVE))
            .bind(&node.content)
            .bind(&node.media)
            .fetch_one(&mut *conn)
            .await?;
            node_ids.insert(node.key.as_str(), row.0);
            outcome.nodes += 1;
        }

        let mut path_ids: HashMap<&str, DbId> = HashMap::new();
        for path in &payload.paths {
            let row: (DbId,) = sqlx::query_as(
                "INSERT INTO story_paths (story_id, path_key, label, summary, metadata)
                 VALUES ($1, $2, $3, $4, $5)
                 RETURNING id",
            )
            .bind(story_id)
            .bind(&path.key)
            .bind(&path.label)
            .bind(&path.summary)
            .bind(&path.metadata)
            .fetch_one(&mut *conn)
            .await?;
            path_ids.insert(path.key.as_str(), row.0);
            outcome.paths += 1;
        }

        for transition in &payload.transitions {
            let (Some(&from_id), Some(&path_id)) = (
                node_ids.get(transition.from.as_str()),
                path_ids.get(transition.path.as_str()),
            ) else {
                outcome.dropped_transitions += 1;
                continue;
            };
            let to_id = transition
                .to
                .as_deref()
                .and_then(|key| node_ids.get(key))
                .copied();

            sqlx::query(
                "INSERT INTO story_transitions
                     (story_id, from_node_id, to_node_id, path_id, ordering, condition, effect)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(story_id)
            .bind(from_id)
            .bind(to_id)
            .bind(path_id)
            .bind(transition.ordering.unwrap_or(0))
            .bind(&transition.condition)
            .bind(&transition.effect)
            .execute(&mut *conn)
            .await?;
            outcome.transitions += 1;
        }

        if outcome.dropped_transitions > 0 {
            tracing::warn!(
                story_id,
                dropped = outcome.dropped_transitions,
                "Dropped transitions with unresolved references during graph replace"
            );
        }

        Ok(outcome)
    }

    /// Fetch a story's full graph, nodes and transitions in insertion order.
    ///
    /// Takes a connection so snapshotting can read under the submission
    /// transaction's story lock; display paths acquire one from the pool.
    pub async fn fetch_graph(
        conn: &mut PgConnection,
        story_id: DbId,
    ) -> Result<StoryGraph, sqlx::Error> {
        let nodes_query = format!(
            "SELECT {NODE_COLUMNS} FROM story_nodes WHERE story_id = $1 ORDER BY id ASC"
        );
        let nodes = sqlx::query_as::<_, StoryNode>(&nodes_query)
            .bind(story_id)
            .fetch_all(&mut *conn)
            .await?;

        let paths_query = format!(
            "SELECT {PATH_COLUMNS} FROM story_paths WHERE story_id = $1 ORDER BY id ASC"
        );
        let paths = sqlx::query_as::<_, StoryPath>(&paths_query)
            .bind(story_id)
            .fetch_all(&mut *conn)
            .await?;

        let transitions_query = format!(
            "SELECT {TRANSITION_COLUMNS} FROM story_transitions
             WHERE story_id = $1 ORDER BY from_node_id ASC, ordering ASC"
        );
        let transitions = sqlx::query_as::<_, StoryTransition>(&transitions_query)
            .bind(story_id)
            .fetch_all(&mut *conn)
            .await?;

        Ok(StoryGraph {
            nodes,
            paths,
            transitions,
        })
    }
}
