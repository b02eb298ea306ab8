//! Working-graph models: nodes, paths, transitions.
//!
//! These rows are replaced wholesale on every graph save and never mutated
//! incrementally.

use serde::Serialize;
use sqlx::FromRow;
use storyweave_core::types::{DbId, Timestamp};

/// A row from the `story_nodes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StoryNode {
    pub id: DbId,
    pub story_id: DbId,
    pub node_key: String,
    pub title: Option<String>,
    pub synopsis: Option<String>,
    pub node_type: String,
    pub content: Option<serde_json::Value>,
    pub media: Option<serde_json::Value>,
    pub created_at: Timestamp,
}

/// A row from the `story_paths` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StoryPath {
    pub id: DbId,
    pub story_id: DbId,
    pub path_key: String,
    pub label: Option<String>,
    pub summary: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Timestamp,
}

/// A row from the `story_transitions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StoryTransition {
    pub id: DbId,
    pub story_id: DbId,
    pub from_node_id: DbId,
    pub to_node_id: Option<DbId>,
    pub path_id: DbId,
    pub ordering: i32,
    pub condition: Option<serde_json::Value>,
    pub effect: Option<serde_json::Value>,
    pub created_at: Timestamp,
}

/// A story's full working graph, as fetched for display or snapshotting.
#[derive(Debug, Clone, Serialize)]
pub struct StoryGraph {
    pub nodes: Vec<StoryNode>,
    pub paths: Vec<StoryPath>,
    pub transitions: Vec<StoryTransition>,
}
