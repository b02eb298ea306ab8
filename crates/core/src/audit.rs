//! Audit action vocabulary for the append-only story audit log.

/// A story row was created through the import pipeline.
pub const ACTION_STORY_CREATED: &str = "story_created";

/// A story's node/path/transition set was replaced by an import.
pub const ACTION_GRAPH_REPLACED: &str = "graph_replaced";

/// A creator submitted a story version for review.
pub const ACTION_SUBMITTED_FOR_APPROVAL: &str = "submitted_for_approval";

/// A reviewer approved a pending version.
pub const ACTION_APPROVED: &str = "approved";

/// A reviewer rejected a pending version.
pub const ACTION_REJECTED: &str = "rejected";
