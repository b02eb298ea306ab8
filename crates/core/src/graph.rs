//! Twison → story graph conversion.
//!
//! Maps a validated [`TwisonStory`] into the platform's graph payload:
//! one node per passage, one path per distinct link label, one transition per
//! passage-link pair. Node type is inferred from branching factor; the slug
//! is derived from the story name unless an override supplies one.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use crate::naming::slugify;
use crate::twison::TwisonStory;

// ---------------------------------------------------------------------------
// Vocabulary
// ---------------------------------------------------------------------------

/// Story visible only to its owner.
pub const VISIBILITY_PRIVATE: &str = "private";

/// Story reachable by direct link but not listed.
pub const VISIBILITY_UNLISTED: &str = "unlisted";

/// Story listed publicly. Requires an approved version.
pub const VISIBILITY_PUBLIC: &str = "public";

/// All valid visibility values.
pub const VALID_VISIBILITIES: &[&str] =
    &[VISIBILITY_PRIVATE, VISIBILITY_UNLISTED, VISIBILITY_PUBLIC];

/// A scene with exactly one way forward.
pub const NODE_TYPE_NARRATIVE: &str = "narrative";

/// A scene offering the reader a choice (two or more ways forward).
pub const NODE_TYPE_DECISION: &str = "decision";

/// A terminal scene with no outbound links.
pub const NODE_TYPE_RESOLUTION: &str = "resolution";

/// Slug shape accepted at the API boundary.
pub const SLUG_PATTERN: &str = r"(?i)^[a-z0-9-]+$";

static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(SLUG_PATTERN).expect("valid regex"));

/// Slug used when a story name slugifies to nothing.
const FALLBACK_SLUG: &str = "untitled-story";

/// Validate that a visibility string is one of the accepted values.
pub fn validate_visibility(visibility: &str) -> Result<(), String> {
    if VALID_VISIBILITIES.contains(&visibility) {
        Ok(())
    } else {
        Err(format!(
            "Invalid visibility '{visibility}'. Must be one of: {}",
            VALID_VISIBILITIES.join(", ")
        ))
    }
}

/// Infer a node's type from its number of outbound links.
pub fn infer_node_type(outbound_links: usize) -> &'static str {
    match outbound_links {
        0 => NODE_TYPE_RESOLUTION,
        1 => NODE_TYPE_NARRATIVE,
        _ => NODE_TYPE_DECISION,
    }
}

// ---------------------------------------------------------------------------
// Payload types (internal API boundary)
// ---------------------------------------------------------------------------

/// One node (passage/scene) in a story payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePayload {
    /// Key unique within the story.
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
    /// `narrative`, `decision`, or `resolution`.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<serde_json::Value>,
}

/// One path (reusable edge label/category) in a story payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathPayload {
    /// Key unique within the story.
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// One directed edge in a story payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionPayload {
    /// Source node key.
    pub from: String,
    /// Path key labeling this edge.
    pub path: String,
    /// Target node key; `None` marks an ending/dead-end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordering: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<serde_json::Value>,
}

/// A full story graph payload, the unit the graph store persists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct StoryPayload {
    #[validate(
        length(min = 1, max = 120),
        regex(path = *SLUG_RE, message = "slug must contain only letters, digits, and hyphens")
    )]
    pub slug: String,
    #[validate(length(min = 1, max = 300))]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Requested visibility; the store may force a different one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    pub nodes: Vec<NodePayload>,
    pub paths: Vec<PathPayload>,
    pub transitions: Vec<TransitionPayload>,
}

/// Caller-supplied metadata overrides, merged field-by-field over inferred
/// values. Unset fields fall back to what conversion inferred.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StoryOverrides {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub tags: Option<Vec<String>>,
    pub visibility: Option<String>,
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

/// Convert a validated Twison story into a [`StoryPayload`].
///
/// Node keys come from the passage pid when present, else the slugified
/// passage name. Paths are deduplicated by link label text in first-seen
/// order. Transitions resolve their target by passage name; an unknown
/// target becomes `to: None` (an ending as far as the graph is concerned).
pub fn convert(story: &TwisonStory, overrides: &StoryOverrides) -> StoryPayload {
    let mut node_keys = KeyAllocator::new();
    let mut name_to_key: HashMap<&str, String> = HashMap::new();
    let mut nodes = Vec::with_capacity(story.passages.len());

    for (index, passage) in story.passages.iter().enumerate() {
        let preferred = match passage.pid {
            Some(pid) => pid.to_string(),
            None => {
                let slug = slugify(&passage.name);
                if slug.is_empty() {
                    format!("node-{}", index + 1)
                } else {
                    slug
                }
            }
        };
        let key = node_keys.allocate(preferred);
        name_to_key.insert(passage.name.as_str(), key.clone());

        let link_count = passage.links.as_ref().map_or(0, Vec::len);
        let tags = passage.tags.clone().unwrap_or_default();

        let media = passage.position.map(|position| {
            let mut media = json!({ "position": { "x": position.x, "y": position.y } });
            if let Some(size) = passage.size {
                media["size"] = json!({ "x": size.x, "y": size.y });
            }
            media
        });

        nodes.push(NodePayload {
            key,
            title: Some(passage.name.clone()),
            synopsis: None,
            node_type: Some(infer_node_type(link_count).to_string()),
            content: Some(json!({ "text": passage.text, "tags": tags })),
            media,
        });
    }

    // One path per distinct link label, first-seen order.
    let mut path_keys = KeyAllocator::new();
    let mut label_to_key: HashMap<&str, String> = HashMap::new();
    let mut paths = Vec::new();
    let mut transitions = Vec::new();

    for passage in &story.passages {
        let from = name_to_key[passage.name.as_str()].clone();
        let Some(links) = &passage.links else { continue };
        for (ordering, link) in links.iter().enumerate() {
            let path_key = match label_to_key.get(link.name.as_str()) {
                Some(key) => key.clone(),
                None => {
                    let slug = slugify(&link.name);
                    let preferred = if slug.is_empty() {
                        format!("path-{}", paths.len() + 1)
                    } else {
                        slug
                    };
                    let key = path_keys.allocate(preferred);
                    label_to_key.insert(link.name.as_str(), key.clone());
                    paths.push(PathPayload {
                        key: key.clone(),
                        label: Some(link.name.clone()),
                        summary: None,
                        metadata: None,
                    });
                    key
                }
            };

            transitions.push(TransitionPayload {
                from: from.clone(),
                path: path_key,
                to: name_to_key.get(link.link.as_str()).cloned(),
                ordering: Some(ordering as i32),
                condition: None,
                effect: None,
            });
        }
    }

    let inferred_slug = {
        let slug = slugify(&story.name);
        if slug.is_empty() {
            FALLBACK_SLUG.to_string()
        } else {
            slug
        }
    };

    StoryPayload {
        slug: overrides.slug.clone().unwrap_or(inferred_slug),
        title: overrides.title.clone().unwrap_or_else(|| story.name.clone()),
        summary: overrides.summary.clone(),
        tags: overrides.tags.clone().unwrap_or_default(),
        visibility: overrides.visibility.clone(),
        nodes,
        paths,
        transitions,
    }
}

/// Allocates keys unique within one story, suffixing `-2`, `-3`, ... on
/// collision.
struct KeyAllocator {
    taken: std::collections::HashSet<String>,
}

impl KeyAllocator {
    fn new() -> Self {
        Self {
            taken: std::collections::HashSet::new(),
        }
    }

    fn allocate(&mut self, preferred: String) -> String {
        if self.taken.insert(preferred.clone()) {
            return preferred;
        }
        let mut counter = 2;
        loop {
            let candidate = format!("{preferred}-{counter}");
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
            counter += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::twison::{TwisonLink, TwisonPassage};

    fn passage(pid: i64, name: &str, text: &str, links: Vec<(&str, &str)>) -> TwisonPassage {
        TwisonPassage {
            pid: Some(pid),
            name: name.to_string(),
            text: text.to_string(),
            tags: Some(Vec::new()),
            links: Some(
                links
                    .into_iter()
                    .map(|(name, link)| TwisonLink {
                        name: name.to_string(),
                        link: link.to_string(),
                    })
                    .collect(),
            ),
            position: None,
            size: None,
        }
    }

    fn coffee_shop() -> TwisonStory {
        TwisonStory {
            name: "Coffee Shop Dilemma".to_string(),
            startnode: Some(1),
            creator: None,
            creator_version: None,
            ifid: None,
            passages: vec![
                passage(1, "Start", "Waiting. [[Continue->End]]", vec![("Continue", "End")]),
                passage(2, "End", "Done.", vec![]),
            ],
        }
    }

    #[test]
    fn converts_coffee_shop_scenario() {
        let payload = convert(&coffee_shop(), &StoryOverrides::default());
        assert_eq!(payload.slug, "coffee-shop-dilemma");
        assert_eq!(payload.nodes.len(), 2);
        assert_eq!(payload.paths.len(), 1);
        assert_eq!(payload.transitions.len(), 1);
        assert_eq!(payload.nodes[0].node_type.as_deref(), Some(NODE_TYPE_NARRATIVE));
        assert_eq!(payload.nodes[1].node_type.as_deref(), Some(NODE_TYPE_RESOLUTION));
    }

    #[test]
    fn one_node_per_passage_in_order() {
        let payload = convert(&coffee_shop(), &StoryOverrides::default());
        assert_eq!(payload.nodes[0].title.as_deref(), Some("Start"));
        assert_eq!(payload.nodes[1].title.as_deref(), Some("End"));
    }

    #[test]
    fn transition_resolves_target_key() {
        let payload = convert(&coffee_shop(), &StoryOverrides::default());
        let t = &payload.transitions[0];
        assert_eq!(t.from, "1");
        assert_eq!(t.to.as_deref(), Some("2"));
        assert_eq!(t.ordering, Some(0));
    }

    #[test]
    fn unknown_target_becomes_none() {
        let story = TwisonStory {
            passages: vec![passage(1, "Start", "", vec![("Leap", "Nowhere")])],
            ..coffee_shop()
        };
        let payload = convert(&story, &StoryOverrides::default());
        assert_eq!(payload.transitions[0].to, None);
    }

    #[test]
    fn paths_deduplicate_by_label() {
        let story = TwisonStory {
            passages: vec![
                passage(1, "A", "", vec![("Continue", "B"), ("Turn back", "C")]),
                passage(2, "B", "", vec![("Continue", "C")]),
                passage(3, "C", "", vec![]),
            ],
            ..coffee_shop()
        };
        let payload = convert(&story, &StoryOverrides::default());
        assert_eq!(payload.paths.len(), 2);
        assert_eq!(payload.transitions.len(), 3);
        assert_eq!(payload.transitions[0].path, payload.transitions[2].path);
    }

    #[test]
    fn two_or_more_links_is_a_decision() {
        let story = TwisonStory {
            passages: vec![
                passage(1, "Fork", "", vec![("Left", "L"), ("Right", "R")]),
                passage(2, "L", "", vec![]),
                passage(3, "R", "", vec![]),
            ],
            ..coffee_shop()
        };
        let payload = convert(&story, &StoryOverrides::default());
        assert_eq!(payload.nodes[0].node_type.as_deref(), Some(NODE_TYPE_DECISION));
    }

    #[test]
    fn overrides_take_precedence_field_by_field() {
        let overrides = StoryOverrides {
            slug: Some("my-slug".to_string()),
            title: None,
            summary: Some("A short tale.".to_string()),
            tags: Some(vec!["empathy".to_string()]),
            visibility: Some(VISIBILITY_UNLISTED.to_string()),
        };
        let payload = convert(&coffee_shop(), &overrides);
        assert_eq!(payload.slug, "my-slug");
        // Unset override falls back to the inferred value, not a default.
        assert_eq!(payload.title, "Coffee Shop Dilemma");
        assert_eq!(payload.summary.as_deref(), Some("A short tale."));
        assert_eq!(payload.tags, vec!["empathy".to_string()]);
        assert_eq!(payload.visibility.as_deref(), Some(VISIBILITY_UNLISTED));
    }

    #[test]
    fn empty_story_name_gets_fallback_slug() {
        let story = TwisonStory {
            name: "!!!".to_string(),
            ..coffee_shop()
        };
        let payload = convert(&story, &StoryOverrides::default());
        assert_eq!(payload.slug, FALLBACK_SLUG);
    }

    #[test]
    fn node_type_inference_table() {
        assert_eq!(infer_node_type(0), NODE_TYPE_RESOLUTION);
        assert_eq!(infer_node_type(1), NODE_TYPE_NARRATIVE);
        assert_eq!(infer_node_type(2), NODE_TYPE_DECISION);
        assert_eq!(infer_node_type(9), NODE_TYPE_DECISION);
    }

    #[test]
    fn visibility_validation() {
        assert!(validate_visibility(VISIBILITY_PRIVATE).is_ok());
        assert!(validate_visibility("secret").is_err());
    }

    #[test]
    fn payload_slug_validation() {
        let mut payload = convert(&coffee_shop(), &StoryOverrides::default());
        assert!(payload.validate().is_ok());
        payload.slug = "no spaces!".to_string();
        assert!(payload.validate().is_err());
    }
}
