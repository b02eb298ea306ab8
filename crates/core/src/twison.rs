//! Twison story structures, link extraction, validation, and repair.
//!
//! Twison is the JSON equivalent of a Twine 2 HTML export: a story name plus
//! an ordered list of passages, each carrying text, tags, and outbound links.
//! Imports run [`repair`] first (fill gaps, never invent content), then
//! [`validate`]; a story that still fails validation is rejected outright.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Story name substituted when an import carries none.
pub const DEFAULT_STORY_NAME: &str = "Untitled Twine Story";

/// Regex matching a `[[...]]` link directive in passage text.
pub const LINK_PATTERN: &str = r"\[\[([^\[\]]+)\]\]";

/// Compiled link directive regex. Compiled once, reused forever.
static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(LINK_PATTERN).expect("valid regex"));

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

/// An outbound link from one passage to another, as authored in Twine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwisonLink {
    /// Display text shown to the reader.
    pub name: String,
    /// Target passage name.
    pub link: String,
}

/// An x/y coordinate pair from the Twine editor canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A single passage: one scene/unit of narrative text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwisonPassage {
    /// Numeric passage id from the Twine export, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<i64>,
    /// Passage name; unique within the story once repaired.
    #[serde(default)]
    pub name: String,
    /// Passage body text (already entity-decoded).
    #[serde(default)]
    pub text: String,
    /// Tag list; `None` means the import omitted it (repair fills `Some(vec![])`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Outbound links; `None` or malformed entries are re-derived from `text`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<TwisonLink>>,
    /// Editor canvas position, when the export carried one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
    /// Editor canvas size, when the export carried one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Point>,
}

/// A full Twison story: name, start node, and ordered passages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwisonStory {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub startnode: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(default, rename = "creatorVersion", skip_serializing_if = "Option::is_none")]
    pub creator_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ifid: Option<String>,
    #[serde(default)]
    pub passages: Vec<TwisonPassage>,
}

// ---------------------------------------------------------------------------
// Link extraction
// ---------------------------------------------------------------------------

/// Extract outbound links from passage text.
///
/// Recognized directive forms:
///
/// | Form                   | Display   | Target   |
/// |------------------------|-----------|----------|
/// | `[[Display->Target]]`  | `Display` | `Target` |
/// | `[[Target<-Display]]`  | `Display` | `Target` |
/// | `[[Display\|Target]]`  | `Display` | `Target` |
/// | `[[Target]]`           | `Target`  | `Target` |
///
/// Directives with an empty target are skipped.
pub fn extract_links(text: &str) -> Vec<TwisonLink> {
    let mut links = Vec::new();
    for caps in LINK_RE.captures_iter(text) {
        let inner = caps[1].trim();
        let (name, link) = if let Some((display, target)) = inner.split_once("->") {
            (display.trim(), target.trim())
        } else if let Some((target, display)) = inner.split_once("<-") {
            (display.trim(), target.trim())
        } else if let Some((display, target)) = inner.split_once('|') {
            (display.trim(), target.trim())
        } else {
            (inner, inner)
        };
        if link.is_empty() {
            continue;
        }
        let name = if name.is_empty() { link } else { name };
        links.push(TwisonLink {
            name: name.to_string(),
            link: link.to_string(),
        });
    }
    links
}

// ---------------------------------------------------------------------------
// Repair
// ---------------------------------------------------------------------------

/// Best-effort repair pass run before validation.
///
/// Fills gaps without inventing passages or touching valid names/links:
///
/// - blank story name becomes [`DEFAULT_STORY_NAME`]
/// - blank passage names become `passage-1`, `passage-2`, ... by position
/// - an absent or malformed link list (any entry with an empty target) is
///   re-derived from the passage text
/// - a missing tag list becomes empty
///
/// Idempotent: repairing an already-repaired story changes nothing.
pub fn repair(mut story: TwisonStory) -> TwisonStory {
    if story.name.trim().is_empty() {
        story.name = DEFAULT_STORY_NAME.to_string();
    }

    for (index, passage) in story.passages.iter_mut().enumerate() {
        if passage.name.trim().is_empty() {
            passage.name = format!("passage-{}", index + 1);
        }

        let links_malformed = match &passage.links {
            None => true,
            Some(links) => links.iter().any(|l| l.link.trim().is_empty()),
        };
        if links_malformed {
            passage.links = Some(extract_links(&passage.text));
        }

        if passage.tags.is_none() {
            passage.tags = Some(Vec::new());
        }
    }

    if story.startnode.is_none() {
        story.startnode = story.passages.first().and_then(|p| p.pid);
    }

    story
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Structural checks over a (typically repaired) Twison story.
///
/// Returns every problem found rather than stopping at the first.
pub fn validate(story: &TwisonStory) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if story.passages.is_empty() {
        errors.push("story must include passages".to_string());
    }

    let mut seen = HashSet::new();
    for (index, passage) in story.passages.iter().enumerate() {
        let position = index + 1;
        if passage.name.trim().is_empty() {
            errors.push(format!("passage {position} has no resolvable name"));
            continue;
        }
        if !seen.insert(passage.name.clone()) {
            errors.push(format!("duplicate passage name '{}'", passage.name));
        }
        if let Some(links) = &passage.links {
            for link in links {
                if link.link.trim().is_empty() {
                    errors.push(format!(
                        "passage '{}' has a link with an empty target",
                        passage.name
                    ));
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Run [`repair`] then [`validate`], collapsing failures into a
/// [`CoreError::Validation`] suitable for surfacing to the uploader.
pub fn repair_and_validate(story: TwisonStory) -> Result<TwisonStory, CoreError> {
    let repaired = repair(story);
    validate(&repaired).map_err(|errors| CoreError::Validation(errors.join("; ")))?;
    Ok(repaired)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(name: &str, text: &str) -> TwisonPassage {
        TwisonPassage {
            pid: None,
            name: name.to_string(),
            text: text.to_string(),
            tags: Some(Vec::new()),
            links: None,
            position: None,
            size: None,
        }
    }

    fn story(passages: Vec<TwisonPassage>) -> TwisonStory {
        TwisonStory {
            name: "Test Story".to_string(),
            startnode: None,
            creator: None,
            creator_version: None,
            ifid: None,
            passages,
        }
    }

    #[test]
    fn extracts_arrow_link() {
        let links = extract_links("Go on. [[Keep walking->The Park]]");
        assert_eq!(
            links,
            vec![TwisonLink {
                name: "Keep walking".to_string(),
                link: "The Park".to_string()
            }]
        );
    }

    #[test]
    fn extracts_reverse_arrow_link() {
        let links = extract_links("[[The Park<-Keep walking]]");
        assert_eq!(links[0].name, "Keep walking");
        assert_eq!(links[0].link, "The Park");
    }

    #[test]
    fn extracts_pipe_link() {
        let links = extract_links("[[Keep walking|The Park]]");
        assert_eq!(links[0].name, "Keep walking");
        assert_eq!(links[0].link, "The Park");
    }

    #[test]
    fn bare_link_uses_target_for_both() {
        let links = extract_links("[[The Park]]");
        assert_eq!(links[0].name, "The Park");
        assert_eq!(links[0].link, "The Park");
    }

    #[test]
    fn multiple_links_preserve_order() {
        let links = extract_links("[[A]] middle [[B->C]]");
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].link, "A");
        assert_eq!(links[1].link, "C");
    }

    #[test]
    fn empty_target_skipped() {
        assert!(extract_links("[[ ]]").is_empty());
        assert!(extract_links("[[Display->]]").is_empty());
    }

    #[test]
    fn repair_defaults_story_name() {
        let mut s = story(vec![passage("Start", "hello")]);
        s.name = "  ".to_string();
        let repaired = repair(s);
        assert_eq!(repaired.name, DEFAULT_STORY_NAME);
    }

    #[test]
    fn repair_names_blank_passages_sequentially() {
        let s = story(vec![passage("", "a"), passage("Named", "b"), passage("", "c")]);
        let repaired = repair(s);
        assert_eq!(repaired.passages[0].name, "passage-1");
        assert_eq!(repaired.passages[1].name, "Named");
        assert_eq!(repaired.passages[2].name, "passage-3");
    }

    #[test]
    fn repair_derives_missing_links_from_text() {
        let s = story(vec![passage("Start", "go [[End]]")]);
        let repaired = repair(s);
        assert_eq!(
            repaired.passages[0].links.as_deref(),
            Some(&[TwisonLink {
                name: "End".to_string(),
                link: "End".to_string()
            }][..])
        );
    }

    #[test]
    fn repair_keeps_supplied_links() {
        let mut p = passage("Start", "go [[End]]");
        p.links = Some(vec![TwisonLink {
            name: "elsewhere".to_string(),
            link: "Elsewhere".to_string(),
        }]);
        let repaired = repair(story(vec![p]));
        assert_eq!(repaired.passages[0].links.as_ref().unwrap()[0].link, "Elsewhere");
    }

    #[test]
    fn repair_rederives_malformed_links() {
        let mut p = passage("Start", "go [[End]]");
        p.links = Some(vec![TwisonLink {
            name: "broken".to_string(),
            link: "".to_string(),
        }]);
        let repaired = repair(story(vec![p]));
        assert_eq!(repaired.passages[0].links.as_ref().unwrap()[0].link, "End");
    }

    #[test]
    fn repair_is_idempotent() {
        let s = TwisonStory {
            name: String::new(),
            startnode: None,
            creator: None,
            creator_version: None,
            ifid: None,
            passages: vec![
                TwisonPassage {
                    pid: Some(1),
                    name: String::new(),
                    text: "walk [[on->Next]]".to_string(),
                    tags: None,
                    links: None,
                    position: None,
                    size: None,
                },
                TwisonPassage {
                    pid: Some(2),
                    name: "Next".to_string(),
                    text: "done".to_string(),
                    tags: None,
                    links: None,
                    position: None,
                    size: None,
                },
            ],
        };
        let once = repair(s);
        let twice = repair(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn validate_rejects_empty_story() {
        let s = story(Vec::new());
        let errors = validate(&s).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("must include passages")));
    }

    #[test]
    fn validate_rejects_duplicate_names() {
        let s = story(vec![passage("Start", ""), passage("Start", "")]);
        let errors = validate(&s).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("duplicate passage name 'Start'")));
    }

    #[test]
    fn validate_rejects_empty_link_target() {
        let mut p = passage("Start", "");
        p.links = Some(vec![TwisonLink {
            name: "x".to_string(),
            link: " ".to_string(),
        }]);
        let errors = validate(&story(vec![p])).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("empty target")));
    }

    #[test]
    fn repair_and_validate_rejects_empty_story_with_message() {
        let s = story(Vec::new());
        let err = repair_and_validate(s).unwrap_err();
        assert!(err.to_string().contains("must include passages"));
    }

    #[test]
    fn repair_and_validate_accepts_fixable_story() {
        let s = story(vec![passage("", "[[Somewhere]]")]);
        let repaired = repair_and_validate(s).expect("repairable story should validate");
        assert_eq!(repaired.passages[0].name, "passage-1");
    }
}
