//! Twine 2 HTML export parser.
//!
//! A Twine export wraps the whole story in one `<tw-storydata>` element with
//! `name`, `startnode`, `creator`, `creator-version`, and `ifid` attributes;
//! each passage is a nested `<tw-passagedata>` element carrying `pid`,
//! `name`, `tags` (space-separated), `position` ("x,y"), `size` ("w,h"),
//! with the entity-encoded passage text as its body. Parsing produces a
//! [`TwisonStory`], the JSON-equivalent intermediate representation the rest
//! of the import pipeline consumes.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;
use crate::twison::{extract_links, Point, TwisonPassage, TwisonStory};

/// Regex matching the single top-level `<tw-storydata>` block.
static STORY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<tw-storydata\b([^>]*)>(.*?)</tw-storydata>").expect("valid regex")
});

/// Regex matching one `<tw-passagedata>` block.
static PASSAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<tw-passagedata\b([^>]*)>(.*?)</tw-passagedata>").expect("valid regex")
});

/// Regex matching one `attr="value"` pair inside a tag.
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([a-zA-Z][a-zA-Z0-9-]*)\s*=\s*"([^"]*)""#).expect("valid regex")
});

/// Parse a raw Twine 2 HTML export into a [`TwisonStory`].
///
/// Fails with [`CoreError::Parse`] when the export has no `<tw-storydata>`
/// element or contains zero passages.
pub fn parse_twine_html(html: &str) -> Result<TwisonStory, CoreError> {
    let caps = STORY_RE.captures(html).ok_or_else(|| {
        CoreError::Parse("no <tw-storydata> element found in upload".to_string())
    })?;

    let story_attrs = parse_attrs(&caps[1]);
    let body = caps[2].to_string();

    let mut passages = Vec::new();
    for (index, pcaps) in PASSAGE_RE.captures_iter(&body).enumerate() {
        let attrs = parse_attrs(&pcaps[1]);
        let text = decode_entities(&pcaps[2]);

        let name = match attr(&attrs, "name") {
            Some(n) if !n.trim().is_empty() => n.to_string(),
            _ => format!("passage-{}", index + 1),
        };

        let tags = attr(&attrs, "tags")
            .map(|t| {
                t.split_whitespace()
                    .map(|s| s.to_string())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        let links = extract_links(&text);

        passages.push(TwisonPassage {
            pid: attr(&attrs, "pid").and_then(|p| p.trim().parse().ok()),
            name,
            links: Some(links),
            tags: Some(tags),
            position: attr(&attrs, "position").and_then(parse_pair),
            size: attr(&attrs, "size").and_then(parse_pair),
            text,
        });
    }

    if passages.is_empty() {
        return Err(CoreError::Parse(
            "no <tw-passagedata> elements found in upload".to_string(),
        ));
    }

    let startnode = attr(&story_attrs, "startnode")
        .and_then(|s| s.trim().parse().ok())
        .or_else(|| passages.first().and_then(|p| p.pid));

    Ok(TwisonStory {
        name: attr(&story_attrs, "name").unwrap_or_default().to_string(),
        startnode,
        creator: attr(&story_attrs, "creator").map(str::to_string),
        creator_version: attr(&story_attrs, "creator-version").map(str::to_string),
        ifid: attr(&story_attrs, "ifid").map(str::to_string),
        passages,
    })
}

/// Collect `attr="value"` pairs from the inside of a tag.
fn parse_attrs(raw: &str) -> Vec<(String, String)> {
    ATTR_RE
        .captures_iter(raw)
        .map(|c| (c[1].to_ascii_lowercase(), decode_entities(&c[2])))
        .collect()
}

fn attr<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

/// Parse a `"x,y"` attribute value into a [`Point`].
fn parse_pair(value: &str) -> Option<Point> {
    let (x, y) = value.split_once(',')?;
    Some(Point {
        x: x.trim().parse().ok()?,
        y: y.trim().parse().ok()?,
    })
}

/// Decode the HTML entities Twine emits in attribute values and passage text.
///
/// Handles the named entities `&lt; &gt; &amp; &quot; &apos;` plus decimal
/// (`&#39;`) and hex (`&#x27;`) numeric references. Unrecognized or malformed
/// sequences pass through untouched.
pub fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match tail.find(';') {
            // Entities are short; anything longer than `&#xNNNNNN;` is not one.
            Some(end) if end <= 9 => {
                let entity = &tail[1..end];
                match decode_entity(entity) {
                    Some(decoded) => out.push(decoded),
                    None => out.push_str(&tail[..=end]),
                }
                rest = &tail[end + 1..];
            }
            _ => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let digits = entity.strip_prefix('#')?;
            let code = if let Some(hex) = digits.strip_prefix('x').or_else(|| digits.strip_prefix('X')) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                digits.parse().ok()?
            };
            char::from_u32(code)
        }
    }
}
