//! Slug and credit-text derivation.

/// Derive a URL-safe slug from a story name.
///
/// Lowercases, collapses every run of non-alphanumeric characters to a single
/// hyphen, and trims leading/trailing hyphens.
///
/// # Examples
///
/// ```
/// use storyweave_core::naming::slugify;
///
/// assert_eq!(slugify("Coffee Shop Dilemma"), "coffee-shop-dilemma");
/// assert_eq!(slugify("  It's -- Complicated!  "), "it-s-complicated");
/// ```
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

/// Fallback credit when no identity source is available.
pub const CREDIT_FALLBACK: &str = "A Storyweave creator";

/// Resolve the credit text for a story from the best available identity
/// source, in priority order: pen name, display name, username, email.
/// Blank strings are treated as missing.
pub fn resolve_credit(
    pen_name: Option<&str>,
    display_name: Option<&str>,
    username: Option<&str>,
    email: Option<&str>,
) -> String {
    [pen_name, display_name, username, email]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or(CREDIT_FALLBACK)
        .to_string()
}
