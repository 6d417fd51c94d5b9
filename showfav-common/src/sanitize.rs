//! Markup stripping for free-text catalog fields
//!
//! Show and episode summaries arrive from the catalog as HTML fragments
//! (`<p>`, `<b>`, `<i>`). Renderers only ever receive the stripped text.

use once_cell::sync::Lazy;
use regex::Regex;

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

/// Remove every markup tag from `text` and trim surrounding whitespace.
///
/// Total and idempotent: a `<` that survives the first pass has no `>`
/// after it, so a second pass finds nothing to remove.
pub fn sanitize(text: &str) -> String {
    TAG.replace_all(text, "").trim().to_string()
}

/// [`sanitize`] for optional fields; a missing value becomes `""`.
pub fn sanitize_opt(text: Option<&str>) -> String {
    text.map(sanitize).unwrap_or_default()
}
