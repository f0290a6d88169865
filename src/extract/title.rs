//! Title resolution.
//!
//! First match wins:
//! 1. text of the first `<h1>` (inner tags dropped)
//! 2. `<title>` text with a trailing `| Site` or `- Site` suffix removed
//!
//! The sentinel fallback is applied by the caller.

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

static H1: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").expect("valid selector"));
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").expect("valid selector"));

/// Trailing `| Site`, or ` - Site` / ` – Site` / ` — Site` with spaces around the dash.
static SITE_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\s*\|\s*[^|]*|\s+[-–—]\s+[^-–—|]*)$").expect("valid regex")
});

/// Resolve the article title, or `None` if the page has no usable one.
pub fn resolve(document: &Html) -> Option<String> {
    if let Some(h1) = document.select(&H1).next() {
        let text = collapse_whitespace(&h1.text().collect::<String>());
        if !text.is_empty() {
            return Some(text);
        }
    }

    let title = document.select(&TITLE).next()?;
    let text = strip_site_suffix(&collapse_whitespace(&title.text().collect::<String>()));
    (!text.is_empty()).then_some(text)
}

/// Remove a trailing site name such as `| Medium`.
///
/// A title that consists only of the suffix pattern is returned unchanged
/// rather than emptied.
pub fn strip_site_suffix(title: &str) -> String {
    let stripped = SITE_SUFFIX.replace(title, "");
    let stripped = stripped.trim();
    if stripped.is_empty() {
        title.trim().to_string()
    } else {
        stripped.to_string()
    }
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().join(" ")
}
