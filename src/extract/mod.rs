//! Content extraction: turn arbitrary article markup into a title and a clean
//! body fragment.
//!
//! [`extract`] never fails. Anything it cannot find is replaced by the
//! sentinels in [`crate::models`].
//!
//! # Body locators
//!
//! Tried in order; the first region with displayable content after
//! [`sanitize`] wins. Matches that are, or sit inside, page chrome
//! (`<nav>`, `<header>`, ...) are never candidates.
//!
//! | # | Locator |
//! |---|---------|
//! | 1 | `<article>` |
//! | 2 | `<main>` |
//! | 3 | element whose class or role marks a content / post body region |
//! | 4 | `<body>` |
//!
//! If none of them has content, the embedded application state is consulted
//! (see [`app_state`]), and failing that the sentinel body is used.
//!
//! # Paragraph fallback
//!
//! A cleaned region with more than [`NOISE_MIN_PARAGRAPHS`] paragraphs whose
//! text mostly lives outside those paragraphs is treated as noisy, and only
//! the paragraphs are returned.

pub mod app_state;
pub mod sanitize;
pub mod title;

use crate::models::ExtractedArticle;
use once_cell::sync::Lazy;
use sanitize::{Sanitized, clean, is_in_chrome, sanitize};
use scraper::{Html, Selector};
use tracing::debug;

/// Paragraph count above which a noisy region is reduced to its paragraphs.
pub const NOISE_MIN_PARAGRAPHS: usize = 5;

static LOCATORS: Lazy<Vec<(&'static str, Selector)>> = Lazy::new(|| {
    [
        ("article", "article"),
        ("main", "main"),
        (
            "content-region",
            r#"[role="main"], [role="article"], [class*="content"], [class*="post-body"], [class*="article-body"]"#,
        ),
        ("body", "body"),
    ]
    .into_iter()
    .map(|(name, css)| (name, Selector::parse(css).expect("valid selector")))
    .collect()
});

/// Extract the title and a sanitised body from raw markup.
///
/// Pure and deterministic: the same input always yields byte-identical output.
pub fn extract(raw: &str) -> ExtractedArticle {
    let document = Html::parse_document(raw);

    let mut title = title::resolve(&document);
    let mut body = locate_body(&document);

    if title.is_none() || body.is_none() {
        let state = app_state::recover(&document);
        title = title.or(state.title);
        body = body.or(state.body.map(|html| clean(&html)));
    }

    let fallback = ExtractedArticle::default();
    ExtractedArticle {
        title: title.unwrap_or(fallback.title),
        body: body.unwrap_or(fallback.body),
    }
}

/// Extract from raw response bytes, decoding them as UTF-8 lossily.
pub fn extract_bytes(raw: &[u8]) -> ExtractedArticle {
    extract(&String::from_utf8_lossy(raw))
}

fn locate_body(document: &Html) -> Option<String> {
    for (name, selector) in LOCATORS.iter() {
        for region in document.select(selector) {
            if is_in_chrome(region) {
                debug!(locator = name, "Skipping region inside page chrome");
                continue;
            }
            let cleaned = sanitize(region);
            if cleaned.has_content() {
                debug!(
                    locator = name,
                    text_chars = cleaned.text_chars,
                    paragraphs = cleaned.paragraphs.len(),
                    "Body region located"
                );
                return Some(finish(cleaned));
            }
            debug!(locator = name, "Region empty after cleaning");
        }
    }
    None
}

fn finish(cleaned: Sanitized) -> String {
    if is_noisy(&cleaned) {
        debug!(
            paragraphs = cleaned.paragraphs.len(),
            "Noisy region; keeping paragraphs only"
        );
        clean(&cleaned.paragraphs.join("\n"))
    } else {
        cleaned.html.trim().to_string()
    }
}

/// Many paragraphs, yet less than half of the text is inside them.
fn is_noisy(cleaned: &Sanitized) -> bool {
    cleaned.paragraphs.len() > NOISE_MIN_PARAGRAPHS
        && cleaned.paragraph_chars * 2 < cleaned.text_chars
}
