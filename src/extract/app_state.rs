//! Best-effort recovery from an embedded client-side application state blob.
//!
//! Some pages ship their content as JSON in a script such as
//! `window.__APOLLO_STATE__ = {...}` and render it client-side, leaving the
//! static markup nearly empty. When the structural locators come up short this
//! module looks for a `Post` entity in that blob and rebuilds the title and
//! paragraphs from it.
//!
//! The blob's shape belongs to a third party and changes without notice. Any
//! mismatch simply yields nothing.

use super::title::collapse_whitespace;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde_json::{Map, Value};
use tracing::debug;

static SCRIPT: Lazy<Selector> = Lazy::new(|| Selector::parse("script").expect("valid selector"));

const STATE_MARKER: &str = "__APOLLO_STATE__";

/// Whatever could be recovered from the state blob.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AppState {
    pub title: Option<String>,
    /// Escaped HTML fragment built from the post's paragraphs.
    pub body: Option<String>,
}

/// Look for a state blob in `document` and recover what it holds.
pub fn recover(document: &Html) -> AppState {
    let Some(state) = find_state(document) else {
        return AppState::default();
    };
    let Some(post) = state
        .values()
        .find(|v| v["__typename"] == "Post" && v["title"].is_string())
    else {
        debug!(entities = state.len(), "State blob has no Post entity");
        return AppState::default();
    };

    let title = post["title"]
        .as_str()
        .map(collapse_whitespace)
        .filter(|t| !t.is_empty());
    let body = render_paragraphs(&state, post);
    debug!(
        has_title = title.is_some(),
        has_body = body.is_some(),
        "Recovered content from state blob"
    );
    AppState { title, body }
}

fn find_state(document: &Html) -> Option<Map<String, Value>> {
    document.select(&SCRIPT).find_map(|script| {
        let text: String = script.text().collect();
        let start = text.find(STATE_MARKER)? + STATE_MARKER.len();
        let json = text[start..].trim_start().strip_prefix('=')?.trim_start();
        // The assignment may be followed by `;` or more code.
        match serde_json::Deserializer::from_str(json)
            .into_iter::<Value>()
            .next()
        {
            Some(Ok(Value::Object(map))) => Some(map),
            Some(Err(e)) => {
                debug!(error = %e, "State blob is not valid JSON");
                None
            }
            _ => None,
        }
    })
}

/// Paragraphs live under `content(...)` -> `bodyModel` -> `paragraphs`, either
/// inline or as `{"__ref": "Paragraph:..."}` pointers into the state map.
fn render_paragraphs(state: &Map<String, Value>, post: &Value) -> Option<String> {
    let paragraphs = post
        .as_object()?
        .iter()
        .filter(|(key, _)| key.starts_with("content"))
        .find_map(|(_, content)| content.pointer("/bodyModel/paragraphs")?.as_array())?;

    let mut html = String::new();
    for paragraph in paragraphs {
        let paragraph = match paragraph.get("__ref").and_then(Value::as_str) {
            Some(key) => match state.get(key) {
                Some(p) => p,
                None => continue,
            },
            None => paragraph,
        };
        let Some(text) = paragraph["text"].as_str().filter(|t| !t.trim().is_empty()) else {
            continue;
        };
        let tag = match paragraph["type"].as_str().unwrap_or("P") {
            "H2" => "h2",
            "H3" => "h3",
            "H4" => "h4",
            "PRE" => "pre",
            "BQ" | "PQ" => "blockquote",
            _ => "p",
        };
        if !html.is_empty() {
            html.push('\n');
        }
        html.push('<');
        html.push_str(tag);
        html.push('>');
        escape_text(text, &mut html);
        html.push_str("</");
        html.push_str(tag);
        html.push('>');
    }

    (!html.is_empty()).then_some(html)
}

/// Escape JSON text for use as element content.
fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}
