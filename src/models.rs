//! Data models passed between the fetch and extract stages and handed back to
//! callers.
//!
//! - [`Fetched`]: the accepted raw page and which strategy produced it
//! - [`ExtractedArticle`]: the clean title and body markup
//! - [`ReadResponse`]: the per-URL record the CLI prints as JSON
//!
//! All of these live for one request only. Nothing here is shared or cached.

use crate::error::ReadError;
use serde::Serialize;
use url::Url;

/// Title used when no title could be found.
pub const SENTINEL_TITLE: &str = "Article";

/// Body used when no content region could be found.
pub const SENTINEL_BODY: &str =
    "<p>Content could not be extracted. The article may not be available.</p>";

/// A page accepted by the fetch orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    /// Raw response body of the accepted attempt.
    pub body: Vec<u8>,
    /// Name of the strategy that produced `body`.
    pub strategy: String,
    /// Number of strategies tried, the accepted one included.
    pub attempts: usize,
    /// URL the body was finally served from, after redirects.
    pub final_url: Url,
}

/// A clean, displayable article.
///
/// Both fields are always non-empty: [`crate::extract::extract`] substitutes
/// [`SENTINEL_TITLE`] and [`SENTINEL_BODY`] when nothing better is found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedArticle {
    /// Plain-text title.
    pub title: String,
    /// Sanitised HTML fragment.
    pub body: String,
}

impl Default for ExtractedArticle {
    fn default() -> Self {
        Self {
            title: SENTINEL_TITLE.to_string(),
            body: SENTINEL_BODY.to_string(),
        }
    }
}

/// One output record per requested URL.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ReadResponse {
    Article {
        url: String,
        title: String,
        body: String,
        strategy: String,
    },
    Error {
        url: String,
        error: String,
    },
}

impl ReadResponse {
    /// Build the record for `url` from the outcome of a read.
    pub fn from_result(url: &str, result: Result<(ExtractedArticle, String), ReadError>) -> Self {
        match result {
            Ok((article, strategy)) => ReadResponse::Article {
                url: url.to_string(),
                title: article.title,
                body: article.body,
                strategy,
            },
            Err(e) => ReadResponse::error(url, e.to_string()),
        }
    }

    pub fn error(url: &str, error: impl Into<String>) -> Self {
        ReadResponse::Error {
            url: url.to_string(),
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;

    #[test]
    fn test_default_article_is_sentinel() {
        let article = ExtractedArticle::default();
        assert_eq!(article.title, "Article");
        assert!(article.body.contains("could not be extracted"));
    }

    #[test]
    fn test_article_response_serialization() {
        let response = ReadResponse::from_result(
            "https://medium.com/x",
            Ok((
                ExtractedArticle {
                    title: "My Article".to_string(),
                    body: "<p>Hi</p>".to_string(),
                },
                "freedium".to_string(),
            )),
        );
        let json: serde_json::Value = serde_json::to_value(&response).unwrap();
        assert_eq!(json["title"], "My Article");
        assert_eq!(json["body"], "<p>Hi</p>");
        assert_eq!(json["strategy"], "freedium");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_error_response_serialization() {
        let response = ReadResponse::from_result(
            "https://medium.com/x",
            Err(ReadError::Fetch(FetchError::Exhausted { attempts: vec![] })),
        );
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(
            json,
            r#"{"url":"https://medium.com/x","error":"all strategies exhausted"}"#
        );
    }
}
