//! Retrieval strategy descriptors.
//!
//! A [`Strategy`] is plain data: a name, a way to turn the target URL into the
//! URL actually requested, and a fixed header set that decides which client the
//! remote side thinks it is talking to. The default chain lives in
//! [`crate::config::default_strategies`]; a YAML config file can replace it.
//!
//! # Target kinds
//!
//! | Kind | Request URL | Stages |
//! |------|-------------|--------|
//! | `direct` | the target URL itself | 1 |
//! | `proxy` | `prefix` + target URL | 1 |
//! | `archive_lookup` | `lookup` with `{url}` replaced by the encoded target | 2 |
//!
//! The archive lookup's first response is searched with `link_pattern` for the
//! snapshot link, which is then fetched as the second stage.

use crate::error::AttemptError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

/// Placeholder replaced by the percent-encoded target URL in lookup templates.
pub const URL_PLACEHOLDER: &str = "{url}";

/// One way of retrieving the target page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Strategy {
    /// Name reported in logs and in the fetch result.
    pub name: String,
    /// How the request URL is derived from the target.
    pub target: Target,
    /// Headers sent with every request of this strategy, redirects included.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Target {
    /// Request the target URL as is.
    Direct,
    /// Request the target through a rewriting proxy, e.g. `https://freedium.cfd/`.
    Proxy { prefix: String },
    /// Ask an archive service for a snapshot, then fetch the snapshot.
    ArchiveLookup {
        /// Lookup URL template containing [`URL_PLACEHOLDER`].
        lookup: String,
        /// Regex locating the snapshot link. Capture group 1 is used when present.
        link_pattern: String,
    },
}

impl Strategy {
    /// Build the URL for the first request of this strategy.
    pub fn request_url(&self, target: &Url) -> Result<Url, AttemptError> {
        let raw = match &self.target {
            Target::Direct => target.to_string(),
            Target::Proxy { prefix } => format!("{prefix}{target}"),
            Target::ArchiveLookup { lookup, .. } => {
                lookup.replace(URL_PLACEHOLDER, &urlencoding::encode(target.as_str()))
            }
        };
        Url::parse(&raw).map_err(|e| AttemptError::InvalidUrl(format!("{raw}: {e}")))
    }

    /// Whether this strategy needs a second request after the first succeeds.
    pub fn is_two_stage(&self) -> bool {
        matches!(self.target, Target::ArchiveLookup { .. })
    }

    /// Header pairs in a stable order.
    pub fn header_pairs(&self) -> Vec<(&str, &str)> {
        self.headers
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }
}

/// Find the snapshot link inside an archive lookup response body.
///
/// Returns [`AttemptError::NoArchiveLink`] when the pattern does not match or
/// the match is not an absolute URL, so the strategy fails without issuing a
/// second request.
pub fn find_archive_link(body: &[u8], link_pattern: &str) -> Result<Url, AttemptError> {
    let re = Regex::new(link_pattern).map_err(|e| AttemptError::InvalidPattern(e.to_string()))?;
    let text = String::from_utf8_lossy(body);
    let caps = re.captures(&text).ok_or(AttemptError::NoArchiveLink)?;
    let link = caps
        .get(1)
        .or_else(|| caps.get(0))
        .map(|m| m.as_str().replace("\\/", "/"))
        .ok_or(AttemptError::NoArchiveLink)?;
    Url::parse(&link).map_err(|_| AttemptError::NoArchiveLink)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> Url {
        Url::parse("https://medium.com/@someone/a-post-123abc").unwrap()
    }

    fn strategy(target: Target) -> Strategy {
        Strategy {
            name: "test".to_string(),
            target,
            headers: BTreeMap::new(),
        }
    }

    #[test]
    fn test_direct_request_url_is_identity() {
        let s = strategy(Target::Direct);
        assert_eq!(s.request_url(&target()).unwrap(), target());
        assert!(!s.is_two_stage());
    }

    #[test]
    fn test_proxy_prefixes_target() {
        let s = strategy(Target::Proxy {
            prefix: "https://freedium.cfd/".to_string(),
        });
        assert_eq!(
            s.request_url(&target()).unwrap().as_str(),
            "https://freedium.cfd/https://medium.com/@someone/a-post-123abc"
        );
    }

    #[test]
    fn test_archive_lookup_encodes_target() {
        let s = strategy(Target::ArchiveLookup {
            lookup: "https://archive.org/wayback/available?url={url}".to_string(),
            link_pattern: "x".to_string(),
        });
        let url = s.request_url(&target()).unwrap();
        assert_eq!(url.host_str(), Some("archive.org"));
        let (_, value) = url.query_pairs().find(|(k, _)| k == "url").unwrap();
        assert_eq!(value, target().as_str());
        assert!(s.is_two_stage());
    }

    #[test]
    fn test_find_archive_link_uses_capture_group() {
        let body = br#"{"archived_snapshots":{"closest":{"status":"200","available":true,"url":"http://web.archive.org/web/20240101000000/https://medium.com/x"}}}"#;
        let link = find_archive_link(body, r#""url"\s*:\s*"(https?://web\.archive\.org/[^"]+)""#)
            .unwrap();
        assert_eq!(
            link.as_str(),
            "http://web.archive.org/web/20240101000000/https://medium.com/x"
        );
    }

    #[test]
    fn test_find_archive_link_missing() {
        let body = br#"{"archived_snapshots":{}}"#;
        let err = find_archive_link(body, r#""url"\s*:\s*"([^"]+)""#).unwrap_err();
        assert_eq!(err, AttemptError::NoArchiveLink);
    }

    #[test]
    fn test_find_archive_link_bad_pattern() {
        let err = find_archive_link(b"", "(unclosed").unwrap_err();
        assert!(matches!(err, AttemptError::InvalidPattern(_)));
    }

    #[test]
    fn test_strategy_yaml_shape() {
        let yaml = r#"
name: wayback
target:
  kind: archive_lookup
  lookup: "https://archive.org/wayback/available?url={url}"
  link_pattern: "(http[^\"]+)"
headers:
  User-Agent: test-agent
"#;
        let s: Strategy = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(s.name, "wayback");
        assert!(s.is_two_stage());
        assert_eq!(s.header_pairs(), vec![("User-Agent", "test-agent")]);
    }
}
