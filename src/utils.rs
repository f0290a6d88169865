//! Utility functions for log output and caller-side URL checks.
//!
//! - String truncation for logging raw bodies
//! - Host allow-listing, which the reader core leaves to its callers

use url::Url;

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (on a character boundary) with
/// an ellipsis and the number of dropped bytes appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Parse `raw` as an absolute http(s) URL whose host is allowed.
///
/// A host is allowed when it equals an entry of `allowed_hosts` or is a
/// subdomain of one. An empty list allows every host.
///
/// # Errors
///
/// A human-readable reason suitable for an `{"error": ...}` record.
pub fn check_target(raw: &str, allowed_hosts: &[String]) -> Result<Url, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("Valid article URL required".to_string());
    }
    let url = Url::parse(raw).map_err(|e| format!("Valid article URL required: {e}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("Unsupported URL scheme '{}'", url.scheme()));
    }
    let host = url
        .host_str()
        .ok_or_else(|| "Valid article URL required: missing host".to_string())?
        .to_ascii_lowercase();

    if allowed_hosts.is_empty() || allowed_hosts.iter().any(|h| host_matches(&host, h)) {
        Ok(url)
    } else {
        Err(format!(
            "Host '{host}' is not allowed (allowed: {})",
            allowed_hosts.join(", ")
        ))
    }
}

fn host_matches(host: &str, allowed: &str) -> bool {
    let allowed = allowed.trim().trim_start_matches('.').to_ascii_lowercase();
    host == allowed
        || host
            .strip_suffix(allowed.as_str())
            .is_some_and(|prefix| prefix.ends_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn medium() -> Vec<String> {
        vec!["medium.com".to_string()]
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundaries() {
        let s = "é".repeat(10);
        assert_eq!(truncate_for_log(&s, 3), "é…(+18 bytes)");
    }

    #[test]
    fn test_check_target_allows_host_and_subdomains() {
        assert!(check_target("https://medium.com/@a/post-1", &medium()).is_ok());
        assert!(check_target("https://blog.medium.com/post", &medium()).is_ok());
        assert!(check_target("  https://MEDIUM.com/p  ", &medium()).is_ok());
    }

    #[test]
    fn test_check_target_rejects_lookalikes() {
        assert!(check_target("https://notmedium.com/p", &medium()).is_err());
        assert!(check_target("https://medium.com.evil.test/p", &medium()).is_err());
    }

    #[test]
    fn test_check_target_rejects_bad_input() {
        assert!(check_target("", &medium()).is_err());
        assert!(check_target("medium.com/p", &medium()).is_err());
        assert!(check_target("ftp://medium.com/p", &medium()).is_err());
    }

    #[test]
    fn test_empty_allow_list_allows_any_host() {
        assert!(check_target("https://example.org/x", &[]).is_ok());
    }
}
