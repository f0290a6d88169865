//! Reader configuration.
//!
//! Configuration comes from three layers, later ones winning:
//!
//! 1. built-in defaults ([`ReaderConfig::default`])
//! 2. an optional YAML file (`--config`)
//! 3. CLI overrides ([`ReaderConfig::apply_overrides`])
//!
//! # Example file
//!
//! ```yaml
//! timeout_secs: 15
//! max_redirects: 5
//! min_body_bytes: 2048
//! allowed_hosts: [medium.com]
//! strategies:
//!   - name: freedium
//!     target: { kind: proxy, prefix: "https://freedium.cfd/" }
//!     headers:
//!       User-Agent: "Mozilla/5.0 ..."
//!   - name: direct
//!     target: { kind: direct }
//! ```

use crate::cli::Cli;
use crate::fetch::strategy::{Strategy, Target, URL_PLACEHOLDER};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::error::Error;
use std::time::Duration;
use tracing::{info, instrument};

const CHROME_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const GOOGLEBOT_UA: &str =
    "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";
const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Everything that shapes one fetch-and-extract call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Per-attempt timeout in seconds.
    pub timeout_secs: u64,
    /// Redirect hops followed per request before the strategy fails.
    pub max_redirects: usize,
    /// Accepted bodies must be larger than this many bytes.
    pub min_body_bytes: usize,
    /// Hosts (and their subdomains) the CLI will read from. Empty allows any.
    pub allowed_hosts: Vec<String>,
    /// Strategy chain, tried in order.
    pub strategies: Vec<Strategy>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 20,
            max_redirects: 5,
            min_body_bytes: 1024,
            allowed_hosts: vec!["medium.com".to_string()],
            strategies: default_strategies(),
        }
    }
}

impl ReaderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Apply CLI flags on top of the file or default values.
    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(secs) = cli.timeout_secs {
            self.timeout_secs = secs;
        }
        if let Some(hops) = cli.max_redirects {
            self.max_redirects = hops;
        }
        if let Some(bytes) = cli.min_body_bytes {
            self.min_body_bytes = bytes;
        }
        if !cli.allow_host.is_empty() {
            self.allowed_hosts = cli.allow_host.clone();
        }
        if cli.any_host {
            self.allowed_hosts.clear();
        }
    }

    /// Reject configurations that could never fetch anything.
    pub fn validate(&self) -> Result<(), String> {
        if self.strategies.is_empty() {
            return Err("at least one strategy is required".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than zero".to_string());
        }

        let mut seen = HashSet::new();
        for strategy in &self.strategies {
            if !seen.insert(strategy.name.as_str()) {
                return Err(format!("duplicate strategy name '{}'", strategy.name));
            }
            if let Target::ArchiveLookup {
                lookup,
                link_pattern,
            } = &strategy.target
            {
                if !lookup.contains(URL_PLACEHOLDER) {
                    return Err(format!(
                        "strategy '{}': lookup must contain {URL_PLACEHOLDER}",
                        strategy.name
                    ));
                }
                Regex::new(link_pattern)
                    .map_err(|e| format!("strategy '{}': {e}", strategy.name))?;
            }
        }
        Ok(())
    }
}

/// Load a YAML config file and validate it.
#[instrument(level = "info")]
pub fn load_config(path: &str) -> Result<ReaderConfig, Box<dyn Error>> {
    let yaml = std::fs::read_to_string(path)?;
    let config: ReaderConfig = serde_yaml::from_str(&yaml)?;
    config.validate()?;
    info!(
        strategies = config.strategies.len(),
        timeout_secs = config.timeout_secs,
        "Loaded reader configuration"
    );
    Ok(config)
}

/// Built-in chain: proxy, crawler identity, archive snapshot, plain browser.
pub fn default_strategies() -> Vec<Strategy> {
    vec![
        Strategy {
            name: "freedium".to_string(),
            target: Target::Proxy {
                prefix: "https://freedium.cfd/".to_string(),
            },
            headers: browser_headers(CHROME_UA),
        },
        Strategy {
            name: "googlebot".to_string(),
            target: Target::Direct,
            headers: browser_headers(GOOGLEBOT_UA),
        },
        Strategy {
            name: "wayback".to_string(),
            target: Target::ArchiveLookup {
                lookup: format!("https://archive.org/wayback/available?url={URL_PLACEHOLDER}"),
                link_pattern: r#""url"\s*:\s*"(https?://web\.archive\.org/web/[^"]+)""#
                    .to_string(),
            },
            headers: browser_headers(CHROME_UA),
        },
        Strategy {
            name: "direct".to_string(),
            target: Target::Direct,
            headers: browser_headers(CHROME_UA),
        },
    ]
}

fn browser_headers(user_agent: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("User-Agent".to_string(), user_agent.to_string()),
        ("Accept".to_string(), ACCEPT_HTML.to_string()),
        ("Accept-Language".to_string(), ACCEPT_LANGUAGE.to_string()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_defaults_are_valid() {
        let config = ReaderConfig::default();
        assert!(config.validate().is_ok());
        let names: Vec<_> = config.strategies.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["freedium", "googlebot", "wayback", "direct"]);
        assert_eq!(config.timeout(), Duration::from_secs(20));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: ReaderConfig = serde_yaml::from_str("min_body_bytes: 4096\n").unwrap();
        assert_eq!(config.min_body_bytes, 4096);
        assert_eq!(config.max_redirects, 5);
        assert_eq!(config.strategies.len(), 4);
    }

    #[test]
    fn test_yaml_reorders_chain() {
        let yaml = r#"
strategies:
  - name: direct
    target: { kind: direct }
  - name: proxy
    target: { kind: proxy, prefix: "https://p.test/" }
"#;
        let config: ReaderConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.strategies[0].target, Target::Direct);
        assert!(config.strategies[0].headers.is_empty());
    }

    #[test]
    fn test_validate_rejects_bad_chains() {
        let mut config = ReaderConfig::default();
        config.strategies.clear();
        assert!(config.validate().is_err());

        let mut config = ReaderConfig::default();
        config.strategies.push(config.strategies[0].clone());
        assert!(config.validate().unwrap_err().contains("duplicate"));

        let mut config = ReaderConfig::default();
        config.strategies[2].target = Target::ArchiveLookup {
            lookup: "https://archive.org/wayback/available".to_string(),
            link_pattern: "x".to_string(),
        };
        assert!(config.validate().unwrap_err().contains("{url}"));

        let mut config = ReaderConfig::default();
        config.strategies[2].target = Target::ArchiveLookup {
            lookup: "https://a.test/?u={url}".to_string(),
            link_pattern: "(".to_string(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "paywall_reader",
            "--timeout-secs",
            "7",
            "--max-redirects",
            "2",
            "--allow-host",
            "towardsdatascience.com",
            "https://towardsdatascience.com/x",
        ]);
        let mut config = ReaderConfig::default();
        config.apply_overrides(&cli);
        assert_eq!(config.timeout_secs, 7);
        assert_eq!(config.max_redirects, 2);
        assert_eq!(config.min_body_bytes, 1024);
        assert_eq!(config.allowed_hosts, vec!["towardsdatascience.com"]);
    }

    #[test]
    fn test_load_config_from_file() {
        let path = std::env::temp_dir().join(format!("paywall_reader_{}.yaml", std::process::id()));
        std::fs::write(&path, "timeout_secs: 3\nallowed_hosts: []\n").unwrap();
        let config = load_config(path.to_str().unwrap()).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(config.timeout_secs, 3);
        assert!(config.allowed_hosts.is_empty());
    }
}
