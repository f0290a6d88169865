//! Command-line interface definitions for Paywall Reader.
//!
//! Every tuning knob can also come from the YAML config file; flags given here
//! win over the file.

use clap::Parser;

/// Read gated articles through a chain of fallback strategies.
///
/// Prints one JSON object per URL to stdout: `{"url", "title", "body",
/// "strategy"}` on success, `{"url", "error"}` otherwise.
///
/// # Examples
///
/// ```sh
/// # Read one article with the built-in strategy chain
/// paywall_reader https://medium.com/@someone/some-post-1234abcd
///
/// # Custom chain from a file, shorter timeout
/// paywall_reader -c strategies.yaml --timeout-secs 10 https://medium.com/...
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Article URLs to read
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Optional path to a YAML config file
    #[arg(short, long, env = "PAYWALL_READER_CONFIG")]
    pub config: Option<String>,

    /// Per-attempt timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Maximum redirect hops per request
    #[arg(long)]
    pub max_redirects: Option<usize>,

    /// Minimum body size, in bytes, for a response to count as a real page
    #[arg(long)]
    pub min_body_bytes: Option<usize>,

    /// Allowed host (repeatable); replaces the configured list
    #[arg(long)]
    pub allow_host: Vec<String>,

    /// Skip the host allow-list entirely
    #[arg(long)]
    pub any_host: bool,

    /// How many URLs to read at the same time
    #[arg(short = 'j', long, default_value_t = 4)]
    pub concurrency: usize,

    /// Pretty-print JSON output
    #[arg(short, long)]
    pub pretty: bool,
}
