//! # Paywall Reader
//!
//! Retrieves article pages that may sit behind a paywall or anti-bot wall and
//! turns their markup into a clean title and body.
//!
//! ## Features
//!
//! - Ordered, configurable chain of retrieval strategies (rewriting proxy,
//!   crawler identity, archive snapshot lookup, plain browser identity)
//! - Per-attempt timeouts and bounded redirect following
//! - Acceptance heuristic that rejects thin error and interstitial pages
//! - DOM-based extraction with chrome removal and attribute stripping
//! - JSON output, one record per URL
//!
//! ## Usage
//!
//! ```sh
//! paywall_reader https://medium.com/@someone/some-post-1234abcd
//! ```
//!
//! ## Architecture
//!
//! 1. **Guard**: the CLI checks each URL against the host allow-list
//! 2. **Fetch**: strategies are tried one at a time until a page is accepted
//! 3. **Extract**: title and body are located and sanitised
//! 4. **Output**: a JSON record is printed per URL
//!
//! URLs are read concurrently; the strategies for a single URL never are.

use clap::Parser;
use futures::stream::{self, StreamExt};
use std::error::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod error;
mod extract;
mod fetch;
mod models;
mod reader;
mod utils;

use cli::Cli;
use config::{ReaderConfig, load_config};
use models::ReadResponse;
use reader::Reader;
use utils::check_target;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("paywall_reader starting up");

    let args = Cli::parse();
    debug!(urls = ?args.urls, config = ?args.config, "Parsed CLI arguments");

    // ---- Configuration ----
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ReaderConfig::default(),
    };
    config.apply_overrides(&args);
    config.validate()?;
    info!(
        strategies = ?config.strategies.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
        timeout_secs = config.timeout_secs,
        max_redirects = config.max_redirects,
        min_body_bytes = config.min_body_bytes,
        "Configuration ready"
    );

    let reader = Reader::from_config(config)?;

    // ---- Cancellation on Ctrl-C ----
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received; cancelling in-flight reads");
                cancel.cancel();
            }
        });
    }

    // ---- Read every URL ----
    let concurrency = args.concurrency.max(1);
    let reader = &reader;
    let cancel = &cancel;
    let responses: Vec<ReadResponse> = stream::iter(args.urls.iter())
        .map(|url| async move {
            let target = match check_target(url, &reader.config().allowed_hosts) {
                Ok(target) => target,
                Err(reason) => {
                    warn!(%url, %reason, "Rejected URL");
                    return ReadResponse::error(url, reason);
                }
            };
            let result = reader.fetch_and_extract(target.as_str(), cancel).await;
            if let Err(e) = &result {
                error!(%url, error = %e, "Read failed");
            }
            ReadResponse::from_result(url, result)
        })
        .buffered(concurrency)
        .collect()
        .await;

    // ---- Output ----
    let mut failed = 0usize;
    for response in &responses {
        if matches!(response, ReadResponse::Error { .. }) {
            failed += 1;
        }
        let line = if args.pretty {
            serde_json::to_string_pretty(response)?
        } else {
            serde_json::to_string(response)?
        };
        println!("{line}");
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        total = responses.len(),
        succeeded = responses.len() - failed,
        failed,
        "Execution complete"
    );

    Ok(())
}
