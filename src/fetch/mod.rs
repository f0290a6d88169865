//! Fetch orchestration: try each retrieval strategy in order until one yields
//! a page that looks like a real article.
//!
//! # Algorithm
//!
//! 1. Walk the strategy list left to right, strictly one attempt at a time.
//!    Later strategies only run once earlier ones have failed, since some of
//!    them hit third-party services (archive lookups) that should not be
//!    called speculatively.
//! 2. Each attempt runs under its own timeout and goes through the
//!    redirect-following executor.
//! 3. Non-2xx, bodies not larger than `min_body_bytes`, timeouts, network
//!    errors and redirect overflows all fail the attempt and advance the loop.
//! 4. The first accepted body wins. If none is accepted the result is
//!    [`FetchError::Exhausted`], carrying every attempt's reason.
//!
//! A raised [`CancellationToken`] stops the chain before the next attempt, or
//! aborts the attempt in flight, and yields [`FetchError::Cancelled`].

pub mod executor;
pub mod strategy;

use crate::error::{AttemptError, FetchError};
use crate::models::Fetched;
use crate::utils::truncate_for_log;
use executor::{Transport, follow_redirects};
use std::time::{Duration, Instant};
use strategy::{Strategy, Target, find_archive_link};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Result of running a strategy chain.
pub type FetchOutcome = Result<Fetched, FetchError>;

/// Everything one fetch needs. Built fresh per request.
#[derive(Debug, Clone)]
pub struct FetchRequest<'a> {
    /// Absolute URL of the article to retrieve.
    pub target: Url,
    /// Strategies, tried in this order.
    pub strategies: &'a [Strategy],
    /// Upper bound for one whole attempt, both stages and all redirects included.
    pub timeout: Duration,
    pub max_redirects: usize,
    /// Bodies must be strictly larger than this to be accepted.
    pub min_body_bytes: usize,
}

/// Run the strategy chain for `request`.
#[instrument(level = "info", skip_all, fields(target = %request.target))]
pub async fn fetch<T: Transport>(
    transport: &T,
    request: &FetchRequest<'_>,
    cancel: &CancellationToken,
) -> FetchOutcome {
    if request.strategies.is_empty() {
        return Err(FetchError::NoStrategies);
    }

    let total_t0 = Instant::now();
    let mut failures: Vec<(String, AttemptError)> = Vec::with_capacity(request.strategies.len());

    for (index, strategy) in request.strategies.iter().enumerate() {
        if cancel.is_cancelled() {
            warn!(strategy = %strategy.name, "Cancelled before attempt");
            return Err(FetchError::Cancelled);
        }

        let attempt_t0 = Instant::now();
        debug!(
            attempt = index + 1,
            strategy = %strategy.name,
            two_stage = strategy.is_two_stage(),
            "Trying strategy"
        );

        let result = tokio::select! {
            _ = cancel.cancelled() => {
                warn!(strategy = %strategy.name, "Cancelled during attempt");
                return Err(FetchError::Cancelled);
            }
            r = tokio::time::timeout(request.timeout, attempt(transport, strategy, request)) => {
                r.unwrap_or(Err(AttemptError::Timeout(request.timeout)))
            }
        };

        let elapsed_ms = attempt_t0.elapsed().as_millis() as u64;
        match result {
            Ok((final_url, body)) => {
                info!(
                    attempt = index + 1,
                    strategy = %strategy.name,
                    bytes = body.len(),
                    elapsed_ms,
                    elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                    "Strategy accepted"
                );
                return Ok(Fetched {
                    body,
                    strategy: strategy.name.clone(),
                    attempts: index + 1,
                    final_url,
                });
            }
            Err(e) => {
                warn!(
                    attempt = index + 1,
                    strategy = %strategy.name,
                    elapsed_ms,
                    error = %e,
                    "Strategy failed; moving on"
                );
                failures.push((strategy.name.clone(), e));
            }
        }
    }

    error!(
        attempts = failures.len(),
        elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
        "All strategies exhausted"
    );
    Err(FetchError::Exhausted { attempts: failures })
}

/// One strategy attempt, redirects and the optional second stage included.
async fn attempt<T: Transport>(
    transport: &T,
    strategy: &Strategy,
    request: &FetchRequest<'_>,
) -> Result<(Url, Vec<u8>), AttemptError> {
    let headers = strategy.header_pairs();
    let url = strategy.request_url(&request.target)?;
    let (mut final_url, mut response) =
        follow_redirects(transport, &url, &headers, request.max_redirects).await?;

    if let Target::ArchiveLookup { link_pattern, .. } = &strategy.target {
        if !response.is_success() {
            return Err(AttemptError::Status(response.status));
        }
        let snapshot = find_archive_link(&response.body, link_pattern).inspect_err(|_| {
            debug!(
                strategy = %strategy.name,
                body = %truncate_for_log(&String::from_utf8_lossy(&response.body), 200),
                "No snapshot link in lookup response"
            );
        })?;
        debug!(strategy = %strategy.name, %snapshot, "Archive lookup found snapshot");
        (final_url, response) =
            follow_redirects(transport, &snapshot, &headers, request.max_redirects).await?;
    }

    accept(response.status, response.body.len(), request.min_body_bytes)?;
    Ok((final_url, response.body))
}

/// Acceptance heuristic: 2xx and a body strictly larger than `min_body_bytes`.
pub fn accept(status: u16, bytes: usize, min_body_bytes: usize) -> Result<(), AttemptError> {
    if !(200..300).contains(&status) {
        return Err(AttemptError::Status(status));
    }
    if bytes <= min_body_bytes {
        return Err(AttemptError::BodyTooSmall {
            bytes,
            min: min_body_bytes,
        });
    }
    Ok(())
}
