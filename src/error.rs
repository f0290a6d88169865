//! Error types for fetching and reading articles.
//!
//! Errors are split by how far they are allowed to travel:
//!
//! - [`AttemptError`]: a single strategy failed. The orchestrator logs it and
//!   moves on to the next strategy; it never reaches the caller on its own.
//! - [`FetchError`]: the whole strategy chain ended without an acceptable page.
//! - [`ReadError`]: what [`crate::reader::Reader::fetch_and_extract`] hands back.
//!
//! Extraction has no error type at all. It degrades to sentinel content.

use std::time::Duration;
use thiserror::Error;

/// Why one strategy attempt did not produce an acceptable page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptError {
    /// DNS, connect, TLS or body read failure.
    #[error("network error: {0}")]
    Network(String),
    /// The attempt did not finish within the per-attempt timeout.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    /// Final response was neither 2xx nor a redirect.
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    /// 2xx response whose body is too small to be a real article page.
    #[error("body too small ({bytes} bytes, need more than {min})")]
    BodyTooSmall { bytes: usize, min: usize },
    /// More redirect hops than the configured maximum.
    #[error("redirect limit of {0} hops exceeded")]
    RedirectLimit(usize),
    /// A redirect status without a usable `Location` header.
    #[error("redirect status {0} without a Location header")]
    MissingLocation(u16),
    /// The archive lookup page did not contain a link to a snapshot.
    #[error("archive lookup returned no snapshot link")]
    NoArchiveLink,
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),
    #[error("invalid link pattern: {0}")]
    InvalidPattern(String),
}

/// Terminal outcome of a strategy chain that produced nothing usable.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Every strategy was tried once and none was accepted.
    #[error("all strategies exhausted")]
    Exhausted {
        /// Strategy name and failure reason, in the order they were tried.
        attempts: Vec<(String, AttemptError)>,
    },
    /// The caller raised the cancellation token.
    #[error("fetch cancelled")]
    Cancelled,
    #[error("no strategies configured")]
    NoStrategies,
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Error returned by the single fetch-and-extract entry point.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("invalid article URL: {0}")]
    InvalidUrl(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}
