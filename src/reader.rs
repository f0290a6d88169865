//! The single entry point callers use: fetch an article, then extract it.
//!
//! [`Reader`] owns a transport and a configuration and holds no per-request
//! state, so one instance can serve many concurrent reads. Input validation
//! such as host allow-listing stays with the caller.

use crate::config::ReaderConfig;
use crate::error::{FetchError, ReadError};
use crate::extract::extract_bytes;
use crate::fetch::executor::{HttpTransport, Transport};
use crate::fetch::{FetchRequest, fetch};
use crate::models::ExtractedArticle;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};
use url::Url;

#[derive(Debug)]
pub struct Reader<T> {
    transport: T,
    config: ReaderConfig,
}

impl Reader<HttpTransport> {
    /// Build a reader that talks to the network with `reqwest`.
    pub fn from_config(config: ReaderConfig) -> Result<Self, FetchError> {
        let transport =
            HttpTransport::new(config.timeout()).map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self::new(transport, config))
    }
}

impl<T: Transport> Reader<T> {
    pub fn new(transport: T, config: ReaderConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Fetch `url` through the strategy chain and extract the article.
    ///
    /// Returns the article and the name of the strategy that produced it.
    /// The only failures are an unparsable URL and an exhausted or cancelled
    /// strategy chain; extraction itself always succeeds.
    #[instrument(level = "info", skip_all, fields(%url))]
    pub async fn fetch_and_extract(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<(ExtractedArticle, String), ReadError> {
        let target = Url::parse(url).map_err(|e| ReadError::InvalidUrl(format!("{url}: {e}")))?;
        let request = FetchRequest {
            target,
            strategies: &self.config.strategies,
            timeout: self.config.timeout(),
            max_redirects: self.config.max_redirects,
            min_body_bytes: self.config.min_body_bytes,
        };

        let fetched = fetch(&self.transport, &request, cancel).await?;

        let t0 = Instant::now();
        let article = extract_bytes(&fetched.body);
        info!(
            strategy = %fetched.strategy,
            attempts = fetched.attempts,
            final_url = %fetched.final_url,
            title = %article.title,
            body_bytes = article.body.len(),
            extract_ms = t0.elapsed().as_millis() as u64,
            "Article extracted"
        );
        Ok((article, fetched.strategy))
    }
}
