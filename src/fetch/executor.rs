//! Single-request transport and the redirect-following executor built on it.
//!
//! The [`Transport`] trait is the network seam: it issues exactly one GET and
//! never follows redirects itself. [`follow_redirects`] adds bounded redirect
//! handling on top of any transport, which lets the orchestrator be tested with
//! a scripted fake instead of a live network.

use crate::error::AttemptError;
use reqwest::Client;
use reqwest::header::LOCATION;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};
use url::Url;

/// Redirect status codes that are followed.
pub const REDIRECT_STATUSES: [u16; 5] = [301, 302, 303, 307, 308];

/// What one GET returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Raw `Location` header, if any.
    pub location: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_redirect(&self) -> bool {
        REDIRECT_STATUSES.contains(&self.status)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues one GET request without following redirects.
pub trait Transport {
    async fn get(&self, url: &Url, headers: &[(&str, &str)]) -> Result<HttpResponse, AttemptError>;
}

/// [`Transport`] backed by a shared `reqwest::Client`.
///
/// The client pools connections and is safe to use from concurrent,
/// unrelated fetch chains.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build a transport whose individual requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn get(&self, url: &Url, headers: &[(&str, &str)]) -> Result<HttpResponse, AttemptError> {
        let t0 = Instant::now();
        let mut request = self.client.get(url.clone());
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(classify)?.to_vec();

        debug!(
            status,
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "GET finished"
        );
        Ok(HttpResponse {
            status,
            location,
            body,
        })
    }
}

fn classify(e: reqwest::Error) -> AttemptError {
    AttemptError::Network(e.to_string())
}

/// Issue a GET and follow redirects with the same headers.
///
/// At most `max_redirects` redirects are followed; one more redirect after
/// that fails with [`AttemptError::RedirectLimit`]. Relative `Location`
/// values are resolved against the URL that produced them.
///
/// The returned response is the first non-redirect response, whatever its
/// status. Judging the status is left to the caller.
pub async fn follow_redirects<T: Transport>(
    transport: &T,
    url: &Url,
    headers: &[(&str, &str)],
    max_redirects: usize,
) -> Result<(Url, HttpResponse), AttemptError> {
    let mut current = url.clone();
    let mut hops = 0usize;

    loop {
        let response = transport.get(&current, headers).await?;
        if !response.is_redirect() {
            return Ok((current, response));
        }
        if hops >= max_redirects {
            return Err(AttemptError::RedirectLimit(max_redirects));
        }

        let location = response
            .location
            .as_deref()
            .ok_or(AttemptError::MissingLocation(response.status))?;
        let next = current
            .join(location)
            .map_err(|e| AttemptError::InvalidUrl(format!("{location}: {e}")))?;

        hops += 1;
        debug!(hop = hops, status = response.status, from = %current, to = %next, "Following redirect");
        current = next;
    }
}
