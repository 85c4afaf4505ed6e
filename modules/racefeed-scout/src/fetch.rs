// reqwest-backed page fetcher with optional bounded retry.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, warn};

use crate::traits::PageFetcher;

const USER_AGENT: &str = "racefeed-scout/0.1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Base backoff between attempts. Actual delay is base * 3^attempt plus up
/// to one base of jitter.
const RETRY_BASE: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error fetching {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },
}

impl FetchError {
    /// Connection problems, 429 and 5xx are worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Network { .. } => true,
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
        }
    }
}

pub struct HttpFetcher {
    client: reqwest::Client,
    max_attempts: u32,
    retry_base: Duration,
}

impl HttpFetcher {
    /// `max_attempts` of 1 means a single try with no retry.
    pub fn new(max_attempts: u32) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            max_attempts: max_attempts.max(1),
            retry_base: RETRY_BASE,
        })
    }

    pub fn with_retry_base(mut self, retry_base: Duration) -> Self {
        self.retry_base = retry_base;
        self
    }

    async fn fetch_once(&self, url: &str) -> std::result::Result<String, FetchError> {
        let network = |err: reqwest::Error| FetchError::Network {
            url: url.to_string(),
            message: err.to_string(),
        };

        let resp = self.client.get(url).send().await.map_err(network)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        resp.text().await.map_err(network)
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let body =
            with_retry(url, self.max_attempts, self.retry_base, || self.fetch_once(url)).await?;
        debug!(url, bytes = body.len(), "Fetched");
        Ok(body)
    }
}

/// Run `attempt_fn` until it succeeds, fails permanently, or `max_attempts`
/// is used up. Only transient errors are retried.
async fn with_retry<T, F, Fut>(
    url: &str,
    max_attempts: u32,
    base: Duration,
    mut attempt_fn: F,
) -> std::result::Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, FetchError>>,
{
    let mut attempt = 0;
    loop {
        match attempt_fn().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt + 1 < max_attempts => {
                let jitter_ms = rand::rng().random_range(0..base.as_millis().max(1) as u64);
                let backoff = base * 3u32.pow(attempt) + Duration::from_millis(jitter_ms);
                warn!(url, attempt = attempt + 1, error = %err, ?backoff, "Fetch failed, retrying");
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
