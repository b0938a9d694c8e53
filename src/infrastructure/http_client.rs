//! HTTP client for fetching module pages
//!
//! One GET per attempt with a per-request timeout. Failures are classified
//! into [`ReaderError::Network`] and [`ReaderError::HttpStatus`]; transient
//! ones are retried with exponential backoff up to `max_retries` times.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;

use crate::domain::services::PageFetcher;
use crate::infrastructure::config::FetchConfig;
use crate::infrastructure::reader_error::{ReaderError, ReaderResult};

/// Upper bound for a single backoff delay, including server-requested ones
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// A failed attempt plus the delay the server asked for, if any
#[derive(Debug)]
struct AttemptFailure {
    error: ReaderError,
    retry_after: Option<Duration>,
}

impl From<ReaderError> for AttemptFailure {
    fn from(error: ReaderError) -> Self {
        Self {
            error,
            retry_after: None,
        }
    }
}

/// reqwest-backed page fetcher
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    config: FetchConfig,
}

impl HttpClient {
    /// Create a client with default fetch settings
    pub fn new() -> Result<Self> {
        Self::with_config(FetchConfig::default())
    }

    /// Create a client with custom configuration
    pub fn with_config(config: FetchConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(config.timeout())
            .user_agent(&config.user_agent)
            .gzip(true)
            .brotli(true)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self { client, config })
    }

    pub const fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch a page, retrying transient failures
    pub async fn fetch_with_policy(&self, url: &Url, timeout: Duration) -> ReaderResult<String> {
        let attempts = self.config.max_retries.saturating_add(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.fetch_once(url, timeout).await {
                Ok(body) => {
                    debug!("Fetched {} ({} bytes) on attempt {}", url, body.len(), attempt);
                    return Ok(body);
                }
                Err(failure) if failure.error.is_retryable() && attempt < attempts => {
                    let mut delay = self.backoff(attempt);
                    if let Some(requested) = failure.retry_after {
                        delay = delay.max(requested).min(MAX_RETRY_DELAY);
                    }
                    warn!(
                        "⚠️ Attempt {}/{} failed for {}: {} (retrying in {:?})",
                        attempt, attempts, url, failure.error, delay
                    );
                    sleep(delay).await;
                }
                Err(failure) => {
                    if attempt > 1 {
                        warn!("❌ Giving up on {} after {} attempts: {}", url, attempt, failure.error);
                    }
                    return Err(failure.error);
                }
            }
        }
    }

    /// Exponential backoff for the given 1-based attempt
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(self.config.retry_backoff_ms.saturating_mul(factor)).min(MAX_RETRY_DELAY)
    }

    async fn fetch_once(&self, url: &Url, timeout: Duration) -> Result<String, AttemptFailure> {
        info!("🌐 HTTP GET: {}", url);
        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| transport_error(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            debug!("HTTP status {} for {}", status, url);
            return Err(AttemptFailure {
                error: ReaderError::http_status(status.as_u16(), url.as_str()),
                retry_after: retry_after(response.headers()),
            });
        }

        let body = response.text().await.map_err(|e| transport_error(url, &e))?;
        Ok(body)
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch(&self, url: &Url, timeout: Duration) -> ReaderResult<String> {
        self.fetch_with_policy(url, timeout).await
    }
}

fn transport_error(url: &Url, error: &reqwest::Error) -> ReaderError {
    ReaderError::network(url.as_str(), error.to_string(), error.is_timeout())
}

/// Delay requested by a `Retry-After` header given in seconds
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
