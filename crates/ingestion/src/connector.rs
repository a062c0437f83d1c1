//! Connector
//!
//! Opens the streaming connection to the sensor feed, retrying a bounded
//! number of times with a caller-supplied backoff.

use std::time::Duration;

use contracts::{BackoffKind, RetryConfig};
use futures::TryStreamExt;
use tokio_util::io::StreamReader;
use tracing::{error, info, instrument, warn};

use crate::error::{IngestionError, Result};
use crate::source::{FeedSource, FeedStream};

/// Upper bound for a single backoff delay
const MAX_BACKOFF: Duration = Duration::from_secs(3600);

/// HTTP streaming feed
#[derive(Debug, Clone)]
pub struct HttpFeedSource {
    url: String,
    client: reqwest::Client,
}

impl HttpFeedSource {
    /// Create a feed source for `url`
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        let client = reqwest::Client::builder()
            .user_agent(concat!("lunarsensor/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| IngestionError::connect(url.clone(), e))?;
        Ok(Self { url, client })
    }
}

impl FeedSource for HttpFeedSource {
    fn endpoint(&self) -> &str {
        &self.url
    }

    async fn open(&self) -> Result<FeedStream> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| IngestionError::connect(self.url.clone(), e))?;

        let body = response.bytes_stream().map_err(std::io::Error::other);
        Ok(Box::new(StreamReader::new(Box::pin(body))))
    }
}

/// Delay before the next connect attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `base` before every retry
    Constant(Duration),
    /// `base * attempt`
    Linear(Duration),
    /// `base * 2^(attempt - 1)`, capped at one hour
    Exponential(Duration),
}

impl Backoff {
    pub fn new(kind: BackoffKind, base: Duration) -> Self {
        match kind {
            BackoffKind::Constant => Self::Constant(base),
            BackoffKind::Linear => Self::Linear(base),
            BackoffKind::Exponential => Self::Exponential(base),
        }
    }

    /// Delay after the failed attempt number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        match *self {
            Self::Constant(base) => base,
            Self::Linear(base) => base.saturating_mul(attempt),
            Self::Exponential(base) => {
                let factor = 1u32.checked_shl(attempt - 1).unwrap_or(u32::MAX);
                base.saturating_mul(factor).min(MAX_BACKOFF)
            }
        }
    }
}

/// Bounded connect policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, at least one is always made
    pub max_retries: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: Backoff) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// Connect `source` under this policy
    pub async fn connect<S: FeedSource>(&self, source: &S) -> Result<FeedStream> {
        connect_with_retry(source, self.max_retries, |attempt| {
            self.backoff.delay_for(attempt)
        })
        .await
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(
            config.max_retries,
            Backoff::new(config.backoff, config.delay()),
        )
    }
}

/// Open `source`, retrying up to `max_retries` attempts in total
///
/// `backoff(n)` is slept after failed attempt `n` when another attempt follows.
///
/// # Errors
/// `ConnectExhausted` once every attempt has failed. Callers treat this as fatal.
#[instrument(
    name = "connector_connect",
    skip(source, backoff),
    fields(endpoint = %source.endpoint())
)]
pub async fn connect_with_retry<S, F>(
    source: &S,
    max_retries: u32,
    backoff: F,
) -> Result<FeedStream>
where
    S: FeedSource,
    F: Fn(u32) -> Duration,
{
    let max_retries = max_retries.max(1);
    let mut attempt = 1;

    loop {
        match source.open().await {
            Ok(stream) => {
                observability::record_connect_attempt(true);
                info!(attempt, "Connected to feed");
                return Ok(stream);
            }
            Err(err) => {
                observability::record_connect_attempt(false);

                if attempt >= max_retries {
                    error!(attempt, error = %err, "Connect retries exhausted");
                    return Err(IngestionError::ConnectExhausted {
                        endpoint: source.endpoint().to_string(),
                        attempts: attempt,
                        last: Box::new(err),
                    });
                }

                let delay = backoff(attempt);
                warn!(
                    attempt,
                    max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Connect attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
