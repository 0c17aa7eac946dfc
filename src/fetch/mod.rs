//! Fetcher — one logical "get the price" operation per poll cycle.
//!
//! Wraps a [`PriceSource`] with the [`RetryPolicy`]: up to `max_attempts`
//! requests, each failure classified into retry-with-backoff or give-up.
//! The caller only ever sees a [`PriceReading`]; failures are logged,
//! never returned.

use http::StatusCode;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::cancel::CancellationToken;
use crate::clock::{sleep_or_cancel, Sleeper};
use crate::source::PriceSource;

pub mod retry;

pub use retry::{RetryDecision, RetryPolicy};

/// Result of one poll cycle's fetch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceReading {
    value: f64,
    valid: bool,
}

impl PriceReading {
    pub fn valid(value: f64) -> Self {
        Self { value, valid: true }
    }

    pub fn invalid() -> Self {
        Self { value: 0.0, valid: false }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The price, if this reading is valid.
    pub fn value(&self) -> Option<f64> {
        self.valid.then_some(self.value)
    }
}

/// A single failed attempt, as observed by the fetcher.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("no response: {0}")]
    Transport(String),
    #[error("rate limited (HTTP 429)")]
    RateLimited,
    #[error("server error (HTTP {0})")]
    Server(StatusCode),
    #[error("client error (HTTP {0})")]
    Client(StatusCode),
    #[error("unexpected status (HTTP {0})")]
    UnexpectedStatus(StatusCode),
    #[error("undecodable body: {0}")]
    Decode(String),
}

impl FetchError {
    /// Classify a non-200 status.
    pub fn from_status(status: StatusCode) -> Self {
        if status == StatusCode::TOO_MANY_REQUESTS {
            FetchError::RateLimited
        } else if status.is_server_error() {
            FetchError::Server(status)
        } else if status.is_client_error() {
            FetchError::Client(status)
        } else {
            FetchError::UnexpectedStatus(status)
        }
    }

    /// Stable label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport(_) => "transport",
            FetchError::RateLimited => "rate_limited",
            FetchError::Server(_) => "server_error",
            FetchError::Client(_) => "client_error",
            FetchError::UnexpectedStatus(_) => "unexpected_status",
            FetchError::Decode(_) => "decode",
        }
    }
}

pub struct Fetcher {
    source: Arc<dyn PriceSource>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    token: CancellationToken,
}

impl Fetcher {
    pub fn new(
        source: Arc<dyn PriceSource>,
        policy: RetryPolicy,
        sleeper: Arc<dyn Sleeper>,
        token: CancellationToken,
    ) -> Self {
        Self { source, policy, sleeper, token }
    }

    /// Fetch the current price, retrying transient failures.
    pub async fn fetch(&self) -> PriceReading {
        let max_attempts = self.policy.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            if self.token.is_requested() {
                debug!(attempt, "Cancellation requested — abandoning fetch");
                return PriceReading::invalid();
            }

            let err = match self.attempt().await {
                Ok(price) => {
                    debug!(source = self.source.source_id(), attempt, price, "Price fetched");
                    return PriceReading::valid(price);
                }
                Err(e) => e,
            };

            match self.policy.classify(&err) {
                RetryDecision::NoRetry => {
                    warn!(
                        source = self.source.source_id(),
                        attempt,
                        max_attempts,
                        kind = err.kind(),
                        "Fetch failed: {} — not retrying",
                        err
                    );
                    return PriceReading::invalid();
                }
                RetryDecision::RetryAfter(_) if attempt == max_attempts => {
                    warn!(
                        source = self.source.source_id(),
                        attempt,
                        max_attempts,
                        kind = err.kind(),
                        "Fetch failed: {} — retry budget exhausted",
                        err
                    );
                }
                RetryDecision::RetryAfter(backoff) => {
                    warn!(
                        source = self.source.source_id(),
                        attempt,
                        max_attempts,
                        kind = err.kind(),
                        backoff_secs = backoff.as_secs(),
                        "Fetch failed: {} — retrying after backoff",
                        err
                    );
                    if sleep_or_cancel(self.sleeper.as_ref(), backoff, &self.token).await {
                        debug!(attempt, "Cancellation requested during backoff");
                        return PriceReading::invalid();
                    }
                }
            }
        }

        PriceReading::invalid()
    }

    async fn attempt(&self) -> Result<f64, FetchError> {
        let reply = self
            .source
            .get()
            .await
            .map_err(|e| FetchError::Transport(format!("{:#}", e)))?;

        if reply.status != StatusCode::OK {
            return Err(FetchError::from_status(reply.status));
        }
        self.source.parse_price(&reply.body)
    }
}
