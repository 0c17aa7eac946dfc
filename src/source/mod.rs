//! Price source trait — the HTTP transport seam.
//!
//! A source performs exactly one request per call and knows how to pull
//! the price out of its own response body. It never retries; the fetcher
//! owns the retry policy.

use anyhow::Result;
use async_trait::async_trait;
use http::StatusCode;

use crate::fetch::FetchError;

pub mod coingecko;

/// Raw outcome of a request that produced an HTTP response.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: StatusCode,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }
}

#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Short identifier used in logs (e.g., "coingecko").
    fn source_id(&self) -> &str;

    /// Issue one GET against the price endpoint.
    ///
    /// `Err` means no response was received (connect failure, timeout,
    /// broken body stream).
    async fn get(&self) -> Result<HttpReply>;

    /// Extract the price from a 200 response body.
    fn parse_price(&self, body: &str) -> std::result::Result<f64, FetchError>;
}
