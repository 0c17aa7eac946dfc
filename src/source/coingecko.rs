//! CoinGecko simple-price source.
//!
//! `GET {api_base}/simple/price?ids={coin}&vs_currencies={currency}`
//! answers `{"bitcoin": {"usd": 67012.5}}`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;

use super::{HttpReply, PriceSource};
use crate::config::Config;
use crate::fetch::FetchError;

pub struct CoinGeckoSource {
    api_base: String,
    coin: String,
    currency: String,
    connect_timeout: Duration,
    read_timeout: Duration,
    /// Built on first use, then reused for every poll cycle.
    client: OnceLock<reqwest::Client>,
}

impl CoinGeckoSource {
    pub fn new(config: &Config) -> Self {
        Self {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            coin: config.coin.clone(),
            currency: config.currency.clone(),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            read_timeout: Duration::from_secs(config.read_timeout_secs),
            client: OnceLock::new(),
        }
    }

    pub fn url(&self) -> String {
        format!("{}/simple/price", self.api_base)
    }

    fn client(&self) -> Result<&reqwest::Client> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let client = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .read_timeout(self.read_timeout)
            .user_agent(concat!("btcwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        debug!(
            connect_timeout_secs = self.connect_timeout.as_secs(),
            read_timeout_secs = self.read_timeout.as_secs(),
            "HTTP client initialized"
        );
        Ok(self.client.get_or_init(|| client))
    }
}

#[async_trait]
impl PriceSource for CoinGeckoSource {
    fn source_id(&self) -> &str {
        "coingecko"
    }

    async fn get(&self) -> Result<HttpReply> {
        let resp = self
            .client()?
            .get(self.url())
            .query(&[("ids", self.coin.as_str()), ("vs_currencies", self.currency.as_str())])
            .send()
            .await
            .context("Request to price endpoint failed")?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .context("Failed to read response body")?;
        Ok(HttpReply::new(status, body))
    }

    fn parse_price(&self, body: &str) -> std::result::Result<f64, FetchError> {
        decode_price(body, &self.coin, &self.currency)
    }
}

/// Pull `body[coin][currency]` out of a simple-price response.
pub fn decode_price(body: &str, coin: &str, currency: &str) -> std::result::Result<f64, FetchError> {
    let parsed: Value = serde_json::from_str(body)
        .map_err(|e| FetchError::Decode(format!("malformed JSON: {}", e)))?;
    parsed[coin][currency]
        .as_f64()
        .ok_or_else(|| FetchError::Decode(format!("missing numeric field {}.{}", coin, currency)))
}
