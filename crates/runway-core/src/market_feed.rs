//! HTTP market data feed
//!
//! Fetches the latest macro-economic snapshot from a JSON endpoint:
//!
//! ```text
//! GET {base_url}/snapshots/latest
//! 200 -> MarketSnapshot JSON
//! 404 -> no snapshot available
//! ```
//!
//! Environment variables:
//! - `RUNWAY_MARKET_URL`: feed base URL (takes precedence over config)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::config::ForecastConfig;
use crate::error::{Error, Result};
use crate::forecast::providers::MarketDataProvider;
use crate::models::MarketSnapshot;

pub const MARKET_URL_ENV: &str = "RUNWAY_MARKET_URL";

/// Market data provider backed by an HTTP endpoint
#[derive(Debug, Clone)]
pub struct HttpMarketDataProvider {
    http_client: Client,
    base_url: String,
}

impl HttpMarketDataProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create from the environment, falling back to the configured endpoint
    pub fn from_config(config: &ForecastConfig) -> Result<Option<Self>> {
        let url = std::env::var(MARKET_URL_ENV)
            .ok()
            .filter(|u| !u.trim().is_empty())
            .or_else(|| config.market_endpoint.clone());

        url.map(|u| Self::new(&u, config.market_timeout)).transpose()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl MarketDataProvider for HttpMarketDataProvider {
    async fn latest_snapshot(&self) -> Result<Option<MarketSnapshot>> {
        let url = format!("{}/snapshots/latest", self.base_url);
        debug!(%url, "Fetching market snapshot");

        let response = self.http_client.get(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Error::MarketData(format!(
                "Market feed returned {}",
                response.status()
            )));
        }

        let snapshot: MarketSnapshot = response.json().await?;
        Ok(Some(snapshot))
    }
}
