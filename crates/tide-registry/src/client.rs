//! HTTP client for the venue indexer.
//!
//! Two read-only endpoints are used: `get_pools` for preflight and `ticker`
//! for last-traded prices.

use crate::error::{RegistryError, RegistryResult};
use crate::preflight::IndexerPool;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tide_core::PairKey;
use tracing::{debug, info, warn};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Ticker entry. Only the last price is used.
#[derive(Debug, Deserialize)]
struct RawTicker {
    #[serde(default)]
    last_price: Option<serde_json::Value>,
}

/// Parse a price sent as a JSON number or string.
///
/// Numbers go through their string form to keep what precision the f64 has.
fn parse_price(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::String(s) => s.trim().parse().ok(),
        serde_json::Value::Number(n) => n.to_string().parse().ok(),
        _ => None,
    }
}

/// Parse a `ticker` response body into positive prices keyed by pair.
pub fn parse_ticker(body: &serde_json::Value) -> RegistryResult<HashMap<PairKey, Decimal>> {
    let entries = body
        .as_object()
        .ok_or_else(|| RegistryError::ParseError("ticker response is not an object".to_string()))?;

    let mut prices = HashMap::with_capacity(entries.len());
    for (name, entry) in entries {
        let Ok(key) = name.parse::<PairKey>() else {
            debug!(%name, "Skipping ticker entry with unparseable pair");
            continue;
        };
        let raw: RawTicker = match serde_json::from_value(entry.clone()) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(%name, error = %e, "Skipping malformed ticker entry");
                continue;
            }
        };
        match raw.last_price.as_ref().and_then(parse_price) {
            Some(price) if price > Decimal::ZERO => {
                prices.insert(key, price);
            }
            _ => debug!(%name, "Ticker entry has no usable last price"),
        }
    }
    Ok(prices)
}

/// Client for the venue indexer REST API.
#[derive(Debug, Clone)]
pub struct IndexerClient {
    client: Client,
    base_url: String,
}

impl IndexerClient {
    /// Create a new indexer client.
    ///
    /// # Arguments
    /// * `base_url` - indexer root (e.g. "https://deepbook-indexer.mainnet.mystenlabs.com")
    pub fn new(base_url: impl Into<String>) -> RegistryResult<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| RegistryError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json(&self, path: &str) -> RegistryResult<serde_json::Value> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RegistryError::HttpClient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RegistryError::HttpClient(format!("HTTP {status}: {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| RegistryError::HttpClient(format!("Failed to parse response: {e}")))
    }

    /// Fetch every pool the indexer knows about.
    pub async fn fetch_pools(&self) -> RegistryResult<Vec<IndexerPool>> {
        info!(url = %self.base_url, "Fetching pools from indexer");
        let body = self.get_json("get_pools").await?;
        let entries = body.as_array().ok_or_else(|| {
            RegistryError::ParseError("get_pools response is not an array".to_string())
        })?;

        let mut pools = Vec::with_capacity(entries.len());
        for (idx, entry) in entries.iter().enumerate() {
            match serde_json::from_value::<IndexerPool>(entry.clone()) {
                Ok(pool) => pools.push(pool),
                Err(e) => warn!(idx, error = %e, "Skipping malformed pool entry"),
            }
        }
        debug!(count = pools.len(), "Indexer pools parsed");
        Ok(pools)
    }

    /// Fetch last-traded prices for all pairs.
    pub async fn fetch_ticker(&self) -> RegistryResult<HashMap<PairKey, Decimal>> {
        let body = self.get_json("ticker").await?;
        parse_ticker(&body)
    }
}
