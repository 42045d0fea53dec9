//! Price feed seam.

use crate::error::{ExecutorError, ExecutorResult};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tide_core::{BoxFuture, PairKey, Price};
use tide_registry::IndexerClient;
use tracing::{debug, trace};

pub type PriceMap = HashMap<PairKey, Price>;

/// Supplies current prices (quote per base) for pairs.
///
/// Pairs without a usable price are omitted from the result rather than
/// failing the whole request.
pub trait PriceFeed: Send + Sync {
    fn get_prices(&self, pairs: Vec<PairKey>) -> BoxFuture<'_, ExecutorResult<PriceMap>>;
}

/// Arc wrapper for PriceFeed trait objects.
pub type DynPriceFeed = Arc<dyn PriceFeed>;

/// Price feed backed by the indexer ticker endpoint.
#[derive(Debug, Clone)]
pub struct HttpPriceFeed {
    client: IndexerClient,
}

impl HttpPriceFeed {
    pub fn new(client: IndexerClient) -> Self {
        Self { client }
    }
}

impl PriceFeed for HttpPriceFeed {
    fn get_prices(&self, pairs: Vec<PairKey>) -> BoxFuture<'_, ExecutorResult<PriceMap>> {
        Box::pin(async move {
            let ticker = self
                .client
                .fetch_ticker()
                .await
                .map_err(|e| ExecutorError::PriceFeed(e.to_string()))?;
            let prices: PriceMap = pairs
                .into_iter()
                .filter_map(|pair| ticker.get(&pair).map(|p| (pair, Price::new(*p))))
                .collect();
            trace!(count = prices.len(), "Ticker prices fetched");
            Ok(prices)
        })
    }
}

/// Mock price feed for testing.
///
/// Scripted snapshots are served first, one per poll; afterwards the
/// static prices are served.
#[derive(Debug, Default)]
pub struct MockPriceFeed {
    prices: Mutex<PriceMap>,
    script: Mutex<VecDeque<PriceMap>>,
    failure: Mutex<Option<String>>,
    polls: AtomicU64,
    requested: Mutex<Vec<Vec<PairKey>>>,
}

impl MockPriceFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_price(&self, pair: PairKey, price: Price) {
        self.prices.lock().insert(pair, price);
    }

    pub fn remove_price(&self, pair: &PairKey) {
        self.prices.lock().remove(pair);
    }

    /// Queue a one-shot snapshot.
    pub fn push_snapshot(&self, snapshot: PriceMap) {
        self.script.lock().push_back(snapshot);
    }

    pub fn set_failure(&self, message: Option<String>) {
        *self.failure.lock() = message;
    }

    pub fn poll_count(&self) -> u64 {
        self.polls.load(Ordering::SeqCst)
    }

    /// Pair lists of every poll so far.
    pub fn requested(&self) -> Vec<Vec<PairKey>> {
        self.requested.lock().clone()
    }
}

impl PriceFeed for MockPriceFeed {
    fn get_prices(&self, pairs: Vec<PairKey>) -> BoxFuture<'_, ExecutorResult<PriceMap>> {
        Box::pin(async move {
            self.polls.fetch_add(1, Ordering::SeqCst);
            self.requested.lock().push(pairs.clone());
            if let Some(message) = self.failure.lock().clone() {
                return Err(ExecutorError::PriceFeed(message));
            }
            let source = self
                .script
                .lock()
                .pop_front()
                .unwrap_or_else(|| self.prices.lock().clone());
            let prices: PriceMap = pairs
                .into_iter()
                .filter_map(|pair| source.get(&pair).map(|p| (pair, *p)))
                .collect();
            debug!(count = prices.len(), "Mock prices served");
            Ok(prices)
        })
    }
}
