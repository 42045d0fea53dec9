//! Cached view of an owner's spendable coins.

use crate::coin::Holdings;
use crate::error::WalletResult;
use crate::query::DynCoinQuery;
use dashmap::DashMap;
use std::time::Duration;
use tide_core::{Address, Asset};
use tokio::time::Instant;
use tracing::debug;

/// Default holdings TTL.
pub const DEFAULT_INVENTORY_TTL: Duration = Duration::from_secs(12);

#[derive(Debug, Clone)]
struct CacheEntry {
    holdings: Holdings,
    fetched_at: Instant,
}

/// Holdings per (owner, coin type) with a short TTL.
///
/// Entries must be invalidated after any submission that consumes or
/// creates coins; the TTL only bounds staleness between polls.
pub struct CoinInventory {
    query: DynCoinQuery,
    ttl: Duration,
    cache: DashMap<(Address, String), CacheEntry>,
}

impl CoinInventory {
    pub fn new(query: DynCoinQuery, ttl: Duration) -> Self {
        Self {
            query,
            ttl,
            cache: DashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn key(owner: Address, asset: &Asset) -> (Address, String) {
        (owner, asset.type_tag.canonical())
    }

    /// Holdings for `owner` in `asset`, served from cache while fresh.
    pub async fn query(&self, owner: Address, asset: &Asset) -> WalletResult<Holdings> {
        if let Some(entry) = self.cache.get(&Self::key(owner, asset)) {
            if entry.fetched_at.elapsed() < self.ttl {
                return Ok(entry.holdings.clone());
            }
        }
        self.refresh(owner, asset).await
    }

    /// Fetch holdings from the ledger, bypassing the cache.
    pub async fn refresh(&self, owner: Address, asset: &Asset) -> WalletResult<Holdings> {
        let records = self
            .query
            .list_coins(owner, asset.type_tag.clone())
            .await?;
        let holdings = Holdings::new(asset.type_tag.clone(), records);
        debug!(
            %owner,
            asset = %asset.symbol,
            coins = holdings.len(),
            aggregate = %holdings.aggregate(),
            "Holdings refreshed"
        );
        self.cache.insert(
            Self::key(owner, asset),
            CacheEntry {
                holdings: holdings.clone(),
                fetched_at: Instant::now(),
            },
        );
        Ok(holdings)
    }

    /// Last fetched holdings regardless of age.
    pub fn cached(&self, owner: Address, asset: &Asset) -> Option<Holdings> {
        self.cache
            .get(&Self::key(owner, asset))
            .map(|e| e.holdings.clone())
    }

    /// Drop every cached entry of `owner`.
    pub fn invalidate_owner(&self, owner: Address) {
        self.cache.retain(|(o, _), _| *o != owner);
    }
}
