//! Pool registry.
//!
//! Holds the assets and CLOB pools tradable in this session. Pools are keyed
//! by their `BASE_QUOTE` pair and resolvable from either symbol order; at most
//! one pool exists per unordered pair.

use crate::error::{RegistryError, RegistryResult};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tide_core::{Asset, ObjectId, PairKey, Pool, SharedObjectRef};
use tracing::{debug, info};

/// Pool entry as written in configuration. Assets are referenced by symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSpec {
    pub pool_id: ObjectId,
    pub initial_shared_version: u64,
    pub base: String,
    pub quote: String,
    pub tick_size: u64,
    pub lot_size: u64,
    pub min_size: u64,
}

/// A pool resolved for a directional trade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPool {
    pub pool: Pool,
    /// True when the input asset is the pool's base asset.
    pub is_base_to_quote: bool,
    pub input: Asset,
    pub output: Asset,
}

/// Registry of assets and pools.
#[derive(Debug, Default)]
pub struct PoolRegistry {
    assets: DashMap<String, Asset>,
    pools: DashMap<PairKey, Pool>,
}

impl PoolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from configured assets and pools.
    pub fn load_static(
        package: ObjectId,
        assets: impl IntoIterator<Item = Asset>,
        pools: impl IntoIterator<Item = PoolSpec>,
    ) -> RegistryResult<Self> {
        let registry = Self::new();
        for asset in assets {
            registry.register_asset(asset);
        }
        for spec in pools {
            let pool = registry.pool_from_spec(package, &spec)?;
            registry.register_pool(pool)?;
        }
        info!(
            assets = registry.assets.len(),
            pools = registry.pools.len(),
            "Pool registry loaded"
        );
        Ok(registry)
    }

    pub fn register_asset(&self, asset: Asset) {
        debug!(symbol = %asset.symbol, type_tag = %asset.type_tag, "Registering asset");
        self.assets.insert(asset.symbol.clone(), asset);
    }

    pub fn asset(&self, symbol: &str) -> Option<Asset> {
        self.assets
            .get(&symbol.to_ascii_uppercase())
            .map(|a| a.clone())
    }

    /// Asset by symbol, or `UnknownAsset`.
    pub fn require_asset(&self, symbol: &str) -> RegistryResult<Asset> {
        self.asset(symbol)
            .ok_or_else(|| RegistryError::UnknownAsset(symbol.to_string()))
    }

    fn pool_from_spec(&self, package: ObjectId, spec: &PoolSpec) -> RegistryResult<Pool> {
        if spec.tick_size == 0 || spec.lot_size == 0 {
            return Err(RegistryError::ParseError(format!(
                "{}_{}: tick_size and lot_size must be non-zero",
                spec.base, spec.quote
            )));
        }
        let pool = Pool {
            object: SharedObjectRef::new(spec.pool_id, spec.initial_shared_version, true),
            base: self.require_asset(&spec.base)?,
            quote: self.require_asset(&spec.quote)?,
            tick_size: spec.tick_size,
            lot_size: spec.lot_size,
            min_size: spec.min_size,
            package,
        };
        pool.price_tick_decimals()?;
        Ok(pool)
    }

    /// Register a pool. Fails with `DuplicatePair` if either orientation of
    /// its pair is already resolvable.
    pub fn register_pool(&self, pool: Pool) -> RegistryResult<()> {
        let key = pool.pair_key();
        if self.pools.contains_key(&key.reversed()) {
            return Err(RegistryError::DuplicatePair(key.to_string()));
        }
        match self.pools.entry(key.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(RegistryError::DuplicatePair(key.to_string()))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                debug!(pool = %key, id = %pool.id(), "Registering pool");
                slot.insert(pool);
                Ok(())
            }
        }
    }

    /// Pool for a trade from `input` to `output`, either orientation.
    pub fn find_pool(&self, input: &str, output: &str) -> Option<ResolvedPool> {
        let forward = PairKey::new(input, output);
        if let Some(pool) = self.pools.get(&forward) {
            return Some(ResolvedPool {
                input: pool.base.clone(),
                output: pool.quote.clone(),
                pool: pool.clone(),
                is_base_to_quote: true,
            });
        }
        self.pools.get(&forward.reversed()).map(|pool| ResolvedPool {
            input: pool.quote.clone(),
            output: pool.base.clone(),
            pool: pool.clone(),
            is_base_to_quote: false,
        })
    }

    /// Like [`find_pool`](Self::find_pool) but fails with `PoolNotFound`.
    pub fn resolve_pool(&self, input: &str, output: &str) -> RegistryResult<ResolvedPool> {
        self.find_pool(input, output)
            .ok_or_else(|| RegistryError::PoolNotFound(input.to_string(), output.to_string()))
    }

    /// Pool by its exact `BASE_QUOTE` key.
    pub fn pool(&self, key: &PairKey) -> Option<Pool> {
        self.pools.get(key).map(|p| p.clone())
    }

    /// All pools, ordered by pair key.
    pub fn list_pools(&self) -> Vec<Pool> {
        let mut pools: Vec<Pool> = self.pools.iter().map(|e| e.value().clone()).collect();
        pools.sort_by_key(|p| p.pair_key());
        pools
    }

    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }
}


#[cfg(test)]
mod tests {
    use super::test_fixtures::*;
    use super::*;

    #[test]
    fn test_resolve_both_orders() {
        let registry = registry();

        let sell = registry.resolve_pool("SUI", "USDC").unwrap();
        assert!(sell.is_base_to_quote);
        assert_eq!(sell.input.symbol, "SUI");
        assert_eq!(sell.output.symbol, "USDC");

        let buy = registry.resolve_pool("usdc", "sui").unwrap();
        assert!(!buy.is_base_to_quote);
        assert_eq!(buy.input.symbol, "USDC");
        assert_eq!(buy.pool.id(), sell.pool.id());
    }

    #[test]
    fn test_missing_pool_is_not_fatal() {
        let registry = registry();
        assert!(registry.find_pool("DEEP", "USDC").is_none());
        let err = registry.resolve_pool("DEEP", "USDC").unwrap_err();
        assert_eq!(err.kind(), tide_core::ErrorKind::PoolNotFound);
    }

    #[test]
    fn test_duplicate_pair_rejected_in_either_orientation() {
        let registry = registry();
        let mut spec = sui_usdc_spec();
        spec.pool_id = ObjectId::from_low_byte(0xbb);
        std::mem::swap(&mut spec.base, &mut spec.quote);
        let pool = registry
            .pool_from_spec(ObjectId::from_low_byte(0xdb), &spec)
            .unwrap();
        assert!(matches!(
            registry.register_pool(pool),
            Err(RegistryError::DuplicatePair(_))
        ));
        assert_eq!(registry.pool_count(), 1);
    }

    #[test]
    fn test_unknown_asset_in_spec() {
        let mut spec = sui_usdc_spec();
        spec.quote = "WAL".to_string();
        let err =
            PoolRegistry::load_static(ObjectId::from_low_byte(0xdb), assets(), vec![spec])
                .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownAsset(s) if s == "WAL"));
    }

    #[test]
    fn test_zero_lot_size_rejected() {
        let mut spec = sui_usdc_spec();
        spec.lot_size = 0;
        assert!(
            PoolRegistry::load_static(ObjectId::from_low_byte(0xdb), assets(), vec![spec])
                .is_err()
        );
    }

    #[test]
    fn test_list_pools_is_restartable() {
        let registry = registry();
        let first = registry.list_pools();
        let second = registry.list_pools();
        assert_eq!(first, second);
        assert_eq!(first[0].pair_key().to_string(), "SUI_USDC");
    }
}
