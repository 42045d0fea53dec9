//! Preflight validation of configured pools against the venue indexer.
//!
//! Configured pools carry the shared-object version the ledger needs, which
//! the indexer does not publish, so the indexer is used to verify rather than
//! replace the static registry. Any material difference (tick size, lot size,
//! min size, asset decimals or asset type) halts startup.

use crate::error::{RegistryError, RegistryResult};
use crate::pool_registry::PoolRegistry;
use serde::Deserialize;
use std::collections::HashMap;
use tide_core::{ObjectId, PairKey, Pool, TypeTag};
use tracing::{error, info, warn};

/// Deserialize an integer that the indexer may send as a number or a string.
fn deserialize_u64_flexible<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct U64Visitor;

    impl<'de> Visitor<'de> for U64Visitor {
        type Value = u64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("an unsigned integer as number or string")
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(v)
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            u64::try_from(v).map_err(de::Error::custom)
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            v.trim().parse::<u64>().map_err(de::Error::custom)
        }
    }

    deserializer.deserialize_any(U64Visitor)
}

/// Pool entry from the indexer `get_pools` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexerPool {
    pub pool_id: String,
    #[serde(default)]
    pub pool_name: String,
    pub base_asset_id: String,
    pub base_asset_decimals: u8,
    pub base_asset_symbol: String,
    pub quote_asset_id: String,
    pub quote_asset_decimals: u8,
    pub quote_asset_symbol: String,
    #[serde(deserialize_with = "deserialize_u64_flexible")]
    pub tick_size: u64,
    #[serde(deserialize_with = "deserialize_u64_flexible")]
    pub lot_size: u64,
    #[serde(deserialize_with = "deserialize_u64_flexible")]
    pub min_size: u64,
}

impl IndexerPool {
    pub fn object_id(&self) -> RegistryResult<ObjectId> {
        self.pool_id
            .parse()
            .map_err(|_| RegistryError::ParseError(format!("bad pool id {}", self.pool_id)))
    }

    pub fn pair_key(&self) -> PairKey {
        PairKey::new(&self.base_asset_symbol, &self.quote_asset_symbol)
    }

    /// Material differences from a configured pool.
    fn diff(&self, pool: &Pool) -> Vec<String> {
        let mut out = Vec::new();
        let mut check = |field: &str, configured: String, indexed: String| {
            if configured != indexed {
                out.push(format!("{field} {configured}->{indexed}"));
            }
        };
        check("tick_size", pool.tick_size.to_string(), self.tick_size.to_string());
        check("lot_size", pool.lot_size.to_string(), self.lot_size.to_string());
        check("min_size", pool.min_size.to_string(), self.min_size.to_string());
        check(
            "base_decimals",
            pool.base.decimals.to_string(),
            self.base_asset_decimals.to_string(),
        );
        check(
            "quote_decimals",
            pool.quote.decimals.to_string(),
            self.quote_asset_decimals.to_string(),
        );
        check(
            "base_type",
            pool.base.type_tag.canonical(),
            TypeTag::new(self.base_asset_id.as_str()).canonical(),
        );
        check(
            "quote_type",
            pool.quote.type_tag.canonical(),
            TypeTag::new(self.quote_asset_id.as_str()).canonical(),
        );
        out
    }
}

/// Outcome of a successful preflight.
#[derive(Debug, Default, Clone)]
pub struct PreflightResult {
    /// Configured pools confirmed by the indexer.
    pub verified: Vec<PairKey>,
    /// Configured pools the indexer does not list.
    pub missing: Vec<PairKey>,
    /// Indexer pools with no configured counterpart (informational).
    pub unconfigured: Vec<String>,
}

/// Verify every configured pool against indexer data.
///
/// Returns `Err(ParamChange)` listing every mismatch if any configured pool
/// differs from what the venue reports.
pub fn verify_pools(
    registry: &PoolRegistry,
    indexed: &[IndexerPool],
) -> RegistryResult<PreflightResult> {
    let mut by_id: HashMap<ObjectId, &IndexerPool> = HashMap::new();
    for entry in indexed {
        match entry.object_id() {
            Ok(id) => {
                by_id.insert(id, entry);
            }
            Err(e) => warn!(error = %e, "Skipping unparseable indexer pool"),
        }
    }

    let mut result = PreflightResult::default();
    let mut mismatches = Vec::new();

    for pool in registry.list_pools() {
        let key = pool.pair_key();
        match by_id.remove(&pool.id()) {
            Some(entry) => {
                let diff = entry.diff(&pool);
                if diff.is_empty() {
                    result.verified.push(key);
                } else {
                    mismatches.push(format!("{key}: {}", diff.join(", ")));
                }
            }
            None => {
                warn!(pool = %key, id = %pool.id(), "Configured pool not listed by indexer");
                result.missing.push(key);
            }
        }
    }

    if !mismatches.is_empty() {
        let msg = mismatches.join("; ");
        error!(%msg, "POOL PARAMETER MISMATCH");
        return Err(RegistryError::ParamChange(msg));
    }

    let mut unconfigured: Vec<String> = by_id.values().map(|e| e.pair_key().to_string()).collect();
    unconfigured.sort();
    result.unconfigured = unconfigured;

    info!(
        verified = result.verified.len(),
        missing = result.missing.len(),
        unconfigured = result.unconfigured.len(),
        "Pool preflight complete"
    );
    Ok(result)
}
