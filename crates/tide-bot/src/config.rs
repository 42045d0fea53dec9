//! Application configuration.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use tide_core::{Address, Asset, NewOrder, ObjectId, SharedObjectRef, TypeTag};
use tide_executor::{CoordinatorConfig, DEFAULT_SESSION_CAPACITY};
use tide_registry::PoolSpec;
use tide_tx::{BuildMode, BuilderConfig, BPS_DENOMINATOR};
use tide_wallet::TradeCapEntry;

/// Venue deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueConfig {
    /// Package holding the `pool` and `balance_manager` modules.
    pub package: ObjectId,
}

/// Asset entry. Symbols are upper-cased on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetConfig {
    pub symbol: String,
    pub type_tag: TypeTag,
    pub decimals: u8,
}

impl AssetConfig {
    pub fn to_asset(&self) -> Asset {
        Asset::new(&self.symbol, self.type_tag.clone(), self.decimals)
    }
}

/// Where authorization objects are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorizationSource {
    /// Query the ledger for the balance manager and trade capabilities.
    #[default]
    Ledger,
    /// Use the objects listed in this section as they are.
    Static,
}

/// The owner's balance manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceManagerConfig {
    pub object_id: ObjectId,
    /// Only read with the static source; the ledger reports it otherwise.
    #[serde(default)]
    pub initial_shared_version: u64,
}

/// Existing authorization objects of the owner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorizationConfig {
    #[serde(default)]
    pub source: AuthorizationSource,
    #[serde(default)]
    pub balance_manager: Option<BalanceManagerConfig>,
    #[serde(default)]
    pub trade_caps: Vec<TradeCapEntry>,
}

impl AuthorizationConfig {
    pub fn balance_manager_ref(&self) -> Option<SharedObjectRef> {
        self.balance_manager
            .as_ref()
            .map(|bm| SharedObjectRef::new(bm.object_id, bm.initial_shared_version, true))
    }

    pub fn balance_manager_id(&self) -> Option<ObjectId> {
        self.balance_manager.as_ref().map(|bm| bm.object_id)
    }
}

/// Transaction builder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuilderSection {
    #[serde(default)]
    pub allow_zero_fee: bool,
    #[serde(default)]
    pub allow_zero_min_output: bool,
    #[serde(default = "default_order_expiry_secs")]
    pub order_expiry_secs: u64,
    #[serde(default = "default_pay_with_fee_token")]
    pub pay_with_fee_token: bool,
}

fn default_order_expiry_secs() -> u64 {
    86_400
}

fn default_pay_with_fee_token() -> bool {
    true
}

impl Default for BuilderSection {
    fn default() -> Self {
        Self {
            allow_zero_fee: false,
            allow_zero_min_output: false,
            order_expiry_secs: default_order_expiry_secs(),
            pay_with_fee_token: default_pay_with_fee_token(),
        }
    }
}

/// Coin inventory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    #[serde(default = "default_inventory_ttl_ms")]
    pub ttl_ms: u64,
}

fn default_inventory_ttl_ms() -> u64 {
    12_000
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            ttl_ms: default_inventory_ttl_ms(),
        }
    }
}

impl InventoryConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

/// Session store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_session_capacity")]
    pub capacity: usize,
    #[serde(default = "default_session_idle_ttl_secs")]
    pub idle_ttl_secs: u64,
}

fn default_session_capacity() -> usize {
    DEFAULT_SESSION_CAPACITY
}

fn default_session_idle_ttl_secs() -> u64 {
    1_800
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            capacity: default_session_capacity(),
            idle_ttl_secs: default_session_idle_ttl_secs(),
        }
    }
}

impl SessionConfig {
    pub fn idle_ttl(&self) -> Duration {
        Duration::from_secs(self.idle_ttl_secs)
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub mode: BuildMode,

    /// Ledger JSON-RPC endpoint.
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Venue indexer REST endpoint.
    #[serde(default = "default_indexer_url")]
    pub indexer_url: String,

    /// Account whose coins and orders the engine manages.
    pub owner: Address,

    pub venue: VenueConfig,

    /// Verify configured pools against the indexer at startup.
    #[serde(default)]
    pub discover_pools: bool,

    #[serde(default)]
    pub assets: Vec<AssetConfig>,

    #[serde(default)]
    pub pools: Vec<PoolSpec>,

    /// Conditional orders created at startup.
    #[serde(default)]
    pub orders: Vec<NewOrder>,

    #[serde(default)]
    pub authorization: AuthorizationConfig,

    #[serde(default)]
    pub coordinator: CoordinatorConfig,

    #[serde(default)]
    pub builder: BuilderSection,

    #[serde(default)]
    pub inventory: InventoryConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

fn default_rpc_url() -> String {
    "https://fullnode.mainnet.sui.io:443".to_string()
}

fn default_indexer_url() -> String {
    "https://deepbook-indexer.mainnet.mystenlabs.com".to_string()
}

impl AppConfig {
    /// Load and validate configuration from a TOML file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn assets(&self) -> Vec<Asset> {
        self.assets.iter().map(AssetConfig::to_asset).collect()
    }

    pub fn builder_config(&self) -> BuilderConfig {
        BuilderConfig {
            mode: self.mode,
            allow_zero_fee: self.builder.allow_zero_fee,
            allow_zero_min_output: self.builder.allow_zero_min_output,
            order_expiry_ms: self.builder.order_expiry_secs.saturating_mul(1_000),
            pay_with_fee_token: self.builder.pay_with_fee_token,
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.owner == Address::ZERO {
            return Err(AppError::Config("owner must be set".to_string()));
        }
        if self.pools.is_empty() {
            return Err(AppError::Config("at least one pool must be configured".to_string()));
        }

        let symbols: HashSet<String> = self
            .assets
            .iter()
            .map(|a| a.symbol.to_ascii_uppercase())
            .collect();
        if symbols.len() != self.assets.len() {
            return Err(AppError::Config("duplicate asset symbol".to_string()));
        }
        for pool in &self.pools {
            for symbol in [&pool.base, &pool.quote] {
                if !symbols.contains(&symbol.to_ascii_uppercase()) {
                    return Err(AppError::Config(format!(
                        "pool {} references unknown asset {symbol}",
                        pool.pool_id
                    )));
                }
            }
        }
        if !symbols.contains(&self.coordinator.fee_asset.to_ascii_uppercase()) {
            return Err(AppError::Config(format!(
                "fee asset {} is not a configured asset",
                self.coordinator.fee_asset
            )));
        }

        if u64::from(self.coordinator.slippage_bps) > BPS_DENOMINATOR {
            return Err(AppError::Config(format!(
                "slippage_bps {} exceeds {BPS_DENOMINATOR}",
                self.coordinator.slippage_bps
            )));
        }
        if self.coordinator.price_poll_ms == 0 || self.coordinator.inventory_poll_ms == 0 {
            return Err(AppError::Config("poll intervals must be positive".to_string()));
        }
        if let (AuthorizationSource::Static, Some(bm)) =
            (self.authorization.source, &self.authorization.balance_manager)
        {
            if bm.initial_shared_version == 0 {
                return Err(AppError::Config(
                    "static balance manager needs its initial_shared_version".to_string(),
                ));
            }
        }
        if self.mode.is_production() && self.builder.allow_zero_min_output {
            tracing::warn!("allow_zero_min_output is set in production mode");
        }
        Ok(())
    }
}
