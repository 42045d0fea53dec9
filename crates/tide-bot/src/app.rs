//! Main application orchestration.
//!
//! Builds the registry, inventory, authorization, builder and coordinator
//! from configuration, then runs the coordinator tasks until ctrl-c.

use crate::config::{AppConfig, AuthorizationSource};
use crate::error::AppResult;
use std::sync::Arc;
use std::time::Duration;
use tide_core::{Clock, Order, SystemClock};
use tide_executor::{
    CoordinatorDeps, DryRunSigner, DynPriceFeed, DynSigner, ExecutionCoordinator, HttpPriceFeed,
    SessionStore,
};
use tide_registry::{verify_pools, IndexerClient, PoolRegistry};
use tide_telemetry::Metrics;
use tide_tx::TransactionBuilder;
use tide_wallet::{
    AuthorizationManager, CoinInventory, DynAuthorizationLookup, DynCoinQuery, JsonRpcClient,
    RpcAuthorizationLookup, RpcCoinQuery, StaticAuthorizationLookup,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Status summary interval.
const STATUS_INTERVAL: Duration = Duration::from_secs(300);

/// External seams of the application.
pub struct Components {
    pub coin_query: DynCoinQuery,
    pub authorization: DynAuthorizationLookup,
    pub signer: DynSigner,
    pub price_feed: DynPriceFeed,
    pub clock: Arc<dyn Clock>,
}

/// Main application.
pub struct Application {
    config: AppConfig,
    registry: Arc<PoolRegistry>,
    indexer: IndexerClient,
    coordinator: Arc<ExecutionCoordinator>,
}

impl Application {
    /// Create the application with live ledger access.
    ///
    /// Signing is external, so submissions go through a dry-run signer that
    /// logs each script for the wallet to pick up. Nothing is confirmed, so
    /// triggered orders stay triggered until the wallet executes them.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let indexer = IndexerClient::new(&config.indexer_url)?;
        let rpc = JsonRpcClient::new(&config.rpc_url)?;
        let authorization: DynAuthorizationLookup = match config.authorization.source {
            AuthorizationSource::Ledger => Arc::new(RpcAuthorizationLookup::new(
                rpc.clone(),
                config.venue.package,
                config.authorization.balance_manager_id(),
            )),
            AuthorizationSource::Static => Arc::new(StaticAuthorizationLookup::new(
                config.owner,
                config.authorization.balance_manager_ref(),
                config.authorization.trade_caps.clone(),
            )),
        };
        info!(
            source = ?config.authorization.source,
            rpc = rpc.rpc_url(),
            "Authorization lookup ready"
        );
        let components = Components {
            coin_query: Arc::new(RpcCoinQuery::new(rpc)),
            authorization,
            signer: Arc::new(DryRunSigner),
            price_feed: Arc::new(HttpPriceFeed::new(indexer.clone())),
            clock: Arc::new(SystemClock),
        };
        Self::with_components(config, components)
    }

    /// Create the application over caller-supplied seams.
    pub fn with_components(config: AppConfig, components: Components) -> AppResult<Self> {
        let registry = Arc::new(PoolRegistry::load_static(
            config.venue.package,
            config.assets(),
            config.pools.clone(),
        )?);
        let indexer = IndexerClient::new(&config.indexer_url)?;

        let auth = Arc::new(AuthorizationManager::new(
            components.authorization,
            config.venue.package,
        ));
        let builder = Arc::new(TransactionBuilder::new(
            config.builder_config(),
            auth,
            Arc::clone(&components.clock),
        ));
        let inventory = Arc::new(CoinInventory::new(
            components.coin_query,
            config.inventory.ttl(),
        ));
        let sessions = SessionStore::new(config.session.capacity, config.session.idle_ttl());

        let coordinator = Arc::new(ExecutionCoordinator::new(
            config.coordinator.clone(),
            config.owner,
            CoordinatorDeps {
                registry: Arc::clone(&registry),
                inventory,
                builder,
                signer: components.signer,
                price_feed: components.price_feed,
                clock: components.clock,
            },
            sessions,
        ));

        info!(
            mode = ?config.mode,
            pools = registry.pool_count(),
            style = ?config.coordinator.execution_style,
            "Application initialized"
        );
        Ok(Self {
            config,
            registry,
            indexer,
            coordinator,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<PoolRegistry> {
        &self.registry
    }

    pub fn coordinator(&self) -> &Arc<ExecutionCoordinator> {
        &self.coordinator
    }

    /// Verify configured pools against the indexer when `discover_pools`
    /// is set. A parameter mismatch aborts startup.
    pub async fn run_preflight(&self) -> AppResult<()> {
        if !self.config.discover_pools {
            info!("Pool preflight disabled, using static configuration");
            return Ok(());
        }
        info!(url = %self.indexer.base_url(), "Running pool preflight");
        let indexed = self.indexer.fetch_pools().await?;
        let result = verify_pools(&self.registry, &indexed)?;
        if !result.missing.is_empty() {
            warn!(missing = ?result.missing, "Configured pools not listed by indexer");
        }
        info!(
            verified = result.verified.len(),
            missing = result.missing.len(),
            unconfigured = result.unconfigured.len(),
            "Pool preflight passed"
        );
        Ok(())
    }

    /// Create the conditional orders listed in configuration.
    pub fn seed_orders(&self) -> AppResult<Vec<Order>> {
        let mut created = Vec::with_capacity(self.config.orders.len());
        for new in &self.config.orders {
            let order = self.coordinator.create_order(new.clone())?;
            created.push(order);
        }
        if !created.is_empty() {
            info!(count = created.len(), "Configured orders created");
        }
        Ok(created)
    }

    /// Run the coordinator until ctrl-c.
    pub async fn run(self) -> AppResult<()> {
        let token = CancellationToken::new();
        let handle = Arc::clone(&self.coordinator).spawn(token.clone());

        info!("Entering main loop");
        let mut status_interval = tokio::time::interval(STATUS_INTERVAL);
        loop {
            tokio::select! {
                _ = status_interval.tick() => {
                    let live = self.coordinator.live_orders();
                    info!(live = live.len(), "Status");
                }
                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        error!(error = %e, "Failed to listen for shutdown signal");
                    }
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        handle.shutdown().await;

        let orders = self.coordinator.list_orders();
        for order in orders.iter().filter(|o| o.status.is_live()) {
            warn!(order_id = %order.id, status = %order.status, "Order still live at shutdown");
        }
        match Metrics::render() {
            Ok(text) => info!(metrics = %text, "Final metrics"),
            Err(e) => warn!(error = %e, "Failed to render metrics"),
        }
        info!(total_orders = orders.len(), "Shutdown complete");
        Ok(())
    }
}
