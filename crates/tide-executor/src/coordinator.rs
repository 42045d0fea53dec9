//! Execution coordinator.
//!
//! Owns the order store and drives two periodic tasks on the runtime:
//! a price task that evaluates pending orders and executes the ones that
//! fire, and an inventory task that keeps spendable balances warm. Every
//! store mutation happens under one lock acquisition with no await point
//! inside, so the tasks never observe a half-applied pass.

use crate::error::{ExecutorError, ExecutorResult};
use crate::price_feed::DynPriceFeed;
use crate::session::SessionStore;
use crate::signer::{DynSigner, SignerError, SubmitReceipt};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tide_core::{
    to_base_units, Address, Asset, Clock, ErrorKind, LedgerTransactionScript, NewOrder, ObjectId,
    Order, OrderId, OrderSide, OrderStatus, PairKey, Pool, Price, SharedObjectRef, Size,
};
use tide_orders::{CancelOutcome, OrderError, OrderLifecycleStore, Transition};
use tide_registry::{PoolRegistry, RegistryError, ResolvedPool};
use tide_telemetry::Metrics;
use tide_tx::{
    estimate_output, min_output, BuiltSwap, FeeInput, OrderRestriction, PlaceOrderParams,
    SelfMatchingPolicy, SwapParams, TransactionBuilder, TxError,
};
use tide_wallet::{
    select_exact_input, select_fee_input, select_native_input, AuthorizationContext, BuildPlan,
    CoinInventory, Holdings, WalletResult,
};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

/// How a triggered order reaches the venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStyle {
    /// Exact-in market swap.
    #[default]
    Swap,
    /// Limit order at the trigger price.
    Limit,
}

/// Coordinator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    pub price_poll_ms: u64,
    pub inventory_poll_ms: u64,
    pub slippage_bps: u16,
    pub execution_style: ExecutionStyle,
    /// Execute orders as soon as they trigger.
    pub auto_execute: bool,
    /// Native-gas base units never spent as swap input.
    pub gas_reserve: u64,
    /// Symbol of the protocol fee token.
    pub fee_asset: String,
    /// Fee coin attached to each swap, in human units. Unused fee is
    /// returned with the swap outputs.
    pub fee_budget: Decimal,
    pub restriction: OrderRestriction,
    pub self_matching: SelfMatchingPolicy,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            price_poll_ms: 3_000,
            inventory_poll_ms: 12_000,
            slippage_bps: 50,
            execution_style: ExecutionStyle::Swap,
            auto_execute: true,
            gas_reserve: 100_000_000,
            fee_asset: "DEEP".to_string(),
            fee_budget: Decimal::ONE,
            restriction: OrderRestriction::NoRestriction,
            self_matching: SelfMatchingPolicy::CancelTaker,
        }
    }
}

/// Collaborators of the coordinator.
#[derive(Clone)]
pub struct CoordinatorDeps {
    pub registry: Arc<PoolRegistry>,
    pub inventory: Arc<CoinInventory>,
    pub builder: Arc<TransactionBuilder>,
    pub signer: DynSigner,
    pub price_feed: DynPriceFeed,
    pub clock: Arc<dyn Clock>,
}

/// Confirmed swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapExecution {
    pub receipt: SubmitReceipt,
    pub input_amount: u64,
    pub min_output: u64,
}

/// Confirmed limit order placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedOrder {
    pub receipt: SubmitReceipt,
    pub client_order_id: u64,
    pub price_ticks: u64,
    pub quantity_units: u64,
}

type AuthKey = (Address, ObjectId);

/// Count a build refused before anything reached the signer. Failures of
/// the collaborators themselves (price feed, coin query) are not refusals.
fn note_refusal(kind: ErrorKind) {
    if kind.is_pre_build() {
        Metrics::build_refused(&kind.to_string());
    }
}

/// Removes an order from the in-flight set when dropped, including when
/// the executing future is cancelled.
struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<OrderId>>,
    id: OrderId,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set.lock().remove(&self.id);
    }
}

pub struct ExecutionCoordinator {
    config: CoordinatorConfig,
    owner: Address,
    registry: Arc<PoolRegistry>,
    inventory: Arc<CoinInventory>,
    builder: Arc<TransactionBuilder>,
    signer: DynSigner,
    price_feed: DynPriceFeed,
    clock: Arc<dyn Clock>,
    store: Mutex<OrderLifecycleStore>,
    auth_sessions: SessionStore<AuthKey, AuthorizationContext>,
    last_prices: Mutex<HashMap<PairKey, Price>>,
    in_flight: Mutex<HashSet<OrderId>>,
}

impl ExecutionCoordinator {
    pub fn new(
        config: CoordinatorConfig,
        owner: Address,
        deps: CoordinatorDeps,
        auth_sessions: SessionStore<AuthKey, AuthorizationContext>,
    ) -> Self {
        Self {
            config,
            owner,
            registry: deps.registry,
            inventory: deps.inventory,
            builder: deps.builder,
            signer: deps.signer,
            price_feed: deps.price_feed,
            clock: deps.clock,
            store: Mutex::new(OrderLifecycleStore::new()),
            auth_sessions,
            last_prices: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    // ---- order intake ----

    /// Pool for an order pair. The pair must use the pool's orientation,
    /// since the trigger price is quote per base.
    fn require_pool(&self, pair: &PairKey) -> ExecutorResult<Pool> {
        if let Some(pool) = self.registry.pool(pair) {
            return Ok(pool);
        }
        if self.registry.pool(&pair.reversed()).is_some() {
            return Err(ExecutorError::InvalidInput(format!(
                "pair {pair} is quoted as {}",
                pair.reversed()
            )));
        }
        Err(RegistryError::PoolNotFound(pair.base().to_string(), pair.quote().to_string()).into())
    }

    /// Validate and store a new conditional order.
    pub fn create_order(&self, new: NewOrder) -> ExecutorResult<Order> {
        self.require_pool(&new.pair)?;
        let now = self.clock.now_ms();
        let order = {
            let mut store = self.store.lock();
            let order = store.create(new, now)?;
            Metrics::live_orders(store.live_count());
            order
        };
        Metrics::order_created(&order.kind.to_string(), &order.side.to_string());
        Ok(order)
    }

    /// Local cancel. A pending or triggered order stops being evaluated or
    /// executed; nothing is sent to the venue.
    pub fn cancel_order(&self, id: &OrderId) -> ExecutorResult<CancelOutcome> {
        let (outcome, from) = {
            let mut store = self.store.lock();
            let from = store
                .get(id)
                .map(|o| o.status)
                .ok_or_else(|| OrderError::NotFound(id.clone()))?;
            let outcome = store.cancel(id)?;
            Metrics::live_orders(store.live_count());
            (outcome, from)
        };
        if outcome == CancelOutcome::Cancelled {
            Metrics::order_cancelled(&from.to_string());
        }
        Ok(outcome)
    }

    pub fn get_order(&self, id: &OrderId) -> Option<Order> {
        self.store.lock().get(id).cloned()
    }

    pub fn list_orders(&self) -> Vec<Order> {
        self.store.lock().list().to_vec()
    }

    pub fn live_orders(&self) -> Vec<Order> {
        self.store.lock().live().into_iter().cloned().collect()
    }

    /// Last price seen for `pair` by any poll.
    pub fn last_price(&self, pair: &PairKey) -> Option<Price> {
        self.last_prices.lock().get(pair).copied()
    }

    // ---- evaluation ----

    /// One price poll and evaluation pass over every pending order.
    ///
    /// Orders that fire are executed sequentially when `auto_execute` is
    /// set. An execution failure is logged and leaves the order triggered.
    pub async fn evaluate_tick(&self) -> ExecutorResult<Vec<Transition>> {
        let pairs = self.store.lock().pending_pairs();
        if pairs.is_empty() {
            trace!("No pending orders, skipping price poll");
            return Ok(Vec::new());
        }

        let prices = match self.price_feed.get_prices(pairs).await {
            Ok(prices) => {
                Metrics::price_poll(true);
                prices
            }
            Err(e) => {
                Metrics::price_poll(false);
                return Err(e);
            }
        };
        self.last_prices
            .lock()
            .extend(prices.iter().map(|(k, v)| (k.clone(), *v)));

        let now = self.clock.now_ms();
        let transitions = {
            let mut store = self.store.lock();
            let transitions = store.evaluate_pass(&prices, now);
            Metrics::live_orders(store.live_count());
            transitions
        };
        for t in &transitions {
            Metrics::order_triggered(&t.kind.to_string(), &t.side.to_string());
        }

        if self.config.auto_execute {
            for t in &transitions {
                if let Err(e) = self.execute_order(&t.order_id).await {
                    let kind = e.kind();
                    if kind.is_recoverable() {
                        warn!(
                            order_id = %t.order_id,
                            error = %e,
                            %kind,
                            "Submission failed, order stays triggered for a retry"
                        );
                    } else {
                        error!(
                            order_id = %t.order_id,
                            error = %e,
                            %kind,
                            "Triggered order cannot be executed as built"
                        );
                    }
                }
            }
        }
        Ok(transitions)
    }

    // ---- execution ----

    /// Execute a triggered order and record the confirmed fill.
    ///
    /// On any failure the order stays triggered and can be executed again.
    pub async fn execute_order(&self, id: &OrderId) -> ExecutorResult<Order> {
        let order = self
            .get_order(id)
            .ok_or_else(|| OrderError::NotFound(id.clone()))?;
        if order.status != OrderStatus::Triggered {
            return Err(OrderError::InvalidTransition {
                id: id.clone(),
                from: order.status,
                to: OrderStatus::Filled,
            }
            .into());
        }
        if !self.in_flight.lock().insert(id.clone()) {
            return Err(ExecutorError::AlreadyExecuting(id.clone()));
        }
        let _guard = InFlightGuard {
            set: &self.in_flight,
            id: id.clone(),
        };

        let receipt = match self.config.execution_style {
            ExecutionStyle::Swap => self.execute_as_swap(&order).await?,
            ExecutionStyle::Limit => {
                let pool = self.require_pool(&order.pair)?;
                self.place_limit(pool, order.side, order.trigger_price, order.quantity)
                    .await?
                    .receipt
            }
        };

        let filled = {
            let mut store = self.store.lock();
            let filled = store.confirm_filled(id, &receipt.digest, receipt.venue_order_id)?;
            Metrics::live_orders(store.live_count());
            filled
        };
        Ok(filled)
    }

    async fn execute_as_swap(&self, order: &Order) -> ExecutorResult<SubmitReceipt> {
        let (input, output) = match order.side {
            OrderSide::Sell => (order.pair.base(), order.pair.quote()),
            OrderSide::Buy => (order.pair.quote(), order.pair.base()),
        };
        let resolved = self.registry.resolve_pool(input, output)?;
        let price = self.current_price(&order.pair).await?;
        let input_units = match order.side {
            OrderSide::Sell => to_base_units(order.quantity.inner(), resolved.input.decimals)?,
            OrderSide::Buy => {
                let notional = order.quantity.notional(price).ok_or_else(|| {
                    ExecutorError::InvalidInput(format!(
                        "notional of {} at {price} overflows",
                        order.quantity
                    ))
                })?;
                to_base_units(notional, resolved.input.decimals)?
            }
        };
        if input_units == 0 {
            return Err(ExecutorError::InvalidInput(format!(
                "order {} converts to zero {} units",
                order.id, resolved.input.symbol
            )));
        }
        let built = self
            .build_swap(&resolved, input_units, price, self.config.slippage_bps)
            .await
            .inspect_err(|e| note_refusal(e.kind()))?;
        info!(
            order_id = %order.id,
            input = built.input_amount,
            min_output = built.min_output,
            "Executing triggered order as swap"
        );
        self.submit("swap", built.script, None).await
    }

    /// Immediate exact-in swap of `amount` (human units of the input asset).
    pub async fn swap(
        &self,
        input_symbol: &str,
        output_symbol: &str,
        amount: Size,
        slippage_bps: Option<u16>,
    ) -> ExecutorResult<SwapExecution> {
        if !amount.is_positive() {
            return Err(ExecutorError::InvalidInput(format!(
                "swap amount must be positive, got {amount}"
            )));
        }
        let resolved = self.registry.resolve_pool(input_symbol, output_symbol)?;
        let input_units = to_base_units(amount.inner(), resolved.input.decimals)?;
        if input_units == 0 {
            return Err(ExecutorError::InvalidInput(format!(
                "{amount} {} is below one base unit",
                resolved.input.symbol
            )));
        }
        let price = self.current_price(&resolved.pool.pair_key()).await?;
        let built = self
            .build_swap(
                &resolved,
                input_units,
                price,
                slippage_bps.unwrap_or(self.config.slippage_bps),
            )
            .await
            .inspect_err(|e| note_refusal(e.kind()))?;
        let (input_amount, min_output) = (built.input_amount, built.min_output);
        let receipt = self.submit("swap", built.script, None).await?;
        Ok(SwapExecution {
            receipt,
            input_amount,
            min_output,
        })
    }

    /// Immediate limit order on `pair` at `price`.
    pub async fn place_limit_order(
        &self,
        pair: &PairKey,
        side: OrderSide,
        price: Price,
        quantity: Size,
    ) -> ExecutorResult<PlacedOrder> {
        let pool = self.require_pool(pair)?;
        self.place_limit(pool, side, price, quantity).await
    }

    async fn place_limit(
        &self,
        pool: Pool,
        side: OrderSide,
        price: Price,
        quantity: Size,
    ) -> ExecutorResult<PlacedOrder> {
        let context = self
            .authorization(&pool)
            .await
            .inspect_err(|e| note_refusal(e.kind()))?;
        let built = self
            .builder
            .place_order(
                &context,
                &PlaceOrderParams {
                    pool,
                    side,
                    price,
                    quantity,
                    restriction: self.config.restriction,
                    self_matching: self.config.self_matching,
                },
            )
            .inspect_err(|e| note_refusal(e.kind()))?;
        let (client_order_id, price_ticks, quantity_units) =
            (built.client_order_id, built.price_ticks, built.quantity_units);
        let receipt = self
            .submit("place_order", built.script, Some((self.owner, context.pool_id)))
            .await?;
        Ok(PlacedOrder {
            receipt,
            client_order_id,
            price_ticks,
            quantity_units,
        })
    }

    /// Cancel a placed order on the venue. The local status is unchanged;
    /// the cancel digest is recorded on the order.
    pub async fn cancel_on_venue(&self, id: &OrderId) -> ExecutorResult<SubmitReceipt> {
        let order = self
            .get_order(id)
            .ok_or_else(|| OrderError::NotFound(id.clone()))?;
        if order.on_chain_order_id.is_none() {
            return Err(TxError::OrderNotOnChain(order.id).into());
        }
        let pool = self.require_pool(&order.pair)?;
        let context = self.authorization(&pool).await?;
        let script = self.builder.cancel_order(&context, &pool, &order)?;
        let receipt = self
            .submit("cancel_order", script, Some((self.owner, context.pool_id)))
            .await?;
        self.store.lock().record_venue_cancel(id, &receipt.digest)?;
        Ok(receipt)
    }

    /// Mint and submit a trade capability for `pair`. The next authorized
    /// operation looks authorization up again.
    pub async fn mint_trade_capability(
        &self,
        pair: &PairKey,
        balance_manager: SharedObjectRef,
    ) -> ExecutorResult<SubmitReceipt> {
        let pool = self.require_pool(pair)?;
        let script = self
            .builder
            .auth()
            .mint_trade_capability(self.owner, balance_manager, &pool)?;
        self.submit("mint_trade_cap", script, Some((self.owner, pool.id())))
            .await
    }

    // ---- inventory ----

    /// Refresh holdings of every configured asset. Returns how many assets
    /// were refreshed; the last failure is returned after trying them all.
    pub async fn refresh_inventory(&self) -> ExecutorResult<usize> {
        let mut assets: Vec<Asset> = Vec::new();
        let mut seen = HashSet::new();
        let fee_asset = self.registry.asset(&self.config.fee_asset);
        let pool_assets = self
            .registry
            .list_pools()
            .into_iter()
            .flat_map(|p| [p.base, p.quote]);
        for asset in pool_assets.chain(fee_asset) {
            if seen.insert(asset.type_tag.canonical()) {
                assets.push(asset);
            }
        }

        let mut refreshed = 0;
        let mut last_error = None;
        for asset in &assets {
            match self.inventory.refresh(self.owner, asset).await {
                Ok(_) => refreshed += 1,
                Err(e) => {
                    warn!(asset = %asset.symbol, error = %e, "Inventory refresh failed");
                    last_error = Some(e);
                }
            }
        }
        Metrics::inventory_refresh(last_error.is_none());
        let purged = self.auth_sessions.purge_expired();
        if purged > 0 {
            debug!(purged, "Idle authorization sessions purged");
        }
        match last_error {
            Some(e) => Err(e.into()),
            None => Ok(refreshed),
        }
    }

    // ---- helpers ----

    async fn authorization(&self, pool: &Pool) -> ExecutorResult<AuthorizationContext> {
        let key = (self.owner, pool.id());
        if let Some(context) = self.auth_sessions.get(&key) {
            return Ok(context);
        }
        let context = self
            .builder
            .auth()
            .ensure_authorization(self.owner, pool)
            .await?;
        self.auth_sessions.insert(key, context.clone());
        Ok(context)
    }

    /// Fresh price for `pair`, falling back to the last polled one.
    async fn current_price(&self, pair: &PairKey) -> ExecutorResult<Price> {
        match self.price_feed.get_prices(vec![pair.clone()]).await {
            Ok(prices) => {
                if let Some(price) = prices.get(pair).copied() {
                    self.last_prices.lock().insert(pair.clone(), price);
                    return Ok(price);
                }
            }
            Err(e) => warn!(%pair, error = %e, "Price fetch failed, using last known price"),
        }
        self.last_price(pair)
            .ok_or_else(|| ExecutorError::NoPrice(pair.clone()))
    }

    fn plan_input(&self, asset: &Asset, holdings: &Holdings, required: u64) -> WalletResult<BuildPlan> {
        if asset.is_native_gas() {
            select_native_input(holdings, required, self.config.gas_reserve)
        } else {
            select_exact_input(holdings, required)
        }
    }

    async fn build_swap(
        &self,
        resolved: &ResolvedPool,
        input_units: u64,
        price: Price,
        slippage_bps: u16,
    ) -> ExecutorResult<BuiltSwap> {
        let builder_config = self.builder.config();
        let estimated = estimate_output(
            input_units,
            &resolved.input,
            &resolved.output,
            price.inner(),
            resolved.is_base_to_quote,
        )?;
        let min_out = if !builder_config.mode.is_production() && builder_config.allow_zero_min_output {
            0
        } else {
            min_output(estimated, slippage_bps)?
        };

        let fee_asset = self.registry.require_asset(&self.config.fee_asset)?;
        let fee_units = to_base_units(self.config.fee_budget, fee_asset.decimals)?;
        let input_holdings = self.inventory.query(self.owner, &resolved.input).await?;
        let shares_asset = fee_asset.type_tag.canonical() == resolved.input.type_tag.canonical();

        let (input_plan, fee) = if shares_asset && fee_units > 0 {
            let total = input_units
                .checked_add(fee_units)
                .ok_or_else(|| ExecutorError::InvalidInput("input plus fee overflows".into()))?;
            (
                self.plan_input(&resolved.input, &input_holdings, total)?,
                FeeInput::FromInput { amount: fee_units },
            )
        } else {
            let input_plan = self.plan_input(&resolved.input, &input_holdings, input_units)?;
            let fee_plan = if fee_units > 0 && fee_asset.is_native_gas() {
                let gas = self.inventory.query(self.owner, &fee_asset).await?;
                self.plan_input(&fee_asset, &gas, fee_units)?
            } else {
                let fee_holdings = self.inventory.query(self.owner, &fee_asset).await?;
                select_fee_input(&fee_holdings, fee_units, builder_config.zero_fee_allowed())?
            };
            (input_plan, FeeInput::Plan(fee_plan))
        };

        debug!(
            pool = %resolved.pool.pair_key(),
            %price,
            estimated,
            min_output = min_out,
            fee = fee_units,
            "Swap planned"
        );
        Ok(self.builder.swap_exact_in(&SwapParams {
            owner: self.owner,
            pool: resolved.pool.clone(),
            is_base_to_quote: resolved.is_base_to_quote,
            input_amount: input_units,
            min_output: min_out,
            input_plan,
            fee_asset,
            fee,
        })?)
    }

    /// Hand a finished script to the signer.
    ///
    /// Holdings are invalidated unless the signer refused outright, since a
    /// network failure may still have landed. The same goes for the cached
    /// authorization under `auth_key`: a landed script bumps the trade
    /// capability version.
    async fn submit(
        &self,
        op: &'static str,
        script: LedgerTransactionScript,
        auth_key: Option<AuthKey>,
    ) -> ExecutorResult<SubmitReceipt> {
        let script_id = script.id();
        let started = Instant::now();
        let result = self.signer.sign_and_submit(script).await;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        match result {
            Ok(receipt) => {
                Metrics::submission(op, "ok", latency_ms);
                self.invalidate_after_submission(auth_key.as_ref());
                info!(op, script_id, digest = %receipt.digest, "Submission confirmed");
                Ok(receipt)
            }
            Err(e) => {
                Metrics::submission(op, e.label(), latency_ms);
                if !matches!(e, SignerError::Rejected(_)) {
                    self.invalidate_after_submission(auth_key.as_ref());
                }
                warn!(op, script_id, error = %e, "Submission failed");
                Err(e.into())
            }
        }
    }

    fn invalidate_after_submission(&self, auth_key: Option<&AuthKey>) {
        self.inventory.invalidate_owner(self.owner);
        if let Some(key) = auth_key {
            self.auth_sessions.remove(key);
        }
    }

    // ---- periodic tasks ----

    /// Start the price and inventory tasks.
    pub fn spawn(self: Arc<Self>, token: CancellationToken) -> CoordinatorHandle {
        let price_task = tokio::spawn(Arc::clone(&self).run_price_loop(token.clone()));
        let inventory_task = tokio::spawn(Arc::clone(&self).run_inventory_loop(token.clone()));
        CoordinatorHandle {
            token,
            tasks: vec![price_task, inventory_task],
        }
    }

    async fn run_price_loop(self: Arc<Self>, token: CancellationToken) {
        let mut ticker = interval(Duration::from_millis(self.config.price_poll_ms.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(interval_ms = self.config.price_poll_ms, "Price task started");

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => break,
                        result = self.evaluate_tick() => match result {
                            Ok(transitions) if !transitions.is_empty() => {
                                info!(count = transitions.len(), "Orders triggered");
                            }
                            Ok(_) => {}
                            Err(e) => warn!(error = %e, "Evaluation tick failed"),
                        },
                    }
                }
            }
        }
        info!("Price task stopped");
    }

    async fn run_inventory_loop(self: Arc<Self>, token: CancellationToken) {
        let mut ticker = interval(Duration::from_millis(self.config.inventory_poll_ms.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(interval_ms = self.config.inventory_poll_ms, "Inventory task started");

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => break,
                        result = self.refresh_inventory() => {
                            if let Err(e) = result {
                                warn!(error = %e, "Inventory refresh tick failed");
                            }
                        }
                    }
                }
            }
        }
        info!("Inventory task stopped");
    }
}

/// Running coordinator tasks.
pub struct CoordinatorHandle {
    token: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl CoordinatorHandle {
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Cancel both tasks and wait for them. In-flight submissions are
    /// dropped; their orders stay triggered.
    pub async fn shutdown(self) {
        self.token.cancel();
        for task in self.tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "Coordinator task ended abnormally");
            }
        }
    }
}
