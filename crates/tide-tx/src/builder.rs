//! Transaction builder.
//!
//! Assembles ledger scripts for the three venue operations: exact-in swap,
//! limit order placement and order cancellation. Inputs are fully resolved
//! (pool, authorization, build plans); every pre-build check runs before the
//! first command is emitted, so a script is never returned for a request
//! that is known to fail.

use crate::client_order_id::ClientOrderIdGenerator;
use crate::error::{TxError, TxResult};
use crate::policy::{BuildMode, OrderRestriction, SelfMatchingPolicy};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tide_core::{
    floor_to_multiple, to_base_units, to_ticks, Address, Argument, Asset, CallTarget, Clock,
    LedgerTransactionScript, ObjectArg, ObjectId, Order, OrderSide, OutputKind, Pool, Price,
    PureArg, ScriptBuilder, SharedObjectRef, Size, TypeTag,
};
use tide_wallet::{AuthorizationContext, AuthorizationManager, BuildPlan};
use tracing::debug;

/// Venue module holding pool entry points.
pub const POOL_MODULE: &str = "pool";

/// Shared clock object of the ledger.
pub const CLOCK_OBJECT_ID: ObjectId = ObjectId::from_low_byte(6);

/// Default order validity window (24 h).
pub const DEFAULT_ORDER_EXPIRY_MS: u64 = 24 * 60 * 60 * 1000;

/// Builder settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderConfig {
    pub mode: BuildMode,
    /// Allow a zero-fee placeholder even in production.
    pub allow_zero_fee: bool,
    /// Allow a zero minimum output even in production.
    pub allow_zero_min_output: bool,
    pub order_expiry_ms: u64,
    /// Pay venue fees in the fee token rather than the traded assets.
    pub pay_with_fee_token: bool,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            mode: BuildMode::Test,
            allow_zero_fee: false,
            allow_zero_min_output: false,
            order_expiry_ms: DEFAULT_ORDER_EXPIRY_MS,
            pay_with_fee_token: true,
        }
    }
}

impl BuilderConfig {
    /// Whether fee selection may fall back to a zero placeholder.
    pub fn zero_fee_allowed(&self) -> bool {
        self.allow_zero_fee || !self.mode.is_production()
    }
}

/// Where the protocol fee coin comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeeInput {
    /// Separate coin plan in the fee asset.
    Plan(BuildPlan),
    /// Input and fee share an asset: the input plan covers both and the fee
    /// is split alongside the input amount.
    FromInput { amount: u64 },
}

/// Fully resolved exact-in swap.
#[derive(Debug, Clone)]
pub struct SwapParams {
    pub owner: Address,
    pub pool: Pool,
    pub is_base_to_quote: bool,
    /// Base units of the input asset.
    pub input_amount: u64,
    /// Base units of the output asset.
    pub min_output: u64,
    pub input_plan: BuildPlan,
    pub fee_asset: Asset,
    pub fee: FeeInput,
}

/// Swap script plus the amounts it commits to.
#[derive(Debug, Clone)]
pub struct BuiltSwap {
    pub script: LedgerTransactionScript,
    pub input_amount: u64,
    pub min_output: u64,
}

/// Limit order request in human units.
#[derive(Debug, Clone)]
pub struct PlaceOrderParams {
    pub pool: Pool,
    pub side: OrderSide,
    pub price: Price,
    pub quantity: Size,
    pub restriction: OrderRestriction,
    pub self_matching: SelfMatchingPolicy,
}

/// Placement script plus the converted values it carries.
#[derive(Debug, Clone)]
pub struct BuiltOrder {
    pub script: LedgerTransactionScript,
    pub client_order_id: u64,
    pub price_ticks: u64,
    pub quantity_units: u64,
    pub expire_timestamp_ms: u64,
}

/// Assembles venue scripts.
pub struct TransactionBuilder {
    config: BuilderConfig,
    auth: Arc<AuthorizationManager>,
    clock: Arc<dyn Clock>,
    client_ids: ClientOrderIdGenerator<Arc<dyn Clock>>,
    clock_object: SharedObjectRef,
}

impl TransactionBuilder {
    pub fn new(config: BuilderConfig, auth: Arc<AuthorizationManager>, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            auth,
            client_ids: ClientOrderIdGenerator::new(Arc::clone(&clock)),
            clock,
            clock_object: SharedObjectRef::new(CLOCK_OBJECT_ID, 1, false),
        }
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    pub fn auth(&self) -> &AuthorizationManager {
        &self.auth
    }

    fn pool_target(pool: &Pool, function: &str) -> CallTarget {
        CallTarget::new(pool.package, POOL_MODULE, function)
    }

    fn pool_arg(sb: &mut ScriptBuilder, pool: &Pool) -> TxResult<Argument> {
        Ok(sb.object(ObjectArg::Shared(SharedObjectRef {
            mutable: true,
            ..pool.object
        }))?)
    }

    fn clock_arg(&self, sb: &mut ScriptBuilder) -> TxResult<Argument> {
        Ok(sb.object(ObjectArg::Shared(self.clock_object))?)
    }

    /// Emit the commands that realize `plan` and split `amounts` from it.
    fn materialize(
        sb: &mut ScriptBuilder,
        plan: &BuildPlan,
        amounts: &[u64],
        coin_type: &TypeTag,
    ) -> TxResult<Vec<Argument>> {
        let source = match plan {
            BuildPlan::SplitSingle { source, .. } => sb.object(ObjectArg::Owned(source.clone()))?,
            BuildPlan::MergeThenSplit {
                primary, sources, ..
            } => {
                let primary = sb.object(ObjectArg::Owned(primary.clone()))?;
                let mut merged = Vec::with_capacity(sources.len());
                for src in sources {
                    merged.push(sb.object(ObjectArg::Owned(src.clone()))?);
                }
                if !merged.is_empty() {
                    sb.merge_coins(primary, merged)?;
                }
                primary
            }
            BuildPlan::SplitFromGas { .. } => Argument::GasCoin,
            BuildPlan::ZeroPlaceholder => {
                return Ok(sb.move_call(
                    CallTarget::new(ObjectId::from_low_byte(2), "coin", "zero"),
                    vec![coin_type.clone()],
                    vec![],
                    vec![OutputKind::Object],
                )?);
            }
        };
        Ok(sb.split_coins(source, amounts)?)
    }

    fn validate_swap(&self, params: &SwapParams) -> TxResult<()> {
        if params.input_amount == 0 {
            return Err(TxError::InvalidInput("swap input must be positive".into()));
        }
        if params.min_output == 0
            && self.config.mode.is_production()
            && !self.config.allow_zero_min_output
        {
            return Err(TxError::ZeroMinOutput);
        }
        match &params.fee {
            FeeInput::Plan(plan) => {
                if plan.is_placeholder() && !self.config.zero_fee_allowed() {
                    return Err(TxError::ZeroFeePlaceholder);
                }
                if params.input_plan.amount() != params.input_amount {
                    return Err(TxError::PlanMismatch(format!(
                        "input plan yields {} but swap needs {}",
                        params.input_plan.amount(),
                        params.input_amount
                    )));
                }
            }
            FeeInput::FromInput { amount } => {
                let total = params.input_amount.checked_add(*amount).ok_or_else(|| {
                    TxError::InvalidInput("input plus fee overflows".into())
                })?;
                if params.input_plan.amount() != total {
                    return Err(TxError::PlanMismatch(format!(
                        "input plan yields {} but swap plus fee needs {total}",
                        params.input_plan.amount()
                    )));
                }
            }
        }
        if params.input_plan.is_placeholder() {
            return Err(TxError::PlanMismatch("swap input cannot be a placeholder".into()));
        }
        Ok(())
    }

    /// Exact-in swap. All three venue outputs (base, quote and fee
    /// residuals) are transferred back to the owner.
    pub fn swap_exact_in(&self, params: &SwapParams) -> TxResult<BuiltSwap> {
        self.validate_swap(params)?;

        let pool = &params.pool;
        let input_type = if params.is_base_to_quote {
            &pool.base.type_tag
        } else {
            &pool.quote.type_tag
        };
        let function = if params.is_base_to_quote {
            "swap_exact_base_for_quote"
        } else {
            "swap_exact_quote_for_base"
        };

        let mut sb = ScriptBuilder::new(params.owner);
        let (input_coin, fee_coin) = match &params.fee {
            FeeInput::Plan(plan) => {
                let input = Self::materialize(&mut sb, &params.input_plan, &[params.input_amount], input_type)?;
                let fee = Self::materialize(&mut sb, plan, &[plan.amount()], &params.fee_asset.type_tag)?;
                (first(&input)?, first(&fee)?)
            }
            FeeInput::FromInput { amount } => {
                let coins = Self::materialize(
                    &mut sb,
                    &params.input_plan,
                    &[params.input_amount, *amount],
                    input_type,
                )?;
                match coins.as_slice() {
                    [input, fee] => (*input, *fee),
                    _ => return Err(TxError::PlanMismatch("expected two split coins".into())),
                }
            }
        };

        let pool_arg = Self::pool_arg(&mut sb, pool)?;
        let min_out = sb.pure(PureArg::U64(params.min_output))?;
        let clock = self.clock_arg(&mut sb)?;
        let outputs = sb.move_call(
            Self::pool_target(pool, function),
            pool.type_args(),
            vec![pool_arg, input_coin, fee_coin, min_out, clock],
            vec![OutputKind::Object; 3],
        )?;
        sb.transfer_objects(outputs, params.owner)?;
        let script = sb.finish()?;

        debug!(
            pool = %pool.pair_key(),
            function,
            input = params.input_amount,
            min_output = params.min_output,
            "Swap script built"
        );
        Ok(BuiltSwap {
            script,
            input_amount: params.input_amount,
            min_output: params.min_output,
        })
    }

    /// Price in ticks floored to the pool tick size, quantity in base units
    /// floored to the lot size and checked against the minimum size.
    pub fn convert_order(&self, pool: &Pool, price: Price, quantity: Size) -> TxResult<(u64, u64)> {
        if !price.is_positive() {
            return Err(TxError::InvalidInput(format!("price must be positive, got {price}")));
        }
        if !quantity.is_positive() {
            return Err(TxError::InvalidInput(format!(
                "quantity must be positive, got {quantity}"
            )));
        }
        let ticks = floor_to_multiple(
            to_ticks(price.inner(), pool.price_tick_decimals()?)?,
            pool.tick_size,
        );
        if ticks == 0 {
            return Err(TxError::InvalidInput(format!(
                "price {price} is below one tick on {}",
                pool.pair_key()
            )));
        }
        let units = floor_to_multiple(
            to_base_units(quantity.inner(), pool.base.decimals)?,
            pool.lot_size,
        );
        if units == 0 || units < pool.min_size {
            return Err(TxError::InvalidInput(format!(
                "quantity {quantity} is below the minimum size of {}",
                pool.pair_key()
            )));
        }
        Ok((ticks, units))
    }

    /// Limit order placement. A fresh trade proof is generated inside the
    /// script.
    pub fn place_order(
        &self,
        context: &AuthorizationContext,
        params: &PlaceOrderParams,
    ) -> TxResult<BuiltOrder> {
        let pool = &params.pool;
        let (price_ticks, quantity_units) = self.convert_order(pool, params.price, params.quantity)?;
        if context.pool_id != pool.id() {
            return Err(TxError::PlanMismatch(format!(
                "authorization is for pool {}, order is for {}",
                context.pool_id,
                pool.id()
            )));
        }

        let client_order_id = self
            .client_ids
            .next(context.balance_manager.object_id, pool.id());
        let expire_timestamp_ms = self.clock.now_ms().saturating_add(self.config.order_expiry_ms);

        let mut sb = ScriptBuilder::new(context.owner);
        let proof = self.auth.generate_trade_proof(&mut sb, context)?;
        let pool_arg = Self::pool_arg(&mut sb, pool)?;
        let bm = sb.object(ObjectArg::Shared(context.balance_manager))?;
        let proof = sb.use_proof(proof)?;
        let args = vec![
            pool_arg,
            bm,
            proof,
            sb.pure(PureArg::U64(client_order_id))?,
            sb.pure(PureArg::U8(params.restriction.as_u8()))?,
            sb.pure(PureArg::U8(params.self_matching.as_u8()))?,
            sb.pure(PureArg::U64(price_ticks))?,
            sb.pure(PureArg::U64(quantity_units))?,
            sb.pure(PureArg::Bool(params.side.is_bid()))?,
            sb.pure(PureArg::Bool(self.config.pay_with_fee_token))?,
            sb.pure(PureArg::U64(expire_timestamp_ms))?,
            self.clock_arg(&mut sb)?,
        ];
        sb.move_call(
            Self::pool_target(pool, "place_limit_order"),
            pool.type_args(),
            args,
            vec![OutputKind::Value],
        )?;
        let script = sb.finish()?;

        debug!(
            pool = %pool.pair_key(),
            side = %params.side,
            client_order_id,
            price_ticks,
            quantity_units,
            "Place-order script built"
        );
        Ok(BuiltOrder {
            script,
            client_order_id,
            price_ticks,
            quantity_units,
            expire_timestamp_ms,
        })
    }

    /// Cancel a placed order. Fails with `OrderNotOnChain` when the order
    /// was only tracked locally.
    pub fn cancel_order(
        &self,
        context: &AuthorizationContext,
        pool: &Pool,
        order: &Order,
    ) -> TxResult<LedgerTransactionScript> {
        let venue_id = order
            .on_chain_order_id
            .ok_or_else(|| TxError::OrderNotOnChain(order.id.clone()))?;
        if context.pool_id != pool.id() {
            return Err(TxError::PlanMismatch(format!(
                "authorization is for pool {}, cancel is for {}",
                context.pool_id,
                pool.id()
            )));
        }

        let mut sb = ScriptBuilder::new(context.owner);
        let proof = self.auth.generate_trade_proof(&mut sb, context)?;
        let pool_arg = Self::pool_arg(&mut sb, pool)?;
        let bm = sb.object(ObjectArg::Shared(context.balance_manager))?;
        let proof = sb.use_proof(proof)?;
        let order_id = sb.pure(PureArg::U128(venue_id))?;
        let clock = self.clock_arg(&mut sb)?;
        sb.move_call(
            Self::pool_target(pool, "cancel_order"),
            pool.type_args(),
            vec![pool_arg, bm, proof, order_id, clock],
            vec![],
        )?;
        let script = sb.finish()?;
        debug!(order_id = %order.id, venue_order_id = venue_id, "Cancel script built");
        Ok(script)
    }
}

fn first(args: &[Argument]) -> TxResult<Argument> {
    args.first()
        .copied()
        .ok_or_else(|| TxError::PlanMismatch("plan produced no coin".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tide_core::{
        CallArg, Command, ErrorKind, FixedClock, NewOrder, ObjectRef, OrderId, OrderKind, PairKey,
    };
    use tide_wallet::MockAuthorizationLookup;

    const NOW: u64 = 1_700_000_000_000;

    fn sui() -> Asset {
        Asset::new("SUI", TypeTag::new("0x2::sui::SUI"), 9)
    }

    fn usdc() -> Asset {
        Asset::new("USDC", TypeTag::new("0xdba3::usdc::USDC"), 6)
    }

    fn deep() -> Asset {
        Asset::new("DEEP", TypeTag::new("0xdeeb::deep::DEEP"), 6)
    }

    fn owner() -> Address {
        "0xabc".parse().unwrap()
    }

    fn pool() -> Pool {
        Pool {
            object: SharedObjectRef::new(ObjectId::from_low_byte(0xaa), 389_750_322, true),
            base: sui(),
            quote: usdc(),
            tick_size: 1_000,
            lot_size: 100_000_000,
            min_size: 1_000_000_000,
            package: ObjectId::from_low_byte(0xdb),
        }
    }

    fn coin_ref(n: u8) -> ObjectRef {
        ObjectRef::new(ObjectId::from_low_byte(n), 5, format!("d{n}"))
    }

    fn context() -> AuthorizationContext {
        AuthorizationContext {
            owner: owner(),
            pool_id: pool().id(),
            balance_manager: SharedObjectRef::new(ObjectId::from_low_byte(0xb1), 9, true),
            trade_cap: coin_ref(0xc1),
        }
    }

    fn builder(config: BuilderConfig) -> TransactionBuilder {
        let auth = Arc::new(AuthorizationManager::new(
            Arc::new(MockAuthorizationLookup::new()),
            ObjectId::from_low_byte(0xdb),
        ));
        TransactionBuilder::new(config, auth, Arc::new(FixedClock::new(NOW)))
    }

    fn swap_params() -> SwapParams {
        SwapParams {
            owner: owner(),
            pool: pool(),
            is_base_to_quote: false,
            input_amount: 50,
            min_output: 14_000_000_000,
            input_plan: BuildPlan::MergeThenSplit {
                primary: coin_ref(2),
                sources: vec![coin_ref(1)],
                amount: 50,
            },
            fee_asset: deep(),
            fee: FeeInput::Plan(BuildPlan::SplitSingle {
                source: coin_ref(9),
                amount: 1_000,
            }),
        }
    }

    fn production() -> BuilderConfig {
        BuilderConfig {
            mode: BuildMode::Production,
            ..BuilderConfig::default()
        }
    }

    #[test]
    fn test_swap_routes_every_output() {
        let built = builder(BuilderConfig::default())
            .swap_exact_in(&swap_params())
            .unwrap();
        let script = built.script;
        let (idx, call) = script.find_call(POOL_MODULE, "swap_exact_quote_for_base").unwrap();
        match call {
            Command::MoveCall { args, type_args, .. } => {
                assert_eq!(args.len(), 5);
                assert_eq!(type_args, &pool().type_args());
            }
            _ => unreachable!(),
        }
        match script.commands().last().unwrap() {
            Command::TransferObjects { objects, .. } => {
                let idx = idx as u16;
                assert_eq!(
                    objects,
                    &vec![
                        Argument::NestedResult(idx, 0),
                        Argument::NestedResult(idx, 1),
                        Argument::NestedResult(idx, 2)
                    ]
                );
            }
            other => panic!("unexpected last command {other:?}"),
        }
    }

    #[test]
    fn test_swap_merges_before_split() {
        let script = builder(BuilderConfig::default())
            .swap_exact_in(&swap_params())
            .unwrap()
            .script;
        assert!(matches!(script.commands()[0], Command::MergeCoins { .. }));
        assert!(matches!(script.commands()[1], Command::SplitCoins { .. }));
    }

    #[test]
    fn test_swap_base_to_quote_function() {
        let mut params = swap_params();
        params.is_base_to_quote = true;
        params.input_plan = BuildPlan::SplitFromGas { amount: 50 };
        let script = builder(BuilderConfig::default())
            .swap_exact_in(&params)
            .unwrap()
            .script;
        assert!(script.find_call(POOL_MODULE, "swap_exact_base_for_quote").is_some());
        assert!(matches!(
            script.commands()[0],
            Command::SplitCoins {
                coin: Argument::GasCoin,
                ..
            }
        ));
    }

    #[test]
    fn test_min_output_is_pure_u64() {
        let script = builder(BuilderConfig::default())
            .swap_exact_in(&swap_params())
            .unwrap()
            .script;
        assert!(script
            .inputs()
            .iter()
            .any(|i| *i == CallArg::Pure(PureArg::U64(14_000_000_000))));
    }

    #[test]
    fn test_production_rejects_zero_min_output() {
        let mut params = swap_params();
        params.min_output = 0;
        let err = builder(production()).swap_exact_in(&params).unwrap_err();
        assert!(matches!(err, TxError::ZeroMinOutput));

        let relaxed = BuilderConfig {
            allow_zero_min_output: true,
            ..production()
        };
        assert!(builder(relaxed).swap_exact_in(&params).is_ok());
        assert!(builder(BuilderConfig::default()).swap_exact_in(&params).is_ok());
    }

    #[test]
    fn test_production_rejects_zero_fee_placeholder() {
        let mut params = swap_params();
        params.fee = FeeInput::Plan(BuildPlan::ZeroPlaceholder);
        let err = builder(production()).swap_exact_in(&params).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFeeToken);

        let script = builder(BuilderConfig::default())
            .swap_exact_in(&params)
            .unwrap()
            .script;
        assert!(script.find_call("coin", "zero").is_some());
    }

    #[test]
    fn test_fee_from_input_splits_two_coins() {
        let mut params = swap_params();
        params.input_plan = BuildPlan::SplitSingle {
            source: coin_ref(3),
            amount: 1_050,
        };
        params.fee = FeeInput::FromInput { amount: 1_000 };
        let script = builder(BuilderConfig::default())
            .swap_exact_in(&params)
            .unwrap()
            .script;
        match &script.commands()[0] {
            Command::SplitCoins { amounts, .. } => assert_eq!(amounts.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_plan_mismatch_is_internal() {
        let mut params = swap_params();
        params.input_amount = 51;
        let err = builder(BuilderConfig::default()).swap_exact_in(&params).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_convert_order_floors_to_tick_and_lot() {
        let b = builder(BuilderConfig::default());
        // 3.4567891 USDC/SUI at 6 tick decimals = 3_456_789, floored to tick 1000.
        let (ticks, units) = b
            .convert_order(&pool(), Price::new(dec!(3.4567891)), Size::new(dec!(1.25)))
            .unwrap();
        assert_eq!(ticks, 3_456_000);
        assert_eq!(units, 1_200_000_000);
    }

    #[test]
    fn test_convert_order_rejects_below_min_size() {
        let b = builder(BuilderConfig::default());
        let err = b
            .convert_order(&pool(), Price::new(dec!(3)), Size::new(dec!(0.5)))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(b
            .convert_order(&pool(), Price::ZERO, Size::new(dec!(2)))
            .is_err());
    }

    #[test]
    fn test_place_order_arguments() {
        let b = builder(BuilderConfig::default());
        let params = PlaceOrderParams {
            pool: pool(),
            side: OrderSide::Buy,
            price: Price::new(dec!(3.5)),
            quantity: Size::new(dec!(2)),
            restriction: OrderRestriction::default(),
            self_matching: SelfMatchingPolicy::default(),
        };
        let built = b.place_order(&context(), &params).unwrap();
        assert_eq!(built.price_ticks, 3_500_000);
        assert_eq!(built.quantity_units, 2_000_000_000);
        assert_eq!(built.expire_timestamp_ms, NOW + DEFAULT_ORDER_EXPIRY_MS);

        let script = &built.script;
        assert!(script
            .find_call("balance_manager", "generate_proof_as_trader")
            .is_some());
        let (_, call) = script.find_call(POOL_MODULE, "place_limit_order").unwrap();
        let Command::MoveCall { args, .. } = call else {
            unreachable!()
        };
        assert_eq!(args.len(), 12);
        assert_eq!(
            script.input(args[3]),
            Some(&CallArg::Pure(PureArg::U64(built.client_order_id)))
        );
        assert_eq!(script.input(args[5]), Some(&CallArg::Pure(PureArg::U8(1))));
        assert_eq!(script.input(args[8]), Some(&CallArg::Pure(PureArg::Bool(true))));
    }

    #[test]
    fn test_place_order_client_ids_unique() {
        let b = builder(BuilderConfig::default());
        let params = PlaceOrderParams {
            pool: pool(),
            side: OrderSide::Sell,
            price: Price::new(dec!(3.5)),
            quantity: Size::new(dec!(1)),
            restriction: OrderRestriction::PostOnly,
            self_matching: SelfMatchingPolicy::CancelTaker,
        };
        let a = b.place_order(&context(), &params).unwrap();
        let c = b.place_order(&context(), &params).unwrap();
        assert!(c.client_order_id > a.client_order_id);
        assert_ne!(a.script.id(), c.script.id());
    }

    fn local_order() -> Order {
        Order::from_new(
            OrderId::new(),
            NewOrder {
                pair: PairKey::new("SUI", "USDC"),
                side: OrderSide::Sell,
                kind: OrderKind::Limit,
                trigger_price: Price::new(dec!(4)),
                quantity: Size::new(dec!(1)),
            },
            NOW,
        )
    }

    #[test]
    fn test_cancel_requires_on_chain_id() {
        let b = builder(BuilderConfig::default());
        let err = b.cancel_order(&context(), &pool(), &local_order()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OrderNotOnChain);
    }

    #[test]
    fn test_cancel_uses_u128_order_id() {
        let b = builder(BuilderConfig::default());
        let mut order = local_order();
        order.on_chain_order_id = Some(170_141_183_460_469_231_731_687_303_715_884_105_727);
        let script = b.cancel_order(&context(), &pool(), &order).unwrap();
        assert!(script.find_call(POOL_MODULE, "cancel_order").is_some());
        assert!(script.inputs().iter().any(|i| matches!(
            i,
            CallArg::Pure(PureArg::U128(v)) if *v == order.on_chain_order_id.unwrap()
        )));
    }
}
