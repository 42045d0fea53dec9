//! Core domain types for the tide trading-intent engine.
//!
//! This crate provides the types shared by every other crate:
//! - `Price`, `Size`: human decimal quantities
//! - `units`: flooring conversion into ledger integer units
//! - `Asset`, `Pool`, `PairKey`: market configuration
//! - `Order`, `OrderStatus`: conditional order entity
//! - `ScriptBuilder`, `LedgerTransactionScript`: transaction script model

pub mod clock;
pub mod decimal;
pub mod error;
pub mod ids;
pub mod market;
pub mod order;
pub mod script;
pub mod units;

pub use clock::{Clock, FixedClock, SystemClock};
pub use decimal::{Price, Size};
pub use error::{CoreError, ErrorKind, Result};
pub use ids::{Address, ObjectId, ObjectRef, SharedObjectRef, TypeTag};
pub use market::{Asset, PairKey, Pool, FLOAT_SCALING_DECIMALS};
pub use order::{NewOrder, Order, OrderId, OrderKind, OrderSide, OrderStatus};
pub use script::{
    Argument, CallArg, CallTarget, Command, LedgerTransactionScript, ObjectArg, OutputKind,
    PureArg, ScriptBuilder, ScriptError, TradeProof,
};
pub use units::{floor_to_multiple, from_base_units, to_base_units, to_ticks};

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> =
    std::pin::Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;
