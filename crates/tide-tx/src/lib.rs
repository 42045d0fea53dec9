//! Transaction assembly for tide.
//!
//! Builds ledger scripts for exact-in swaps, limit order placement and
//! cancellation, with slippage-protected minimum outputs and per-key
//! monotonic client order ids.

pub mod builder;
pub mod client_order_id;
pub mod error;
pub mod policy;
pub mod slippage;

pub use builder::{
    BuilderConfig, BuiltOrder, BuiltSwap, FeeInput, PlaceOrderParams, SwapParams,
    TransactionBuilder, CLOCK_OBJECT_ID, DEFAULT_ORDER_EXPIRY_MS, POOL_MODULE,
};
pub use client_order_id::ClientOrderIdGenerator;
pub use error::{TxError, TxResult};
pub use policy::{BuildMode, OrderRestriction, SelfMatchingPolicy};
pub use slippage::{estimate_output, min_output, BPS_DENOMINATOR};
