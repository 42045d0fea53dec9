//! Spendable-coin inventory and trading authorization for tide.
//!
//! - `CoinInventory`: TTL-cached holdings per owner and coin type
//! - `selection`: exact-amount build plans (split, merge-then-split, gas)
//! - `AuthorizationManager`: balance manager / trade capability lookup and
//!   per-script trade proofs

pub mod auth;
pub mod coin;
pub mod error;
pub mod inventory;
pub mod query;
pub mod selection;

pub use auth::{
    AuthorizationContext, AuthorizationLookup, AuthorizationManager, DynAuthorizationLookup,
    MockAuthorizationLookup, StaticAuthorizationLookup, TradeCapEntry, BALANCE_MANAGER_MODULE,
};
pub use coin::{CoinRecord, Holdings};
pub use error::{WalletError, WalletResult};
pub use inventory::{CoinInventory, DEFAULT_INVENTORY_TTL};
pub use query::{
    CoinQuery, DynCoinQuery, JsonRpcClient, MockCoinQuery, RpcAuthorizationLookup, RpcCoinQuery,
};
pub use selection::{select_exact_input, select_fee_input, select_native_input, BuildPlan};
