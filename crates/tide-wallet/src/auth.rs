//! Trading authorization: balance manager, trade capability, trade proof.
//!
//! The balance manager and trade capabilities are looked up, never created
//! implicitly. Minting a capability is a separate, explicit transaction whose
//! result is only trusted after it is looked up again.

use crate::error::{WalletError, WalletResult};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tide_core::{
    Address, BoxFuture, CallTarget, LedgerTransactionScript, ObjectArg, ObjectId, ObjectRef,
    OutputKind, Pool, ScriptBuilder, SharedObjectRef, TradeProof,
};
use tracing::{debug, info, warn};

/// Venue module holding balance-manager functions.
pub const BALANCE_MANAGER_MODULE: &str = "balance_manager";

/// Resolved authorization for one (owner, pool).
///
/// Holds object references only. Trade proofs are minted per script by
/// [`AuthorizationManager::generate_trade_proof`] and are never stored here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationContext {
    pub owner: Address,
    pub pool_id: ObjectId,
    pub balance_manager: SharedObjectRef,
    pub trade_cap: ObjectRef,
}

/// Looks up existing authorization objects.
pub trait AuthorizationLookup: Send + Sync {
    /// The owner's balance manager, if one exists.
    fn balance_manager(&self, owner: Address)
        -> BoxFuture<'_, WalletResult<Option<SharedObjectRef>>>;

    /// The trade capability of `balance_manager` for `pool`, if one exists.
    fn trade_cap(
        &self,
        owner: Address,
        balance_manager: ObjectId,
        pool: ObjectId,
    ) -> BoxFuture<'_, WalletResult<Option<ObjectRef>>>;
}

/// Arc wrapper for AuthorizationLookup trait objects.
pub type DynAuthorizationLookup = Arc<dyn AuthorizationLookup>;

/// Configured trade capability for one pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeCapEntry {
    pub pool_id: ObjectId,
    pub object: ObjectRef,
}

/// Authorization objects taken from configuration.
#[derive(Debug, Clone)]
pub struct StaticAuthorizationLookup {
    owner: Address,
    balance_manager: Option<SharedObjectRef>,
    trade_caps: HashMap<ObjectId, ObjectRef>,
}

impl StaticAuthorizationLookup {
    pub fn new(
        owner: Address,
        balance_manager: Option<SharedObjectRef>,
        trade_caps: impl IntoIterator<Item = TradeCapEntry>,
    ) -> Self {
        Self {
            owner,
            balance_manager,
            trade_caps: trade_caps
                .into_iter()
                .map(|e| (e.pool_id, e.object))
                .collect(),
        }
    }
}

impl AuthorizationLookup for StaticAuthorizationLookup {
    fn balance_manager(
        &self,
        owner: Address,
    ) -> BoxFuture<'_, WalletResult<Option<SharedObjectRef>>> {
        let found = if owner == self.owner {
            self.balance_manager
        } else {
            None
        };
        Box::pin(async move { Ok(found) })
    }

    fn trade_cap(
        &self,
        owner: Address,
        balance_manager: ObjectId,
        pool: ObjectId,
    ) -> BoxFuture<'_, WalletResult<Option<ObjectRef>>> {
        let bm_matches = self
            .balance_manager
            .is_some_and(|bm| bm.object_id == balance_manager);
        let found = if owner == self.owner && bm_matches {
            self.trade_caps.get(&pool).cloned()
        } else {
            None
        };
        Box::pin(async move { Ok(found) })
    }
}

/// Mock authorization lookup for testing.
#[derive(Debug, Default)]
pub struct MockAuthorizationLookup {
    balance_managers: Mutex<HashMap<Address, SharedObjectRef>>,
    trade_caps: Mutex<HashMap<(Address, ObjectId), ObjectRef>>,
    lookups: AtomicU64,
}

impl MockAuthorizationLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_balance_manager(&self, owner: Address, bm: SharedObjectRef) {
        self.balance_managers.lock().insert(owner, bm);
    }

    pub fn add_trade_cap(&self, owner: Address, pool: ObjectId, cap: ObjectRef) {
        self.trade_caps.lock().insert((owner, pool), cap);
    }

    pub fn remove_trade_cap(&self, owner: Address, pool: ObjectId) {
        self.trade_caps.lock().remove(&(owner, pool));
    }

    /// Total lookups served.
    pub fn lookup_count(&self) -> u64 {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl AuthorizationLookup for MockAuthorizationLookup {
    fn balance_manager(
        &self,
        owner: Address,
    ) -> BoxFuture<'_, WalletResult<Option<SharedObjectRef>>> {
        Box::pin(async move {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(self.balance_managers.lock().get(&owner).copied())
        })
    }

    fn trade_cap(
        &self,
        owner: Address,
        _balance_manager: ObjectId,
        pool: ObjectId,
    ) -> BoxFuture<'_, WalletResult<Option<ObjectRef>>> {
        Box::pin(async move {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(self.trade_caps.lock().get(&(owner, pool)).cloned())
        })
    }
}

/// Resolves authorization and emits the authorization calls of a script.
pub struct AuthorizationManager {
    lookup: DynAuthorizationLookup,
    package: ObjectId,
}

impl AuthorizationManager {
    pub fn new(lookup: DynAuthorizationLookup, package: ObjectId) -> Self {
        Self { lookup, package }
    }

    fn target(&self, function: &str) -> CallTarget {
        CallTarget::new(self.package, BALANCE_MANAGER_MODULE, function)
    }

    /// Look up the balance manager and trade capability for `owner` on `pool`.
    ///
    /// Never creates either object.
    pub async fn ensure_authorization(
        &self,
        owner: Address,
        pool: &Pool,
    ) -> WalletResult<AuthorizationContext> {
        let balance_manager = self.lookup.balance_manager(owner).await?.ok_or_else(|| {
            WalletError::AuthorizationMissing(format!("no balance manager for {owner}"))
        })?;

        let trade_cap = self
            .lookup
            .trade_cap(owner, balance_manager.object_id, pool.id())
            .await?
            .ok_or_else(|| {
                WalletError::AuthorizationMissing(format!(
                    "no trade capability for {} on pool {}",
                    balance_manager.object_id,
                    pool.pair_key()
                ))
            })?;

        debug!(
            %owner,
            pool = %pool.pair_key(),
            balance_manager = %balance_manager.object_id,
            trade_cap = %trade_cap.object_id,
            "Authorization resolved"
        );
        Ok(AuthorizationContext {
            owner,
            pool_id: pool.id(),
            balance_manager: SharedObjectRef {
                mutable: true,
                ..balance_manager
            },
            trade_cap,
        })
    }

    /// Build the one-shot script minting a trade capability and sending it
    /// to `owner`.
    ///
    /// Submitting it does not make the capability usable by itself: callers
    /// must run [`ensure_authorization`](Self::ensure_authorization) again.
    pub fn mint_trade_capability(
        &self,
        owner: Address,
        balance_manager: SharedObjectRef,
        pool: &Pool,
    ) -> WalletResult<LedgerTransactionScript> {
        let mut sb = ScriptBuilder::new(owner);
        let bm = sb.object(ObjectArg::Shared(SharedObjectRef {
            mutable: true,
            ..balance_manager
        }))?;
        let cap = sb.move_call(
            self.target("mint_trade_cap"),
            vec![],
            vec![bm],
            vec![OutputKind::Object],
        )?;
        sb.transfer_objects(cap, owner)?;
        let script = sb.finish()?;
        info!(
            %owner,
            pool = %pool.pair_key(),
            balance_manager = %balance_manager.object_id,
            "Trade capability mint script built"
        );
        Ok(script)
    }

    /// Emit a fresh trade proof into the script under construction.
    pub fn generate_trade_proof(
        &self,
        sb: &mut ScriptBuilder,
        context: &AuthorizationContext,
    ) -> WalletResult<TradeProof> {
        if sb.sender() != context.owner {
            warn!(
                sender = %sb.sender(),
                owner = %context.owner,
                "Trade proof requested for a script with a different sender"
            );
            return Err(WalletError::AuthorizationMissing(format!(
                "script sender {} is not the authorized owner {}",
                sb.sender(),
                context.owner
            )));
        }
        let bm = sb.object(ObjectArg::Shared(context.balance_manager))?;
        let cap = sb.object(ObjectArg::Owned(context.trade_cap.clone()))?;
        let proof = sb.trade_proof_call(self.target("generate_proof_as_trader"), vec![bm, cap])?;
        Ok(proof)
    }
}
