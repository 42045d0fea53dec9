//! Order lifecycle store.
//!
//! Single owner of order state. Orders are never removed; terminal orders
//! stay for history. All mutation goes through `&mut self`, so one
//! evaluation pass is atomic with respect to the collection when the store
//! sits behind a lock.

use crate::error::{OrderError, OrderResult};
use crate::trigger::{evaluate, Transition};
use std::collections::HashMap;
use tide_core::{NewOrder, Order, OrderId, OrderStatus, PairKey, Price};
use tracing::{debug, info, warn};

/// Result of a cancel request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled,
    /// The order was already cancelled.
    AlreadyCancelled,
}

/// In-memory, session-local order store.
#[derive(Debug, Default)]
pub struct OrderLifecycleStore {
    orders: Vec<Order>,
    index: HashMap<OrderId, usize>,
}

impl OrderLifecycleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and insert a new pending order.
    pub fn create(&mut self, new: NewOrder, now_ms: u64) -> OrderResult<Order> {
        if !new.trigger_price.is_positive() {
            return Err(OrderError::InvalidInput(format!(
                "trigger price must be positive, got {}",
                new.trigger_price
            )));
        }
        if !new.quantity.is_positive() {
            return Err(OrderError::InvalidInput(format!(
                "quantity must be positive, got {}",
                new.quantity
            )));
        }
        if new.pair.base() == new.pair.quote() {
            return Err(OrderError::InvalidInput(format!("degenerate pair {}", new.pair)));
        }

        let mut id = OrderId::new();
        while self.index.contains_key(&id) {
            id = OrderId::new();
        }
        let order = Order::from_new(id.clone(), new, now_ms);
        info!(
            order_id = %id,
            pair = %order.pair,
            kind = %order.kind,
            side = %order.side,
            trigger = %order.trigger_price,
            quantity = %order.quantity,
            "Order created"
        );
        self.index.insert(id, self.orders.len());
        self.orders.push(order.clone());
        Ok(order)
    }

    pub fn get(&self, id: &OrderId) -> Option<&Order> {
        self.index.get(id).map(|&i| &self.orders[i])
    }

    fn get_mut(&mut self, id: &OrderId) -> OrderResult<&mut Order> {
        match self.index.get(id) {
            Some(&i) => Ok(&mut self.orders[i]),
            None => Err(OrderError::NotFound(id.clone())),
        }
    }

    /// Every order, in creation order.
    pub fn list(&self) -> &[Order] {
        &self.orders
    }

    /// Pending and triggered orders.
    pub fn live(&self) -> Vec<&Order> {
        self.orders.iter().filter(|o| o.status.is_live()).collect()
    }

    pub fn live_count(&self) -> usize {
        self.orders.iter().filter(|o| o.status.is_live()).count()
    }

    /// Triggered orders waiting for execution.
    pub fn triggered(&self) -> Vec<&Order> {
        self.orders
            .iter()
            .filter(|o| o.status == OrderStatus::Triggered)
            .collect()
    }

    /// Pairs with at least one pending order, sorted and deduplicated.
    pub fn pending_pairs(&self) -> Vec<PairKey> {
        let mut pairs: Vec<PairKey> = self
            .orders
            .iter()
            .filter(|o| o.status == OrderStatus::Pending)
            .map(|o| o.pair.clone())
            .collect();
        pairs.sort();
        pairs.dedup();
        pairs
    }

    /// Evaluate every pending order against `prices` and apply the
    /// resulting transitions. Orders whose pair has no price are skipped.
    pub fn evaluate_pass(&mut self, prices: &HashMap<PairKey, Price>, now_ms: u64) -> Vec<Transition> {
        let mut transitions = Vec::new();
        for order in self.orders.iter_mut() {
            let Some(price) = prices.get(&order.pair) else {
                continue;
            };
            if let Some(t) = evaluate(order, *price, now_ms) {
                order.status = t.to;
                order.triggered_at = Some(t.at);
                info!(
                    order_id = %order.id,
                    kind = %order.kind,
                    side = %order.side,
                    trigger = %order.trigger_price,
                    price = %t.price,
                    "Order triggered"
                );
                transitions.push(t);
            }
        }
        if !transitions.is_empty() {
            debug!(count = transitions.len(), "Evaluation pass produced transitions");
        }
        transitions
    }

    /// Record a confirmed executing submission: `triggered -> filled`.
    ///
    /// A confirmation for an order cancelled locally in the meantime keeps
    /// it cancelled and only records the digest.
    pub fn confirm_filled(
        &mut self,
        id: &OrderId,
        digest: &str,
        venue_order_id: Option<u128>,
    ) -> OrderResult<Order> {
        let order = self.get_mut(id)?;
        match order.status {
            OrderStatus::Triggered => {
                order.status = OrderStatus::Filled;
                order.submission_digest = Some(digest.to_string());
                order.on_chain_order_id = venue_order_id.or(order.on_chain_order_id);
                info!(order_id = %id, %digest, "Order filled");
                Ok(order.clone())
            }
            OrderStatus::Cancelled => {
                warn!(order_id = %id, %digest, "Submission confirmed for a cancelled order");
                order.submission_digest = Some(digest.to_string());
                order.on_chain_order_id = venue_order_id.or(order.on_chain_order_id);
                Ok(order.clone())
            }
            from => Err(OrderError::InvalidTransition {
                id: id.clone(),
                from,
                to: OrderStatus::Filled,
            }),
        }
    }

    /// Local cancel. Idempotent on cancelled orders; fails with
    /// `AlreadyFilled` once a fill is confirmed.
    pub fn cancel(&mut self, id: &OrderId) -> OrderResult<CancelOutcome> {
        let order = self.get_mut(id)?;
        match order.status {
            OrderStatus::Pending | OrderStatus::Triggered => {
                let from = order.status;
                order.status = OrderStatus::Cancelled;
                info!(order_id = %id, %from, "Order cancelled");
                Ok(CancelOutcome::Cancelled)
            }
            OrderStatus::Cancelled => {
                debug!(order_id = %id, "Cancel on cancelled order ignored");
                Ok(CancelOutcome::AlreadyCancelled)
            }
            OrderStatus::Filled => Err(OrderError::AlreadyFilled(id.clone())),
        }
    }

    /// Record a confirmed venue cancellation. Local status is unchanged.
    pub fn record_venue_cancel(&mut self, id: &OrderId, digest: &str) -> OrderResult<()> {
        let order = self.get_mut(id)?;
        order.cancel_digest = Some(digest.to_string());
        info!(order_id = %id, %digest, "Venue order cancelled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tide_core::{ErrorKind, OrderKind, OrderSide, Size};

    fn sui_usdc() -> PairKey {
        PairKey::new("SUI", "USDC")
    }

    fn new_order(kind: OrderKind, side: OrderSide, trigger: rust_decimal::Decimal) -> NewOrder {
        NewOrder {
            pair: sui_usdc(),
            side,
            kind,
            trigger_price: Price::new(trigger),
            quantity: Size::new(dec!(1)),
        }
    }

    fn prices(p: rust_decimal::Decimal) -> HashMap<PairKey, Price> {
        HashMap::from([(sui_usdc(), Price::new(p))])
    }

    #[test]
    fn test_create_validates() {
        let mut store = OrderLifecycleStore::new();
        let err = store
            .create(new_order(OrderKind::Limit, OrderSide::Buy, dec!(0)), 0)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let mut bad = new_order(OrderKind::Limit, OrderSide::Buy, dec!(1));
        bad.quantity = Size::new(dec!(-1));
        assert!(store.create(bad, 0).is_err());

        let mut same = new_order(OrderKind::Limit, OrderSide::Buy, dec!(1));
        same.pair = PairKey::new("SUI", "SUI");
        assert!(store.create(same, 0).is_err());
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_stop_loss_triggers_exactly_once() {
        let mut store = OrderLifecycleStore::new();
        let order = store
            .create(new_order(OrderKind::StopLoss, OrderSide::Sell, dec!(10.0)), 0)
            .unwrap();

        let series = [dec!(10.5), dec!(10.2), dec!(9.9), dec!(9.5), dec!(9.0)];
        let mut fired_at = Vec::new();
        for (tick, p) in series.into_iter().enumerate() {
            if !store.evaluate_pass(&prices(p), tick as u64).is_empty() {
                fired_at.push(tick);
            }
        }
        assert_eq!(fired_at, vec![2]);
        let stored = store.get(&order.id).unwrap();
        assert_eq!(stored.status, OrderStatus::Triggered);
        assert_eq!(stored.triggered_at, Some(2));
    }

    #[test]
    fn test_missing_price_skips_order() {
        let mut store = OrderLifecycleStore::new();
        store
            .create(new_order(OrderKind::Limit, OrderSide::Buy, dec!(10)), 0)
            .unwrap();
        let other = HashMap::from([(PairKey::new("DEEP", "USDC"), Price::new(dec!(0.01)))]);
        assert!(store.evaluate_pass(&other, 1).is_empty());
        assert_eq!(store.pending_pairs(), vec![sui_usdc()]);
    }

    #[test]
    fn test_fill_then_cancel_fails() {
        let mut store = OrderLifecycleStore::new();
        let order = store
            .create(new_order(OrderKind::Limit, OrderSide::Buy, dec!(10)), 0)
            .unwrap();
        store.evaluate_pass(&prices(dec!(9)), 1);
        let filled = store.confirm_filled(&order.id, "digest1", Some(42)).unwrap();
        assert_eq!(filled.status, OrderStatus::Filled);
        assert_eq!(filled.on_chain_order_id, Some(42));

        let err = store.cancel(&order.id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyFilled);
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn test_cancel_triggered_is_honored() {
        let mut store = OrderLifecycleStore::new();
        let order = store
            .create(new_order(OrderKind::TakeProfit, OrderSide::Sell, dec!(10)), 0)
            .unwrap();
        store.evaluate_pass(&prices(dec!(11)), 1);
        assert_eq!(store.cancel(&order.id).unwrap(), CancelOutcome::Cancelled);
        assert_eq!(store.get(&order.id).unwrap().status, OrderStatus::Cancelled);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut store = OrderLifecycleStore::new();
        let order = store
            .create(new_order(OrderKind::Limit, OrderSide::Sell, dec!(10)), 0)
            .unwrap();
        assert_eq!(store.cancel(&order.id).unwrap(), CancelOutcome::Cancelled);
        assert_eq!(
            store.cancel(&order.id).unwrap(),
            CancelOutcome::AlreadyCancelled
        );
        assert_eq!(store.get(&order.id).unwrap().status, OrderStatus::Cancelled);
    }

    #[test]
    fn test_cancelled_order_not_evaluated() {
        let mut store = OrderLifecycleStore::new();
        let order = store
            .create(new_order(OrderKind::Limit, OrderSide::Buy, dec!(10)), 0)
            .unwrap();
        store.cancel(&order.id).unwrap();
        assert!(store.evaluate_pass(&prices(dec!(1)), 1).is_empty());
    }

    #[test]
    fn test_fill_requires_triggered() {
        let mut store = OrderLifecycleStore::new();
        let order = store
            .create(new_order(OrderKind::Limit, OrderSide::Buy, dec!(10)), 0)
            .unwrap();
        let err = store.confirm_filled(&order.id, "d", None).unwrap_err();
        assert!(matches!(
            err,
            OrderError::InvalidTransition {
                from: OrderStatus::Pending,
                ..
            }
        ));
    }

    #[test]
    fn test_late_fill_keeps_cancel() {
        let mut store = OrderLifecycleStore::new();
        let order = store
            .create(new_order(OrderKind::Limit, OrderSide::Buy, dec!(10)), 0)
            .unwrap();
        store.evaluate_pass(&prices(dec!(9)), 1);
        store.cancel(&order.id).unwrap();
        let after = store.confirm_filled(&order.id, "late", None).unwrap();
        assert_eq!(after.status, OrderStatus::Cancelled);
        assert_eq!(after.submission_digest.as_deref(), Some("late"));
    }

    #[test]
    fn test_unknown_order() {
        let mut store = OrderLifecycleStore::new();
        let id = OrderId::from_string("ord_missing");
        assert!(matches!(store.cancel(&id), Err(OrderError::NotFound(_))));
        assert!(store.get(&id).is_none());
    }

    #[test]
    fn test_history_keeps_terminal_orders() {
        let mut store = OrderLifecycleStore::new();
        let a = store
            .create(new_order(OrderKind::Limit, OrderSide::Buy, dec!(10)), 0)
            .unwrap();
        store
            .create(new_order(OrderKind::Limit, OrderSide::Sell, dec!(20)), 0)
            .unwrap();
        store.cancel(&a.id).unwrap();
        assert_eq!(store.list().len(), 2);
        assert_eq!(store.live().len(), 1);
    }
}
