//! Price-trigger evaluation.
//!
//! | kind        | side | fires when        |
//! |-------------|------|-------------------|
//! | limit       | buy  | price <= trigger  |
//! | limit       | sell | price >= trigger  |
//! | stop-loss   | sell | price <= trigger  |
//! | stop-loss   | buy  | price >= trigger  |
//! | take-profit | sell | price >= trigger  |
//! | take-profit | buy  | price <= trigger  |

use serde::Serialize;
use tide_core::{Order, OrderId, OrderKind, OrderSide, OrderStatus, Price};

/// A state change produced by evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub order_id: OrderId,
    pub kind: OrderKind,
    pub side: OrderSide,
    pub from: OrderStatus,
    pub to: OrderStatus,
    /// Price that satisfied the condition.
    pub price: Price,
    /// Unix milliseconds.
    pub at: u64,
}

fn limit_fires(side: OrderSide, price: Price, trigger: Price) -> bool {
    match side {
        OrderSide::Buy => price <= trigger,
        OrderSide::Sell => price >= trigger,
    }
}

fn stop_loss_fires(side: OrderSide, price: Price, trigger: Price) -> bool {
    match side {
        OrderSide::Sell => price <= trigger,
        OrderSide::Buy => price >= trigger,
    }
}

fn take_profit_fires(side: OrderSide, price: Price, trigger: Price) -> bool {
    match side {
        OrderSide::Sell => price >= trigger,
        OrderSide::Buy => price <= trigger,
    }
}

/// Whether an order of `kind`/`side` fires at `price`.
pub fn condition_met(kind: OrderKind, side: OrderSide, price: Price, trigger: Price) -> bool {
    match kind {
        OrderKind::Limit => limit_fires(side, price, trigger),
        OrderKind::StopLoss => stop_loss_fires(side, price, trigger),
        OrderKind::TakeProfit => take_profit_fires(side, price, trigger),
    }
}

/// Evaluate one order against the current price.
///
/// Only pending orders are evaluated; everything else yields `None`, so
/// re-evaluating a triggered order never triggers it again. Non-positive
/// prices are ignored.
pub fn evaluate(order: &Order, price: Price, now_ms: u64) -> Option<Transition> {
    if order.status != OrderStatus::Pending || !price.is_positive() {
        return None;
    }
    condition_met(order.kind, order.side, price, order.trigger_price).then(|| Transition {
        order_id: order.id.clone(),
        kind: order.kind,
        side: order.side,
        from: OrderStatus::Pending,
        to: OrderStatus::Triggered,
        price,
        at: now_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tide_core::{NewOrder, PairKey, Size};

    fn order(kind: OrderKind, side: OrderSide, trigger: rust_decimal::Decimal) -> Order {
        Order::from_new(
            OrderId::from_string("ord_test"),
            NewOrder {
                pair: PairKey::new("SUI", "USDC"),
                side,
                kind,
                trigger_price: Price::new(trigger),
                quantity: Size::new(dec!(1)),
            },
            0,
        )
    }

    #[test]
    fn test_condition_table() {
        use OrderKind::*;
        use OrderSide::*;
        let t = Price::new(dec!(10));
        let below = Price::new(dec!(9.99));
        let above = Price::new(dec!(10.01));

        let cases = [
            (Limit, Buy, below, true),
            (Limit, Buy, above, false),
            (Limit, Sell, above, true),
            (Limit, Sell, below, false),
            (StopLoss, Sell, below, true),
            (StopLoss, Sell, above, false),
            (StopLoss, Buy, above, true),
            (StopLoss, Buy, below, false),
            (TakeProfit, Sell, above, true),
            (TakeProfit, Sell, below, false),
            (TakeProfit, Buy, below, true),
            (TakeProfit, Buy, above, false),
        ];
        for (kind, side, price, expected) in cases {
            assert_eq!(
                condition_met(kind, side, price, t),
                expected,
                "{kind} {side} at {price}"
            );
        }
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let t = Price::new(dec!(10));
        for kind in [OrderKind::Limit, OrderKind::StopLoss, OrderKind::TakeProfit] {
            for side in [OrderSide::Buy, OrderSide::Sell] {
                assert!(condition_met(kind, side, t, t));
            }
        }
    }

    #[test]
    fn test_stop_loss_sell_series() {
        let o = order(OrderKind::StopLoss, OrderSide::Sell, dec!(10.0));
        assert!(evaluate(&o, Price::new(dec!(10.5)), 1).is_none());
        assert!(evaluate(&o, Price::new(dec!(10.2)), 2).is_none());
        let t = evaluate(&o, Price::new(dec!(9.9)), 3).unwrap();
        assert_eq!(t.to, OrderStatus::Triggered);
        assert_eq!(t.at, 3);
    }

    #[test]
    fn test_non_pending_never_evaluated() {
        let mut o = order(OrderKind::Limit, OrderSide::Buy, dec!(10));
        for status in [OrderStatus::Triggered, OrderStatus::Filled, OrderStatus::Cancelled] {
            o.status = status;
            assert!(evaluate(&o, Price::new(dec!(1)), 0).is_none());
        }
    }

    #[test]
    fn test_zero_price_ignored() {
        let o = order(OrderKind::Limit, OrderSide::Buy, dec!(10));
        assert!(evaluate(&o, Price::ZERO, 0).is_none());
    }
}
