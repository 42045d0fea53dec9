//! Conditional order entity and its enums.
//!
//! The lifecycle is owned by the order store in `tide-orders`; this module
//! only defines the shape of an order and the pure predicates over it.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::market::PairKey;
use crate::{Price, Size};

/// Order side: buy or sell the base asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Venue flag: bids are buys.
    pub fn is_bid(&self) -> bool {
        matches!(self, Self::Buy)
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// Conditional order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    Limit,
    StopLoss,
    TakeProfit,
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limit => write!(f, "limit"),
            Self::StopLoss => write!(f, "stop_loss"),
            Self::TakeProfit => write!(f, "take_profit"),
        }
    }
}

/// Lifecycle state.
///
/// `Pending -> Triggered -> Filled`, `Pending -> Triggered -> Cancelled`,
/// `Pending -> Cancelled`. `Filled` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Triggered,
    Filled,
    Cancelled,
}

impl OrderStatus {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Filled | Self::Cancelled)
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        !self.is_terminal()
    }

    /// Whether the state machine allows `self -> next`.
    #[must_use]
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Triggered)
                | (Self::Pending, Self::Cancelled)
                | (Self::Triggered, Self::Filled)
                | (Self::Triggered, Self::Cancelled)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Triggered => write!(f, "triggered"),
            Self::Filled => write!(f, "filled"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Locally generated order id.
///
/// Format: `ord_{timestamp_ms}_{uuid_short}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub fn new() -> Self {
        let ts = chrono::Utc::now().timestamp_millis();
        let uuid_short = &Uuid::new_v4().simple().to_string()[..8];
        Self(format!("ord_{ts}_{uuid_short}"))
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// User intent to create a conditional order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub pair: PairKey,
    pub side: OrderSide,
    pub kind: OrderKind,
    pub trigger_price: Price,
    pub quantity: Size,
}

/// A conditional order tracked for the lifetime of the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub pair: PairKey,
    pub side: OrderSide,
    pub kind: OrderKind,
    pub trigger_price: Price,
    /// Base-asset quantity in human units.
    pub quantity: Size,
    pub status: OrderStatus,
    /// Unix milliseconds.
    pub created_at: u64,
    pub triggered_at: Option<u64>,
    /// Venue-assigned order id, recorded on confirmed placement.
    pub on_chain_order_id: Option<u128>,
    pub submission_digest: Option<String>,
    /// Digest of a confirmed venue cancellation, if any.
    pub cancel_digest: Option<String>,
}

impl Order {
    pub fn from_new(id: OrderId, new: NewOrder, created_at: u64) -> Self {
        Self {
            id,
            pair: new.pair,
            side: new.side,
            kind: new.kind,
            trigger_price: new.trigger_price,
            quantity: new.quantity,
            status: OrderStatus::Pending,
            created_at,
            triggered_at: None,
            on_chain_order_id: None,
            submission_digest: None,
            cancel_digest: None,
        }
    }
}
