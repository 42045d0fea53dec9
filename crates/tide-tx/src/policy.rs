//! Venue order flags and build mode.

use serde::{Deserialize, Serialize};

/// Time-in-force style restriction on a placed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderRestriction {
    #[default]
    NoRestriction,
    ImmediateOrCancel,
    FillOrKill,
    PostOnly,
}

impl OrderRestriction {
    pub fn as_u8(&self) -> u8 {
        match self {
            Self::NoRestriction => 0,
            Self::ImmediateOrCancel => 1,
            Self::FillOrKill => 2,
            Self::PostOnly => 3,
        }
    }
}

/// What the venue does when an order would match the same balance manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfMatchingPolicy {
    Allowed,
    /// Cancel the incoming (taker) order.
    #[default]
    CancelTaker,
    /// Cancel the resting (maker) order.
    CancelMaker,
}

impl SelfMatchingPolicy {
    pub fn as_u8(&self) -> u8 {
        match self {
            Self::Allowed => 0,
            Self::CancelTaker => 1,
            Self::CancelMaker => 2,
        }
    }
}

/// Test mode allows zero-fee placeholders and zero minimum output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    #[default]
    Test,
    Production,
}

impl BuildMode {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}
