//! Error types for tide-core.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// User-facing error category.
///
/// Every library error in the workspace maps onto one of these so the
/// orchestrating layer can report a stable category to the end user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Non-positive or unrepresentable amount/price.
    InvalidInput,
    /// No pool for the requested symbol pair.
    PoolNotFound,
    /// Balance manager or trade capability not found.
    AuthorizationMissing,
    /// Spendable coins do not cover the requested input.
    InsufficientBalance,
    /// Spendable fee-token coins do not cover the protocol fee.
    InsufficientFeeToken,
    /// Order was only tracked locally and has no venue order id.
    OrderNotOnChain,
    /// The signer (user) declined the transaction.
    SignerRejected,
    /// Network or ledger failure.
    NetworkError,
    /// Cancel raced with a confirmed fill.
    AlreadyFilled,
    /// Build-time defect (un-routed result, reused proof, bad transition).
    Internal,
}

impl ErrorKind {
    /// Errors that are detected before any script is built.
    #[must_use]
    pub fn is_pre_build(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput
                | Self::PoolNotFound
                | Self::AuthorizationMissing
                | Self::InsufficientBalance
                | Self::InsufficientFeeToken
                | Self::OrderNotOnChain
        )
    }

    /// Errors after which re-submitting the same build may succeed.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::SignerRejected | Self::NetworkError)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InvalidInput => "invalid_input",
            Self::PoolNotFound => "pool_not_found",
            Self::AuthorizationMissing => "authorization_missing",
            Self::InsufficientBalance => "insufficient_balance",
            Self::InsufficientFeeToken => "insufficient_fee_token",
            Self::OrderNotOnChain => "order_not_on_chain",
            Self::SignerRejected => "signer_rejected",
            Self::NetworkError => "network_error",
            Self::AlreadyFilled => "already_filled",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Unit conversion overflow: {value} at {decimals} decimals")]
    Overflow { value: String, decimals: u8 },

    #[error("Invalid object id: {0}")]
    InvalidObjectId(String),

    #[error("Invalid pair key: {0}")]
    InvalidPairKey(String),

    #[error("Decimal parse error: {0}")]
    DecimalParse(#[from] rust_decimal::Error),
}

impl CoreError {
    /// User-facing category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidInput
    }
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pre_build_kinds() {
        assert!(ErrorKind::InvalidInput.is_pre_build());
        assert!(ErrorKind::OrderNotOnChain.is_pre_build());
        assert!(!ErrorKind::SignerRejected.is_pre_build());
        assert!(!ErrorKind::AlreadyFilled.is_pre_build());
    }

    #[test]
    fn test_recoverable_kinds() {
        assert!(ErrorKind::SignerRejected.is_recoverable());
        assert!(ErrorKind::NetworkError.is_recoverable());
        assert!(!ErrorKind::InsufficientBalance.is_recoverable());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ErrorKind::PoolNotFound.to_string(), "pool_not_found");
        assert_eq!(ErrorKind::AlreadyFilled.to_string(), "already_filled");
    }
}
