//! Wallet error types.

use thiserror::Error;
use tide_core::{ErrorKind, ScriptError};

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Insufficient balance of {coin_type}: required {required}, available {available}")]
    InsufficientBalance {
        coin_type: String,
        required: u64,
        available: u128,
    },

    #[error("Insufficient fee token {coin_type}: required {required}, available {available}")]
    InsufficientFeeToken {
        coin_type: String,
        required: u64,
        available: u128,
    },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Authorization missing: {0}")]
    AuthorizationMissing(String),

    #[error("Coin query failed: {0}")]
    Query(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Script(#[from] ScriptError),
}

impl WalletError {
    /// User-facing category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            Self::InsufficientFeeToken { .. } => ErrorKind::InsufficientFeeToken,
            Self::InvalidAmount(_) => ErrorKind::InvalidInput,
            Self::AuthorizationMissing(_) => ErrorKind::AuthorizationMissing,
            Self::Query(_) | Self::Rpc { .. } | Self::HttpClient(_) | Self::Json(_) => {
                ErrorKind::NetworkError
            }
            Self::Script(e) => e.kind(),
        }
    }
}

pub type WalletResult<T> = Result<T, WalletError>;
