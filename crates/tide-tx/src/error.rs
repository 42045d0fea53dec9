//! Transaction builder error types.

use thiserror::Error;
use tide_core::{CoreError, ErrorKind, OrderId, ScriptError};
use tide_wallet::WalletError;

#[derive(Debug, Error)]
pub enum TxError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Order {0} has no on-chain order id")]
    OrderNotOnChain(OrderId),

    #[error("Zero minimum output refused in production mode")]
    ZeroMinOutput,

    #[error("Zero fee placeholder refused in production mode")]
    ZeroFeePlaceholder,

    #[error("Build plan does not match request: {0}")]
    PlanMismatch(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Script(#[from] ScriptError),
}

impl TxError {
    /// User-facing category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) | Self::ZeroMinOutput => ErrorKind::InvalidInput,
            Self::OrderNotOnChain(_) => ErrorKind::OrderNotOnChain,
            Self::ZeroFeePlaceholder => ErrorKind::InsufficientFeeToken,
            Self::PlanMismatch(_) => ErrorKind::Internal,
            Self::Core(e) => e.kind(),
            Self::Wallet(e) => e.kind(),
            Self::Script(e) => e.kind(),
        }
    }
}

pub type TxResult<T> = Result<T, TxError>;
