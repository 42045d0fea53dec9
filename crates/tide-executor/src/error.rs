//! Executor error types.

use crate::signer::SignerError;
use thiserror::Error;
use tide_core::{CoreError, ErrorKind, OrderId, PairKey};
use tide_orders::OrderError;
use tide_registry::RegistryError;
use tide_tx::TxError;
use tide_wallet::WalletError;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No price available for {0}")]
    NoPrice(PairKey),

    #[error("Order {0} is already being executed")]
    AlreadyExecuting(OrderId),

    #[error("Price feed error: {0}")]
    PriceFeed(String),

    #[error(transparent)]
    Signer(#[from] SignerError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Tx(#[from] TxError),

    #[error(transparent)]
    Order(#[from] OrderError),
}

impl ExecutorError {
    /// User-facing category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) | Self::AlreadyExecuting(_) => ErrorKind::InvalidInput,
            Self::NoPrice(_) | Self::PriceFeed(_) => ErrorKind::NetworkError,
            Self::Signer(e) => e.kind(),
            Self::Core(e) => e.kind(),
            Self::Registry(e) => e.kind(),
            Self::Wallet(e) => e.kind(),
            Self::Tx(e) => e.kind(),
            Self::Order(e) => e.kind(),
        }
    }
}

pub type ExecutorResult<T> = Result<T, ExecutorError>;
