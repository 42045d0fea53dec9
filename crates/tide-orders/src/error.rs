//! Order store error types.

use thiserror::Error;
use tide_core::{ErrorKind, OrderId, OrderStatus};

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    #[error("Invalid order: {0}")]
    InvalidInput(String),

    #[error("Order {0} is already filled")]
    AlreadyFilled(OrderId),

    #[error("Order {id}: transition {from} -> {to} not allowed")]
    InvalidTransition {
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    },
}

impl OrderError {
    /// User-facing category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) | Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::AlreadyFilled(_) => ErrorKind::AlreadyFilled,
            Self::InvalidTransition { .. } => ErrorKind::Internal,
        }
    }
}

pub type OrderResult<T> = Result<T, OrderError>;
