//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Core error: {0}")]
    Core(#[from] tide_core::CoreError),

    #[error("Registry error: {0}")]
    Registry(#[from] tide_registry::RegistryError),

    #[error("Wallet error: {0}")]
    Wallet(#[from] tide_wallet::WalletError),

    #[error("Executor error: {0}")]
    Executor(#[from] tide_executor::ExecutorError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] tide_telemetry::TelemetryError),

    #[error("Preflight error: {0}")]
    Preflight(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
