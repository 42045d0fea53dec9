//! Registry error types.

use thiserror::Error;
use tide_core::ErrorKind;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("No pool for pair {0}/{1}")]
    PoolNotFound(String, String),

    #[error("Unknown asset symbol: {0}")]
    UnknownAsset(String),

    #[error("A pool is already registered for pair {0}")]
    DuplicatePair(String),

    #[error("Pool spec parse error: {0}")]
    ParseError(String),

    #[error("Parameter change detected: {0}")]
    ParamChange(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] tide_core::CoreError),
}

impl RegistryError {
    /// User-facing category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PoolNotFound(..) => ErrorKind::PoolNotFound,
            Self::UnknownAsset(_) | Self::Core(_) => ErrorKind::InvalidInput,
            Self::HttpClient(_) => ErrorKind::NetworkError,
            Self::DuplicatePair(_) | Self::ParseError(_) | Self::ParamChange(_) | Self::Json(_) => {
                ErrorKind::Internal
            }
        }
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;
