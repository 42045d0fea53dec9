//! Tide conditional order engine.
//!
//! Wires the registry, wallet, builder and coordinator crates together:
//! - Static pool registry with optional indexer preflight
//! - Coin inventory over JSON-RPC
//! - Price-triggered orders executed through an external signer

pub mod app;
pub mod config;
pub mod error;

pub use app::{Application, Components};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
