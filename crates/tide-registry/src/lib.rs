//! Market configuration for tide.
//!
//! Manages the assets and CLOB pools tradable in a session, resolves pools
//! from either symbol order, and verifies the configuration against the
//! venue indexer before trading starts.

pub mod client;
pub mod error;
pub mod pool_registry;
pub mod preflight;

pub use client::{parse_ticker, IndexerClient};
pub use error::{RegistryError, RegistryResult};
pub use pool_registry::{PoolRegistry, PoolSpec, ResolvedPool};
pub use preflight::{verify_pools, IndexerPool, PreflightResult};
