//! Execution layer of the tide engine.
//!
//! - `ExecutionCoordinator`: order intake, evaluation ticks, submission
//!   and reconciliation, plus the two periodic tasks
//! - `Signer` / `PriceFeed`: external seams, with mocks for tests
//! - `SessionStore`: bounded per-user state with idle expiry

pub mod coordinator;
pub mod error;
pub mod price_feed;
pub mod session;
pub mod signer;

pub use coordinator::{
    CoordinatorConfig, CoordinatorDeps, CoordinatorHandle, ExecutionCoordinator, ExecutionStyle,
    PlacedOrder, SwapExecution,
};
pub use error::{ExecutorError, ExecutorResult};
pub use price_feed::{DynPriceFeed, HttpPriceFeed, MockPriceFeed, PriceFeed, PriceMap};
pub use session::{SessionStore, DEFAULT_SESSION_CAPACITY, DEFAULT_SESSION_IDLE_TTL};
pub use signer::{DryRunSigner, DynSigner, MockSigner, SignResult, Signer, SignerError, SubmitReceipt};
