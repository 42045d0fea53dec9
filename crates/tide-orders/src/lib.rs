//! Conditional order lifecycle for tide.
//!
//! `trigger` holds the pure per-kind trigger conditions; `store` owns the
//! order set and is the only place order state changes.

pub mod error;
pub mod store;
pub mod trigger;

pub use error::{OrderError, OrderResult};
pub use store::{CancelOutcome, OrderLifecycleStore};
pub use trigger::{condition_met, evaluate, Transition};
