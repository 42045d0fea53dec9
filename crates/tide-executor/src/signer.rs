//! Signer contract.
//!
//! The signer is external: it signs a finished script with keys the engine
//! never sees and submits it to the ledger.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tide_core::{BoxFuture, ErrorKind, LedgerTransactionScript};
use tracing::{debug, info};

/// Confirmed submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub digest: String,
    /// Order id assigned by the venue, for order placements.
    pub venue_order_id: Option<u128>,
}

/// Submission failures. Both leave order state unchanged.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignerError {
    #[error("Signer rejected: {0}")]
    Rejected(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl SignerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Rejected(_) => ErrorKind::SignerRejected,
            Self::Network(_) => ErrorKind::NetworkError,
        }
    }

    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Rejected(_) => "rejected",
            Self::Network(_) => "network",
        }
    }
}

pub type SignResult = Result<SubmitReceipt, SignerError>;

/// Signs and submits a script.
pub trait Signer: Send + Sync {
    fn sign_and_submit(&self, script: LedgerTransactionScript) -> BoxFuture<'_, SignResult>;
}

/// Arc wrapper for Signer trait objects.
pub type DynSigner = Arc<dyn Signer>;

/// Signer that logs scripts and submits nothing.
///
/// Every script is refused, so no order is ever reconciled as filled and
/// the external wallet can pick the logged script up.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunSigner;

impl Signer for DryRunSigner {
    fn sign_and_submit(&self, script: LedgerTransactionScript) -> BoxFuture<'_, SignResult> {
        Box::pin(async move {
            let json = script
                .to_json()
                .map_err(|e| SignerError::Network(format!("script serialization failed: {e}")))?;
            info!(
                script_id = script.id(),
                commands = script.commands().len(),
                "Dry-run script not submitted"
            );
            debug!(script = %json, "Dry-run script");
            Err(SignerError::Rejected(format!(
                "dry run: script {} was not submitted",
                script.id()
            )))
        })
    }
}

/// Mock signer for testing.
#[derive(Debug, Default)]
pub struct MockSigner {
    submitted: Mutex<Vec<LedgerTransactionScript>>,
    results: Mutex<VecDeque<SignResult>>,
    delay: Mutex<Option<Duration>>,
}

impl MockSigner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a result. With an empty queue every submission succeeds with a
    /// synthetic digest.
    pub fn push_result(&self, result: SignResult) {
        self.results.lock().push_back(result);
    }

    /// Delay every submission (useful with a paused tokio clock).
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock() = delay;
    }

    pub fn submitted(&self) -> Vec<LedgerTransactionScript> {
        self.submitted.lock().clone()
    }

    pub fn submission_count(&self) -> usize {
        self.submitted.lock().len()
    }
}

impl Signer for MockSigner {
    fn sign_and_submit(&self, script: LedgerTransactionScript) -> BoxFuture<'_, SignResult> {
        Box::pin(async move {
            let delay = *self.delay.lock();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            let id = script.id();
            self.submitted.lock().push(script);
            let next = self.results.lock().pop_front();
            next.unwrap_or_else(|| {
                Ok(SubmitReceipt {
                    digest: format!("mock-{id}"),
                    venue_order_id: None,
                })
            })
        })
    }
}
