//! Value custody backends.
//!
//! Defines the `Treasury` trait through which the engine pushes value
//! outward (payouts and remainder withdrawals), and provides:
//! - SimulatedLedger — deterministic in-memory accounts for the binary
//!   and the integration test harness

pub mod sim;

pub use sim::SimulatedLedger;

use async_trait::async_trait;

use crate::types::{AccountId, Amount, Payout};

/// Error returned by a treasury backend when a transfer cannot complete.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransferError {
    #[error("destination account {0} refused the transfer")]
    Refused(AccountId),

    #[error("treasury backend unavailable: {0}")]
    Backend(String),
}

/// Abstraction over the backend that holds participant value.
///
/// The engine only ever moves value outward through this trait; stake
/// collection is the responsibility of the surrounding deployment layer.
/// Implementors must make `credit_batch` all-or-nothing: either every
/// payout in the batch lands, or none do and an error is returned.
#[async_trait]
pub trait Treasury: Send + Sync {
    /// Transfer `amount` into `account`'s custody.
    async fn credit(&self, account: &AccountId, amount: Amount) -> Result<(), TransferError>;

    /// Transfer a whole payout schedule, atomically.
    async fn credit_batch(&self, payouts: &[Payout]) -> Result<(), TransferError>;

    /// Backend name for logging and identification.
    fn name(&self) -> &str;
}
