//! Shared types for the TOTE settlement engine.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that treasury, engine,
//! and dashboard modules can depend on them without circular references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::treasury::TransferError;

/// Value amount in the smallest indivisible unit.
///
/// Wide enough to hold any conceivable pool; all arithmetic on amounts
/// must be overflow-checked, never wrapping.
pub type Amount = u128;

/// Identifier assigned to each recorded stake.
pub type StakeId = uuid::Uuid;

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// One value from the fixed set of event results.
///
/// `Undecided` is the initial announced value and is never a valid
/// stake target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Undecided,
    TeamA,
    TeamB,
    Draw,
}

impl Outcome {
    /// The outcomes a stake may target (everything except `Undecided`).
    pub const CONCRETE: &'static [Outcome] = &[Outcome::TeamA, Outcome::TeamB, Outcome::Draw];

    /// Whether this is a valid stake target / announcement value.
    pub fn is_concrete(&self) -> bool {
        !matches!(self, Outcome::Undecided)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Undecided => write!(f, "Undecided"),
            Outcome::TeamA => write!(f, "Team A"),
            Outcome::TeamB => write!(f, "Team B"),
            Outcome::Draw => write!(f, "Draw"),
        }
    }
}

/// Attempt to parse a string into an Outcome (case-insensitive).
impl std::str::FromStr for Outcome {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace([' ', '-'], "_").as_str() {
            "undecided" | "pending" => Ok(Outcome::Undecided),
            "team_a" | "a" => Ok(Outcome::TeamA),
            "team_b" | "b" => Ok(Outcome::TeamB),
            "draw" | "tie" => Ok(Outcome::Draw),
            _ => Err(anyhow::anyhow!("Unknown outcome: {s}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// Identity of a participant or the administrator.
///
/// Opaque to the engine; the surrounding layers decide what it maps to
/// (wallet address, user id, account name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        AccountId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        AccountId::new(s)
    }
}

// ---------------------------------------------------------------------------
// Stakes & payouts
// ---------------------------------------------------------------------------

/// A single recorded contribution of value toward one outcome.
///
/// Created only by `place_stake`; immutable thereafter; never deleted,
/// only logically consumed once its payout has been issued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stake {
    pub id: StakeId,
    pub staker: AccountId,
    pub amount: Amount,
    pub outcome: Outcome,
    pub placed_at: DateTime<Utc>,
}

impl fmt::Display for Stake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} staked {} on {} [{}]",
            self.staker, self.amount, self.outcome, self.id,
        )
    }
}

/// A computed payout owed to one winning ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub staker: AccountId,
    pub amount: Amount,
    pub outcome: Outcome,
}

impl fmt::Display for Payout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} wins {} on {}", self.staker, self.amount, self.outcome)
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// Notification published to observers after an operation commits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PoolEvent {
    StakeRecorded {
        id: StakeId,
        staker: AccountId,
        amount: Amount,
        outcome: Outcome,
        at: DateTime<Utc>,
    },
    PayoutIssued {
        staker: AccountId,
        amount: Amount,
        outcome: Outcome,
        at: DateTime<Utc>,
    },
    RemainderWithdrawn {
        recipient: AccountId,
        amount: Amount,
        at: DateTime<Utc>,
    },
}

impl fmt::Display for PoolEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolEvent::StakeRecorded { staker, amount, outcome, .. } => {
                write!(f, "stake recorded: {staker} → {amount} on {outcome}")
            }
            PoolEvent::PayoutIssued { staker, amount, outcome, .. } => {
                write!(f, "payout issued: {staker} ← {amount} ({outcome})")
            }
            PoolEvent::RemainderWithdrawn { recipient, amount, .. } => {
                write!(f, "remainder withdrawn: {recipient} ← {amount}")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for the settlement engine.
///
/// Every variant is recoverable from the caller's perspective and leaves
/// engine state exactly as it was before the failing call.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("caller {0} is not the pool administrator")]
    Unauthorized(AccountId),

    #[error("stake amount must be greater than zero")]
    InvalidAmount,

    #[error("not a valid stake target: {0}")]
    InvalidOutcome(Outcome),

    #[error("outcome already announced: {0}")]
    AlreadySettled(Outcome),

    #[error("transfer failed: {0}")]
    TransferFailure(#[from] TransferError),

    #[error("amount arithmetic overflowed while {0}")]
    Overflow(&'static str),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
