//! Settlement engine — the wagering pool's bookkeeping core.
//!
//! Owns the stake ledger, the one-shot announced outcome, per-outcome
//! cumulative totals, and the pool balance. All three operations and
//! every query run inside one critical section per engine instance, so
//! no caller ever observes a partially-applied mutation. Operations
//! either commit fully or leave state exactly as before.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Mutex};
use tracing::info;

use crate::engine::payout;
use crate::treasury::Treasury;
use crate::types::{AccountId, Amount, Outcome, Payout, PoolError, PoolEvent, Stake, StakeId};

/// Capacity of the notification channel; slow subscribers lag, the
/// engine never blocks on them.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

// ---------------------------------------------------------------------------
// Pool state
// ---------------------------------------------------------------------------

/// Mutable pool state, guarded by the engine's single mutex.
#[derive(Debug)]
struct PoolState {
    announced: Outcome,
    stakes: Vec<Stake>,
    totals: HashMap<Outcome, Amount>,
    balance: Amount,
}

impl PoolState {
    fn empty() -> Self {
        Self {
            announced: Outcome::Undecided,
            stakes: Vec::new(),
            totals: HashMap::new(),
            balance: 0,
        }
    }

    fn total_for(&self, outcome: Outcome) -> Amount {
        self.totals.get(&outcome).copied().unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Snapshot & settlement report
// ---------------------------------------------------------------------------

/// Serializable image of the pool, used by the persistence layer.
///
/// Per-outcome totals are derived from the ledger on restore rather than
/// stored; the ledger is the source of truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub admin: AccountId,
    pub announced: Outcome,
    pub stakes: Vec<Stake>,
    pub balance: Amount,
    pub taken_at: DateTime<Utc>,
}

/// Result of a committed announcement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementReport {
    pub outcome: Outcome,
    pub pool_at_announcement: Amount,
    pub total_winning_stake: Amount,
    pub payouts: Vec<Payout>,
    pub total_paid: Amount,
    pub remainder: Amount,
}

// ---------------------------------------------------------------------------
// Settlement engine
// ---------------------------------------------------------------------------

/// The pari-mutuel settlement engine.
///
/// Holds the administrator identity fixed at construction; only that
/// identity may announce an outcome or withdraw the remainder.
pub struct SettlementEngine {
    admin: AccountId,
    treasury: Arc<dyn Treasury>,
    state: Mutex<PoolState>,
    events: broadcast::Sender<PoolEvent>,
}

impl SettlementEngine {
    /// Create a fresh pool: balance 0, outcome `Undecided`, empty ledger.
    pub fn new(admin: AccountId, treasury: Arc<dyn Treasury>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            admin,
            treasury,
            state: Mutex::new(PoolState::empty()),
            events,
        }
    }

    /// Rebuild an engine from a saved snapshot.
    ///
    /// Per-outcome totals are recomputed from the ledger.
    pub fn restore(snapshot: PoolSnapshot, treasury: Arc<dyn Treasury>) -> Result<Self, PoolError> {
        let mut totals: HashMap<Outcome, Amount> = HashMap::new();
        for stake in &snapshot.stakes {
            let entry = totals.entry(stake.outcome).or_insert(0);
            *entry = entry
                .checked_add(stake.amount)
                .ok_or(PoolError::Overflow("restoring outcome totals"))?;
        }

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            admin: snapshot.admin,
            treasury,
            state: Mutex::new(PoolState {
                announced: snapshot.announced,
                stakes: snapshot.stakes,
                totals,
                balance: snapshot.balance,
            }),
            events,
        })
    }

    /// The administrator identity this pool was constructed with.
    pub fn admin(&self) -> &AccountId {
        &self.admin
    }

    /// Subscribe to stake/payout/withdrawal notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<PoolEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: PoolEvent) {
        // Errors only when no receivers are subscribed.
        let _ = self.events.send(event);
    }

    // -- Operations --------------------------------------------------------

    /// Record a stake on a concrete outcome while the pool is open.
    pub async fn place_stake(
        &self,
        staker: AccountId,
        chosen: Outcome,
        amount: Amount,
    ) -> Result<StakeId, PoolError> {
        let mut state = self.state.lock().await;

        if amount == 0 {
            return Err(PoolError::InvalidAmount);
        }
        if !chosen.is_concrete() {
            return Err(PoolError::InvalidOutcome(chosen));
        }
        if state.announced.is_concrete() {
            return Err(PoolError::AlreadySettled(state.announced));
        }

        // Both bookkeeping updates are checked before either is applied.
        let new_balance = state
            .balance
            .checked_add(amount)
            .ok_or(PoolError::Overflow("crediting the pool"))?;
        let new_total = state
            .total_for(chosen)
            .checked_add(amount)
            .ok_or(PoolError::Overflow("updating an outcome total"))?;

        let stake = Stake {
            id: uuid::Uuid::new_v4(),
            staker,
            amount,
            outcome: chosen,
            placed_at: Utc::now(),
        };
        let id = stake.id;

        state.balance = new_balance;
        state.totals.insert(chosen, new_total);

        info!(
            staker = %stake.staker,
            amount = %amount,
            outcome = %chosen,
            balance = %new_balance,
            "Stake recorded"
        );
        self.emit(PoolEvent::StakeRecorded {
            id,
            staker: stake.staker.clone(),
            amount,
            outcome: chosen,
            at: stake.placed_at,
        });
        state.stakes.push(stake);

        Ok(id)
    }

    /// Fix the winning outcome and distribute the pool to winners.
    ///
    /// One-shot: a committed announcement is irreversible. Announcing an
    /// outcome nobody staked on is valid — the outcome is recorded and
    /// the funds stay pooled ("no winners" settlement).
    ///
    /// The payout schedule is computed in full before any transfer, and
    /// the transfer batch is all-or-nothing: if it fails, nothing is
    /// committed — the announced outcome stays `Undecided` and the call
    /// may be retried once the obstacle clears.
    pub async fn announce_outcome(
        &self,
        caller: &AccountId,
        winning: Outcome,
    ) -> Result<SettlementReport, PoolError> {
        let mut state = self.state.lock().await;

        if caller != &self.admin {
            return Err(PoolError::Unauthorized(caller.clone()));
        }
        if state.announced.is_concrete() {
            return Err(PoolError::AlreadySettled(state.announced));
        }
        if !winning.is_concrete() {
            return Err(PoolError::InvalidOutcome(winning));
        }

        let pool = state.balance;
        let total_winning = state.total_for(winning);
        let payouts = payout::winning_payouts(&state.stakes, winning, pool, total_winning)?;
        let total_paid = payout::schedule_total(&payouts)?;
        debug_assert!(total_paid <= pool);

        if !payouts.is_empty() {
            self.treasury.credit_batch(&payouts).await?;
        }

        state.announced = winning;
        state.balance = pool - total_paid;

        info!(
            outcome = %winning,
            pool = %pool,
            winners = payouts.len(),
            paid = %total_paid,
            remainder = %state.balance,
            "Outcome announced"
        );

        let now = Utc::now();
        for p in &payouts {
            self.emit(PoolEvent::PayoutIssued {
                staker: p.staker.clone(),
                amount: p.amount,
                outcome: winning,
                at: now,
            });
        }

        Ok(SettlementReport {
            outcome: winning,
            pool_at_announcement: pool,
            total_winning_stake: total_winning,
            payouts,
            total_paid,
            remainder: pool - total_paid,
        })
    }

    /// Sweep the entire current balance to the administrator.
    ///
    /// Allowed at any time, including before announcement, and succeeds
    /// as a no-op at zero balance.
    pub async fn withdraw_remainder(&self, caller: &AccountId) -> Result<Amount, PoolError> {
        let mut state = self.state.lock().await;

        if caller != &self.admin {
            return Err(PoolError::Unauthorized(caller.clone()));
        }

        let amount = state.balance;
        if amount > 0 {
            self.treasury.credit(&self.admin, amount).await?;
        }
        state.balance = 0;

        info!(recipient = %self.admin, amount = %amount, "Remainder withdrawn");
        self.emit(PoolEvent::RemainderWithdrawn {
            recipient: self.admin.clone(),
            amount,
            at: Utc::now(),
        });

        Ok(amount)
    }

    // -- Read-only queries -------------------------------------------------

    /// The announced outcome (`Undecided` until announcement).
    pub async fn announced_outcome(&self) -> Outcome {
        self.state.lock().await.announced
    }

    /// Cumulative amount ever staked on an outcome (never decremented,
    /// still queryable after settlement).
    pub async fn total_for(&self, outcome: Outcome) -> Amount {
        self.state.lock().await.total_for(outcome)
    }

    /// Current pool balance.
    pub async fn balance(&self) -> Amount {
        self.state.lock().await.balance
    }

    /// Copy of the stake ledger in insertion order.
    pub async fn stakes(&self) -> Vec<Stake> {
        self.state.lock().await.stakes.clone()
    }

    /// Number of recorded stakes.
    pub async fn stake_count(&self) -> usize {
        self.state.lock().await.stakes.len()
    }

    /// Serializable image of the current pool state.
    pub async fn snapshot(&self) -> PoolSnapshot {
        let state = self.state.lock().await;
        PoolSnapshot {
            admin: self.admin.clone(),
            announced: state.announced,
            stakes: state.stakes.clone(),
            balance: state.balance,
            taken_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
