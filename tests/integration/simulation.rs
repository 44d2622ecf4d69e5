//! End-to-end settlement scenarios.
//!
//! Each test funds participant accounts on the simulated ledger, moves
//! stake value into the pool, runs a full settlement lifecycle, and
//! checks where every unit of value ended up. The total value in the
//! system (ledger accounts + pool balance) must be constant throughout.

use std::sync::Arc;

use tote::engine::SettlementEngine;
use tote::treasury::SimulatedLedger;
use tote::types::{AccountId, Amount, Outcome, PoolError, PoolEvent};

/// One whole unit of value, 18 decimals of subdivision.
const UNIT: Amount = 1_000_000_000_000_000_000;

struct Harness {
    ledger: Arc<SimulatedLedger>,
    engine: SettlementEngine,
    admin: AccountId,
}

impl Harness {
    fn new(funded: &[(&str, Amount)]) -> Self {
        let accounts = funded
            .iter()
            .map(|(name, amount)| (AccountId::new(*name), *amount));
        let ledger = Arc::new(SimulatedLedger::with_accounts(accounts));
        let admin = AccountId::new("house");
        let engine = SettlementEngine::new(admin.clone(), ledger.clone());
        Self { ledger, engine, admin }
    }

    /// Move stake value out of the participant's account and record it.
    async fn stake(&self, who: &str, outcome: Outcome, amount: Amount) {
        let staker = AccountId::new(who);
        self.ledger.debit(&staker, amount).await.unwrap();
        self.engine.place_stake(staker, outcome, amount).await.unwrap();
    }

    /// Total value in the system: ledger custody plus the pool.
    async fn system_total(&self) -> Amount {
        self.ledger.total_held().await + self.engine.balance().await
    }

    async fn balance_of(&self, who: &str) -> Amount {
        self.ledger.balance_of(&AccountId::new(who)).await
    }
}

#[tokio::test]
async fn test_winners_get_their_stakes_back() {
    // alice 1 unit and bob 0.5 units, both on Team A; Team A wins.
    // The pool equals the winning total, so both recover exactly
    // their own stake.
    let h = Harness::new(&[("alice", 2 * UNIT), ("bob", UNIT)]);

    h.stake("alice", Outcome::TeamA, UNIT).await;
    h.stake("bob", Outcome::TeamA, UNIT / 2).await;
    assert_eq!(h.engine.balance().await, UNIT + UNIT / 2);

    let report = h.engine.announce_outcome(&h.admin, Outcome::TeamA).await.unwrap();

    assert_eq!(report.total_paid, UNIT + UNIT / 2);
    assert_eq!(h.balance_of("alice").await, 2 * UNIT);
    assert_eq!(h.balance_of("bob").await, UNIT);
    assert_eq!(h.engine.balance().await, 0);
}

#[tokio::test]
async fn test_losing_side_receives_nothing() {
    // Everyone staked Team A; Team B is announced. No payouts, funds
    // stay pooled.
    let h = Harness::new(&[("alice", 2 * UNIT), ("bob", UNIT)]);

    h.stake("alice", Outcome::TeamA, UNIT).await;
    h.stake("bob", Outcome::TeamA, UNIT / 2).await;

    let report = h.engine.announce_outcome(&h.admin, Outcome::TeamB).await.unwrap();

    assert!(report.payouts.is_empty());
    assert_eq!(h.balance_of("alice").await, UNIT);
    assert_eq!(h.balance_of("bob").await, UNIT / 2);
    assert_eq!(h.engine.balance().await, UNIT + UNIT / 2);
    assert_eq!(h.engine.announced_outcome().await, Outcome::TeamB);
}

#[tokio::test]
async fn test_admin_sweeps_unclaimed_pool() {
    // No winners, then the administrator withdraws the whole pool.
    let h = Harness::new(&[("alice", UNIT)]);

    h.stake("alice", Outcome::TeamA, UNIT).await;
    h.engine.announce_outcome(&h.admin, Outcome::TeamB).await.unwrap();

    let withdrawn = h.engine.withdraw_remainder(&h.admin).await.unwrap();

    assert_eq!(withdrawn, UNIT);
    assert_eq!(h.balance_of("house").await, UNIT);
    assert_eq!(h.engine.balance().await, 0);
}

#[tokio::test]
async fn test_winners_take_losers_value_pro_rata() {
    let h = Harness::new(&[("alice", 100), ("bob", 50), ("carol", 60)]);

    h.stake("alice", Outcome::TeamA, 100).await;
    h.stake("bob", Outcome::TeamA, 50).await;
    h.stake("carol", Outcome::TeamB, 60).await;

    h.engine.announce_outcome(&h.admin, Outcome::TeamA).await.unwrap();

    // Pool 210 split across the 150 winning units: alice 140, bob 70.
    assert_eq!(h.balance_of("alice").await, 140);
    assert_eq!(h.balance_of("bob").await, 70);
    assert_eq!(h.balance_of("carol").await, 0);
    assert_eq!(h.engine.balance().await, 0);
}

#[tokio::test]
async fn test_value_conserved_across_full_lifecycle() {
    let h = Harness::new(&[("alice", 100), ("bob", 50), ("carol", 61)]);
    let initial = h.system_total().await;

    h.stake("alice", Outcome::TeamA, 100).await;
    assert_eq!(h.system_total().await, initial);

    h.stake("bob", Outcome::Draw, 50).await;
    assert_eq!(h.system_total().await, initial);

    h.stake("carol", Outcome::TeamA, 61).await;
    assert_eq!(h.system_total().await, initial);

    h.engine.announce_outcome(&h.admin, Outcome::TeamA).await.unwrap();
    assert_eq!(h.system_total().await, initial);

    h.engine.withdraw_remainder(&h.admin).await.unwrap();
    assert_eq!(h.system_total().await, initial);
    assert_eq!(h.engine.balance().await, 0);
}

#[tokio::test]
async fn test_stake_ledger_survives_settlement() {
    // A losing stake's recorded total stays queryable before and after
    // the announcement; the ledger is consumed, not deleted.
    let h = Harness::new(&[("alice", 100)]);

    h.stake("alice", Outcome::Draw, 100).await;
    assert_eq!(h.engine.total_for(Outcome::Draw).await, 100);
    assert_eq!(h.engine.stake_count().await, 1);

    h.engine.announce_outcome(&h.admin, Outcome::TeamA).await.unwrap();

    assert_eq!(h.engine.total_for(Outcome::Draw).await, 100);
    assert_eq!(h.engine.stake_count().await, 1);
    let stakes = h.engine.stakes().await;
    assert_eq!(stakes[0].staker, AccountId::new("alice"));
    assert_eq!(stakes[0].amount, 100);
}

#[tokio::test]
async fn test_non_admin_calls_rejected_end_to_end() {
    let h = Harness::new(&[("alice", 100)]);
    h.stake("alice", Outcome::TeamA, 100).await;

    let alice = AccountId::new("alice");
    let announce = h.engine.announce_outcome(&alice, Outcome::TeamA).await;
    assert!(matches!(announce, Err(PoolError::Unauthorized(_))));

    let withdraw = h.engine.withdraw_remainder(&alice).await;
    assert!(matches!(withdraw, Err(PoolError::Unauthorized(_))));

    // State untouched by either rejection.
    assert_eq!(h.engine.balance().await, 100);
    assert_eq!(h.engine.announced_outcome().await, Outcome::Undecided);
}

#[tokio::test]
async fn test_notification_stream_over_full_lifecycle() {
    let h = Harness::new(&[("alice", 100), ("bob", 40)]);
    let mut events = h.engine.subscribe();

    h.stake("alice", Outcome::TeamA, 100).await;
    h.stake("bob", Outcome::TeamB, 40).await;
    h.engine.announce_outcome(&h.admin, Outcome::TeamA).await.unwrap();
    h.engine.withdraw_remainder(&h.admin).await.unwrap();

    let mut kinds = Vec::new();
    while let Ok(event) = events.try_recv() {
        kinds.push(match event {
            PoolEvent::StakeRecorded { .. } => "stake",
            PoolEvent::PayoutIssued { .. } => "payout",
            PoolEvent::RemainderWithdrawn { .. } => "withdraw",
        });
    }
    assert_eq!(kinds, vec!["stake", "stake", "payout", "withdraw"]);
}
