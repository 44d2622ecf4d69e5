//! Proportional payout computation.
//!
//! A pure pass over a ledger snapshot producing the full payout schedule
//! before any value moves. Each winning entry receives
//! `entry_amount * pool_balance / total_winning_stake` (floor division),
//! which scales every winner's stake by the whole pool: sole-category
//! winners recover exactly their stake, and when losers contributed,
//! winners split the losers' value in proportion to their own stakes.

use crate::types::{Amount, Outcome, Payout, PoolError, Stake};

/// Compute the payout owed to every ledger entry on the winning outcome.
///
/// Returns one payout per winning entry, in ledger (insertion) order,
/// including zero-amount entries for stakes too small to earn a whole
/// unit. An empty schedule is returned when nothing was staked on the
/// winning outcome.
pub fn winning_payouts(
    stakes: &[Stake],
    winning: Outcome,
    pool_balance: Amount,
    total_winning_stake: Amount,
) -> Result<Vec<Payout>, PoolError> {
    if total_winning_stake == 0 {
        return Ok(Vec::new());
    }

    let mut payouts = Vec::new();
    for stake in stakes.iter().filter(|s| s.outcome == winning) {
        let amount = stake
            .amount
            .checked_mul(pool_balance)
            .ok_or(PoolError::Overflow("scaling a winning stake"))?
            / total_winning_stake;
        payouts.push(Payout {
            staker: stake.staker.clone(),
            amount,
            outcome: winning,
        });
    }
    Ok(payouts)
}

/// Sum of a payout schedule.
///
/// Floor division guarantees the sum never exceeds the pool balance it
/// was computed from; the checked sum still guards the arithmetic.
pub fn schedule_total(payouts: &[Payout]) -> Result<Amount, PoolError> {
    payouts.iter().try_fold(0u128, |acc, p| {
        acc.checked_add(p.amount)
            .ok_or(PoolError::Overflow("summing the payout schedule"))
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
