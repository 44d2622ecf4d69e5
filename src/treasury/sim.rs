//! Simulated value ledger.
//!
//! A deterministic `Treasury` implementation holding plain in-memory
//! account balances. Used by the binary in place of a real custody
//! backend, and by the integration harness to drive the engine and
//! observe where value ends up. Individual accounts can be marked as
//! refusing transfers to exercise failure paths.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::treasury::{TransferError, Treasury};
use crate::types::{AccountId, Amount, Payout};

/// In-memory account ledger.
///
/// Credits create accounts on first use. All mutation happens under one
/// lock so a batch credit is observed either fully applied or not at all.
pub struct SimulatedLedger {
    accounts: Mutex<HashMap<AccountId, Amount>>,
    refusing: Mutex<HashSet<AccountId>>,
}

impl SimulatedLedger {
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            refusing: Mutex::new(HashSet::new()),
        }
    }

    /// Create a ledger pre-funded with the given account balances.
    pub fn with_accounts(accounts: impl IntoIterator<Item = (AccountId, Amount)>) -> Self {
        Self {
            accounts: Mutex::new(accounts.into_iter().collect()),
            refusing: Mutex::new(HashSet::new()),
        }
    }

    /// Current balance of an account (0 if it has never been touched).
    pub async fn balance_of(&self, account: &AccountId) -> Amount {
        self.accounts.lock().await.get(account).copied().unwrap_or(0)
    }

    /// Sum of every account balance held by the ledger.
    pub async fn total_held(&self) -> Amount {
        self.accounts.lock().await.values().sum()
    }

    /// Remove `amount` from an account's custody.
    ///
    /// The harness uses this to move stake value out of a participant
    /// before recording the stake with the engine.
    pub async fn debit(&self, account: &AccountId, amount: Amount) -> Result<(), TransferError> {
        let mut accounts = self.accounts.lock().await;
        let balance = accounts.get(account).copied().unwrap_or(0);
        if balance < amount {
            return Err(TransferError::Backend(format!(
                "account {account} holds {balance}, cannot debit {amount}"
            )));
        }
        accounts.insert(account.clone(), balance - amount);
        Ok(())
    }

    /// Mark an account as refusing all incoming transfers.
    pub async fn refuse(&self, account: &AccountId) {
        self.refusing.lock().await.insert(account.clone());
    }

    /// Clear a previous refusal.
    pub async fn allow(&self, account: &AccountId) {
        self.refusing.lock().await.remove(account);
    }
}

impl Default for SimulatedLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Treasury for SimulatedLedger {
    async fn credit(&self, account: &AccountId, amount: Amount) -> Result<(), TransferError> {
        if self.refusing.lock().await.contains(account) {
            return Err(TransferError::Refused(account.clone()));
        }

        let mut accounts = self.accounts.lock().await;
        let balance = accounts.get(account).copied().unwrap_or(0);
        let updated = balance
            .checked_add(amount)
            .ok_or_else(|| TransferError::Backend(format!("account {account} balance overflow")))?;
        accounts.insert(account.clone(), updated);

        debug!(account = %account, amount = %amount, "Credit applied");
        Ok(())
    }

    async fn credit_batch(&self, payouts: &[Payout]) -> Result<(), TransferError> {
        let refusing = self.refusing.lock().await;
        let mut accounts = self.accounts.lock().await;

        // Validate every destination before touching any balance.
        for payout in payouts {
            if refusing.contains(&payout.staker) {
                return Err(TransferError::Refused(payout.staker.clone()));
            }
            let balance = accounts.get(&payout.staker).copied().unwrap_or(0);
            if balance.checked_add(payout.amount).is_none() {
                return Err(TransferError::Backend(format!(
                    "account {} balance overflow",
                    payout.staker
                )));
            }
        }

        for payout in payouts {
            let balance = accounts.get(&payout.staker).copied().unwrap_or(0);
            accounts.insert(payout.staker.clone(), balance + payout.amount);
        }

        debug!(count = payouts.len(), "Batch credit applied");
        Ok(())
    }

    fn name(&self) -> &str {
        "simulated-ledger"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
