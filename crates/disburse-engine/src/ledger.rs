//! In-memory token ledger.
//!
//! [`MemoryLedger`] keeps `(token, owner) -> balance` in a `HashMap` behind
//! a mutex. It is the custody backend for tests, benchmarks, and the
//! operator CLI's local simulation. Failure injection lets tests exercise
//! the engine's `TransferFailed` path.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use disburse_core::error::LedgerError;
use disburse_core::traits::Ledger;
use disburse_core::types::{AccountId, Amount};

/// One completed transfer, kept for inspection.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TransferRecord {
    pub token: AccountId,
    pub from: AccountId,
    pub to: AccountId,
    pub amount: Amount,
}

/// A single balance, as stored in a [`LedgerSnapshot`].
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct BalanceEntry {
    pub token: AccountId,
    pub owner: AccountId,
    pub amount: Amount,
}

/// Serializable form of a [`MemoryLedger`].
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub balances: Vec<BalanceEntry>,
    #[serde(default)]
    pub transfers: Vec<TransferRecord>,
}

#[derive(Debug, Default)]
struct Inner {
    balances: HashMap<(AccountId, AccountId), Amount>,
    transfers: Vec<TransferRecord>,
    /// Number of upcoming transfers to reject.
    pending_failures: u32,
}

#[derive(Debug, Default)]
pub struct MemoryLedger {
    inner: Mutex<Inner>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `owner` with `amount` of `token` out of thin air.
    pub fn mint(&self, token: &AccountId, owner: &AccountId, amount: Amount) -> Result<Amount, LedgerError> {
        let mut inner = self.inner.lock();
        let balance = inner.balances.entry((*token, *owner)).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Rejected("balance overflow".into()))?;
        Ok(*balance)
    }

    /// Make the next `count` transfers fail with [`LedgerError::Unavailable`].
    pub fn fail_next_transfers(&self, count: u32) {
        self.inner.lock().pending_failures = count;
    }

    /// Every successful transfer, oldest first.
    pub fn transfers(&self) -> Vec<TransferRecord> {
        self.inner.lock().transfers.clone()
    }

    /// Sum of every balance held in `token`.
    pub fn total_supply(&self, token: &AccountId) -> Amount {
        self.inner
            .lock()
            .balances
            .iter()
            .filter(|((t, _), _)| t == token)
            .map(|(_, amount)| *amount)
            .sum()
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        let inner = self.inner.lock();
        let mut balances: Vec<BalanceEntry> = inner
            .balances
            .iter()
            .map(|((token, owner), amount)| BalanceEntry {
                token: *token,
                owner: *owner,
                amount: *amount,
            })
            .collect();
        balances.sort_by(|a, b| (a.token, a.owner).cmp(&(b.token, b.owner)));
        LedgerSnapshot {
            balances,
            transfers: inner.transfers.clone(),
        }
    }

    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
        let balances = snapshot
            .balances
            .into_iter()
            .map(|e| ((e.token, e.owner), e.amount))
            .collect();
        Self {
            inner: Mutex::new(Inner {
                balances,
                transfers: snapshot.transfers,
                pending_failures: 0,
            }),
        }
    }
}

impl Ledger for MemoryLedger {
    fn transfer(
        &self,
        token: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let mut inner = self.inner.lock();
        if inner.pending_failures > 0 {
            inner.pending_failures -= 1;
            return Err(LedgerError::Unavailable("injected failure".into()));
        }

        let have = inner.balances.get(&(*token, *from)).copied().unwrap_or(0);
        if have < amount {
            return Err(LedgerError::InsufficientBalance { have, need: amount });
        }
        if from != to {
            let credit = inner
                .balances
                .get(&(*token, *to))
                .copied()
                .unwrap_or(0)
                .checked_add(amount)
                .ok_or_else(|| LedgerError::Rejected("balance overflow".into()))?;
            inner.balances.insert((*token, *from), have - amount);
            inner.balances.insert((*token, *to), credit);
        }
        inner.transfers.push(TransferRecord {
            token: *token,
            from: *from,
            to: *to,
            amount,
        });
        Ok(())
    }

    fn balance_of(&self, token: &AccountId, owner: &AccountId) -> Result<Amount, LedgerError> {
        Ok(self
            .inner
            .lock()
            .balances
            .get(&(*token, *owner))
            .copied()
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acct(seed: u8) -> AccountId {
        AccountId([seed; 20])
    }

    const TOKEN: u8 = 0x70;
    const CUSTODY: u8 = 0xC0;

    #[test]
    fn mint_and_balance() {
        let ledger = MemoryLedger::new();
        assert_eq!(ledger.mint(&acct(TOKEN), &acct(CUSTODY), 350).unwrap(), 350);
        assert_eq!(ledger.mint(&acct(TOKEN), &acct(CUSTODY), 700).unwrap(), 1_050);
        assert_eq!(ledger.balance_of(&acct(TOKEN), &acct(CUSTODY)).unwrap(), 1_050);
        assert_eq!(ledger.balance_of(&acct(0x71), &acct(CUSTODY)).unwrap(), 0);
    }

    #[test]
    fn transfer_moves_and_records() {
        let ledger = MemoryLedger::new();
        ledger.mint(&acct(TOKEN), &acct(CUSTODY), 100).unwrap();
        ledger
            .transfer(&acct(TOKEN), &acct(CUSTODY), &acct(1), 95)
            .unwrap();
        assert_eq!(ledger.balance_of(&acct(TOKEN), &acct(CUSTODY)).unwrap(), 5);
        assert_eq!(ledger.balance_of(&acct(TOKEN), &acct(1)).unwrap(), 95);
        assert_eq!(ledger.transfers().len(), 1);
        assert_eq!(ledger.total_supply(&acct(TOKEN)), 100);
    }

    #[test]
    fn transfer_insufficient_balance() {
        let ledger = MemoryLedger::new();
        ledger.mint(&acct(TOKEN), &acct(CUSTODY), 10).unwrap();
        let err = ledger
            .transfer(&acct(TOKEN), &acct(CUSTODY), &acct(1), 11)
            .unwrap_err();
        assert_eq!(err, LedgerError::InsufficientBalance { have: 10, need: 11 });
        assert!(ledger.transfers().is_empty());
    }

    #[test]
    fn injected_failures_are_consumed() {
        let ledger = MemoryLedger::new();
        ledger.mint(&acct(TOKEN), &acct(CUSTODY), 10).unwrap();
        ledger.fail_next_transfers(1);
        assert!(matches!(
            ledger.transfer(&acct(TOKEN), &acct(CUSTODY), &acct(1), 1),
            Err(LedgerError::Unavailable(_))
        ));
        ledger
            .transfer(&acct(TOKEN), &acct(CUSTODY), &acct(1), 1)
            .unwrap();
        assert_eq!(ledger.balance_of(&acct(TOKEN), &acct(1)).unwrap(), 1);
    }

    #[test]
    fn self_transfer_keeps_balance() {
        let ledger = MemoryLedger::new();
        ledger.mint(&acct(TOKEN), &acct(CUSTODY), 10).unwrap();
        ledger
            .transfer(&acct(TOKEN), &acct(CUSTODY), &acct(CUSTODY), 4)
            .unwrap();
        assert_eq!(ledger.balance_of(&acct(TOKEN), &acct(CUSTODY)).unwrap(), 10);
    }

    #[test]
    fn snapshot_restores_balances() {
        let ledger = MemoryLedger::new();
        ledger.mint(&acct(TOKEN), &acct(CUSTODY), 100).unwrap();
        ledger
            .transfer(&acct(TOKEN), &acct(CUSTODY), &acct(2), 30)
            .unwrap();
        let snap = ledger.snapshot();
        let json = serde_json::to_string(&snap).unwrap();
        let restored = MemoryLedger::from_snapshot(serde_json::from_str(&json).unwrap());
        assert_eq!(restored.balance_of(&acct(TOKEN), &acct(CUSTODY)).unwrap(), 70);
        assert_eq!(restored.balance_of(&acct(TOKEN), &acct(2)).unwrap(), 30);
        assert_eq!(restored.snapshot(), snap);
    }
}
