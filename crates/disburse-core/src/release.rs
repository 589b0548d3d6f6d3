//! Release counter and global claim totals.
//!
//! `released_percent` is the cumulative fraction of the total investment
//! made available for withdrawal. It only moves forward, in positive
//! whole-percent steps, and never past 100. The counter is decoupled from
//! the physical funding schedule: it says how much payees are entitled to,
//! not how much custody currently holds.

use serde::{Deserialize, Serialize};

use crate::constants::MAX_RELEASED_PERCENT;
use crate::error::ReleaseError;
use crate::types::Amount;

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ReleaseLedger {
    released_percent: u8,
    total_claimed: Amount,
    fee_recipient_claimed: Amount,
}

impl ReleaseLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn released_percent(&self) -> u8 {
        self.released_percent
    }

    /// Everything ever transferred out, to payees and the fee recipient.
    pub fn total_claimed(&self) -> Amount {
        self.total_claimed
    }

    pub fn fee_recipient_claimed(&self) -> Amount {
        self.fee_recipient_claimed
    }

    /// Whether the full investment has been released.
    pub fn is_complete(&self) -> bool {
        self.released_percent == MAX_RELEASED_PERCENT
    }

    /// Percentage points still to be released.
    pub fn remaining_percent(&self) -> u8 {
        MAX_RELEASED_PERCENT - self.released_percent
    }

    /// Check a release step without applying it.
    ///
    /// # Errors
    ///
    /// - [`ReleaseError::InvalidDelta`] if `delta` is zero
    /// - [`ReleaseError::NoPayeesRegistered`] if `total_shares` is zero
    /// - [`ReleaseError::ReleaseOverflow`] if the counter would pass 100
    pub fn check_advance(&self, delta: u8, total_shares: u64) -> Result<u8, ReleaseError> {
        if delta == 0 {
            return Err(ReleaseError::InvalidDelta);
        }
        if total_shares == 0 {
            return Err(ReleaseError::NoPayeesRegistered);
        }
        match self.released_percent.checked_add(delta) {
            Some(next) if next <= MAX_RELEASED_PERCENT => Ok(next),
            _ => Err(ReleaseError::ReleaseOverflow {
                current: self.released_percent,
                delta,
            }),
        }
    }

    /// Advance the counter by `delta` percentage points.
    ///
    /// Leaves the counter unchanged on error.
    pub fn advance(&mut self, delta: u8, total_shares: u64) -> Result<u8, ReleaseError> {
        let next = self.check_advance(delta, total_shares)?;
        self.released_percent = next;
        Ok(next)
    }

    /// Account for a payee payout. Returns the new global total.
    pub(crate) fn record_payee_claim(&mut self, amount: Amount) -> Option<Amount> {
        self.total_claimed = self.total_claimed.checked_add(amount)?;
        Some(self.total_claimed)
    }

    /// Account for a fee payout. Returns the fee recipient's new total.
    pub(crate) fn record_fee_claim(&mut self, amount: Amount) -> Option<Amount> {
        let fee_total = self.fee_recipient_claimed.checked_add(amount)?;
        let total = self.total_claimed.checked_add(amount)?;
        self.fee_recipient_claimed = fee_total;
        self.total_claimed = total;
        Some(fee_total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        let ledger = ReleaseLedger::new();
        assert_eq!(ledger.released_percent(), 0);
        assert_eq!(ledger.total_claimed(), 0);
        assert_eq!(ledger.fee_recipient_claimed(), 0);
        assert_eq!(ledger.remaining_percent(), 100);
        assert!(!ledger.is_complete());
    }

    #[test]
    fn advance_accumulates() {
        let mut ledger = ReleaseLedger::new();
        assert_eq!(ledger.advance(10, 1).unwrap(), 10);
        assert_eq!(ledger.advance(20, 1).unwrap(), 30);
        assert_eq!(ledger.advance(30, 1).unwrap(), 60);
        assert_eq!(ledger.released_percent(), 60);
    }

    #[test]
    fn advance_to_exactly_100() {
        let mut ledger = ReleaseLedger::new();
        ledger.advance(60, 1).unwrap();
        assert_eq!(ledger.advance(40, 1).unwrap(), 100);
        assert!(ledger.is_complete());
        assert_eq!(ledger.remaining_percent(), 0);
    }

    #[test]
    fn advance_past_100_fails_and_leaves_state() {
        let mut ledger = ReleaseLedger::new();
        ledger.advance(90, 1).unwrap();
        let err = ledger.advance(11, 1).unwrap_err();
        assert_eq!(err, ReleaseError::ReleaseOverflow { current: 90, delta: 11 });
        assert_eq!(ledger.released_percent(), 90);
    }

    #[test]
    fn advance_u8_wraparound_is_overflow() {
        let mut ledger = ReleaseLedger::new();
        ledger.advance(100, 1).unwrap();
        let err = ledger.advance(u8::MAX, 1).unwrap_err();
        assert_eq!(err, ReleaseError::ReleaseOverflow { current: 100, delta: 255 });
    }

    #[test]
    fn advance_zero_is_invalid() {
        let mut ledger = ReleaseLedger::new();
        assert_eq!(ledger.advance(0, 1).unwrap_err(), ReleaseError::InvalidDelta);
    }

    #[test]
    fn advance_without_payees_fails() {
        let mut ledger = ReleaseLedger::new();
        assert_eq!(
            ledger.advance(10, 0).unwrap_err(),
            ReleaseError::NoPayeesRegistered
        );
        assert_eq!(ledger.released_percent(), 0);
    }

    #[test]
    fn claims_update_totals() {
        let mut ledger = ReleaseLedger::new();
        assert_eq!(ledger.record_payee_claim(95), Some(95));
        assert_eq!(ledger.record_fee_claim(5), Some(5));
        assert_eq!(ledger.total_claimed(), 100);
        assert_eq!(ledger.fee_recipient_claimed(), 5);
    }

    #[test]
    fn claim_overflow_leaves_totals() {
        let mut ledger = ReleaseLedger::new();
        ledger.record_payee_claim(u128::MAX).unwrap();
        assert_eq!(ledger.record_fee_claim(1), None);
        assert_eq!(ledger.fee_recipient_claimed(), 0);
        assert_eq!(ledger.total_claimed(), u128::MAX);
    }
}
