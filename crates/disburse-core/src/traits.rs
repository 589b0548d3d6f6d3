//! Capability interfaces consumed by the distribution engine.
//!
//! - [`Ledger`]: moves value out of custody and reports balances (an
//!   external token ledger; `disburse-engine` ships an in-memory one)
//! - [`Authority`]: decides who may perform privileged operations

use crate::error::LedgerError;
use crate::types::{AccountId, Amount};

/// External token ledger holding the distributed asset in custody.
///
/// Transfers are synchronous and all-or-nothing: `Ok(())` means the
/// recipient has been credited, an error means nothing moved.
pub trait Ledger: Send + Sync {
    /// Move `amount` of `token` from `from` (the custody account) to `to`.
    fn transfer(
        &self,
        token: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError>;

    /// Balance of `owner` in `token`.
    fn balance_of(&self, token: &AccountId, owner: &AccountId) -> Result<Amount, LedgerError>;
}

/// Access-control decisions.
pub trait Authority: Send + Sync {
    /// Whether `caller` may register payees, release batches, and change
    /// the token or fee recipient.
    fn is_administrator(&self, caller: &AccountId) -> bool;

    /// Whether `caller` may withdraw on behalf of `payee`.
    ///
    /// Default implementation: only the payee itself.
    fn may_act_for(&self, caller: &AccountId, payee: &AccountId) -> bool {
        caller == payee
    }

    /// Whether `caller` may trigger the fee withdrawal to `fee_recipient`.
    ///
    /// Default implementation: only the fee recipient itself.
    fn may_collect_fees(&self, caller: &AccountId, fee_recipient: &AccountId) -> bool {
        caller == fee_recipient
    }
}

impl<T: Ledger + ?Sized> Ledger for std::sync::Arc<T> {
    fn transfer(
        &self,
        token: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        (**self).transfer(token, from, to, amount)
    }

    fn balance_of(&self, token: &AccountId, owner: &AccountId) -> Result<Amount, LedgerError> {
        (**self).balance_of(token, owner)
    }
}
