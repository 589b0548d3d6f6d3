//! Set-of-administrators access control.

use std::collections::HashSet;

use disburse_core::state::Settings;
use disburse_core::traits::Authority;
use disburse_core::types::AccountId;

/// [`Authority`] backed by a fixed set of administrator accounts.
///
/// Payees may only withdraw for themselves. The fee withdrawal may be
/// triggered by the fee recipient or, when `admins_collect_fees` is set,
/// by any administrator on the recipient's behalf (the funds still go to
/// the fee recipient).
#[derive(Debug, Clone)]
pub struct AdminAuthority {
    administrators: HashSet<AccountId>,
    admins_collect_fees: bool,
}

impl AdminAuthority {
    /// A single administrator who may also trigger fee withdrawals.
    pub fn new(administrator: AccountId) -> Self {
        Self::with_administrators([administrator])
    }

    /// Several administrators.
    pub fn with_administrators<I: IntoIterator<Item = AccountId>>(admins: I) -> Self {
        Self {
            administrators: admins.into_iter().collect(),
            admins_collect_fees: true,
        }
    }

    /// The deployment's administrator with the fee policy stored in `settings`.
    pub fn for_settings(settings: &Settings) -> Self {
        let authority = Self::new(settings.administrator);
        if settings.admin_collects_fees {
            authority
        } else {
            authority.fee_recipient_only()
        }
    }

    /// Restrict fee withdrawal to the fee recipient alone.
    pub fn fee_recipient_only(mut self) -> Self {
        self.admins_collect_fees = false;
        self
    }
}

impl Authority for AdminAuthority {
    fn is_administrator(&self, caller: &AccountId) -> bool {
        self.administrators.contains(caller)
    }

    fn may_collect_fees(&self, caller: &AccountId, fee_recipient: &AccountId) -> bool {
        caller == fee_recipient || (self.admins_collect_fees && self.is_administrator(caller))
    }
}
