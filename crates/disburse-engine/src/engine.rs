//! The distribution engine.
//!
//! [`DistributionEngine`] owns a [`DistributionState`] behind a
//! `parking_lot::RwLock`. Queries take the read lock. Every mutation takes
//! the write lock for its whole duration, including the synchronous ledger
//! transfer, so a withdrawal observes exactly one value of the release
//! counter and its counter updates land together with the transfer or not
//! at all.
//!
//! The engine is `Send + Sync`; share it across threads with `Arc`.

use parking_lot::RwLock;
use tracing::{debug, error, info, warn};

use disburse_core::error::{ClaimError, DisburseError};
use disburse_core::registry::PayeeRegistry;
use disburse_core::state::{DistributionState, PendingWithdrawal, Settings};
use disburse_core::traits::{Authority, Ledger};
use disburse_core::types::{
    AccountId, Amount, ClaimStatus, PayeeId, PayeeSpec, PayeeView, Payout,
};

pub struct DistributionEngine<L, A> {
    state: RwLock<DistributionState>,
    ledger: L,
    authority: A,
}

impl<L: Ledger, A: Authority> DistributionEngine<L, A> {
    /// Create an engine with no payees and nothing released.
    pub fn new(settings: Settings, ledger: L, authority: A) -> Self {
        info!(
            investment = %settings.investment_name,
            administrator = %settings.administrator,
            custody = %settings.custody,
            fee_recipient = %settings.fee_recipient,
            "distribution engine created"
        );
        Self {
            state: RwLock::new(DistributionState::new(settings)),
            ledger,
            authority,
        }
    }

    /// Restore an engine from a snapshot, refusing state that breaks any
    /// accounting invariant.
    pub fn from_state(state: DistributionState, ledger: L, authority: A) -> Result<Self, DisburseError> {
        state.verify()?;
        info!(
            investment = %state.settings.investment_name,
            payees = state.registry().len(),
            released_percent = state.release().released_percent(),
            total_claimed = state.release().total_claimed(),
            "distribution engine restored"
        );
        Ok(Self {
            state: RwLock::new(state),
            ledger,
            authority,
        })
    }

    /// Clone of the current state.
    pub fn snapshot(&self) -> DistributionState {
        self.state.read().clone()
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn authority(&self) -> &A {
        &self.authority
    }

    fn require_admin(&self, caller: &AccountId, action: &'static str) -> Result<(), DisburseError> {
        if self.authority.is_administrator(caller) {
            Ok(())
        } else {
            warn!(%caller, action, "unauthorized");
            Err(DisburseError::Unauthorized {
                caller: *caller,
                action,
            })
        }
    }

    // ------------------------------------------------------------------
    // Registry
    // ------------------------------------------------------------------

    /// Register one payee.
    pub fn register_payee(
        &self,
        caller: &AccountId,
        account: AccountId,
        shares: u64,
        fee_rate: u8,
    ) -> Result<PayeeId, DisburseError> {
        let mut ids = self.register_specs(caller, &[PayeeSpec::new(account, shares, fee_rate)])?;
        Ok(ids.remove(0))
    }

    /// Register payees from parallel arrays, atomically.
    pub fn register_payees(
        &self,
        caller: &AccountId,
        accounts: &[AccountId],
        shares: &[u64],
        fee_rates: &[u8],
    ) -> Result<Vec<PayeeId>, DisburseError> {
        self.require_admin(caller, "register payees")?;
        let specs = PayeeRegistry::zip_batch(accounts, shares, fee_rates)?;
        self.insert_payees(&specs)
    }

    /// Register payees from specs, atomically.
    pub fn register_specs(
        &self,
        caller: &AccountId,
        specs: &[PayeeSpec],
    ) -> Result<Vec<PayeeId>, DisburseError> {
        self.require_admin(caller, "register payees")?;
        self.insert_payees(specs)
    }

    fn insert_payees(&self, specs: &[PayeeSpec]) -> Result<Vec<PayeeId>, DisburseError> {
        let mut state = self.state.write();
        let ids = state.register(specs)?;
        for (spec, id) in specs.iter().zip(&ids) {
            info!(
                payee = %spec.account,
                id = %id,
                shares = spec.shares,
                fee_rate = spec.fee_rate,
                "payee registered"
            );
        }
        debug!(total_shares = state.registry().total_shares(), "registry updated");
        Ok(ids)
    }

    // ------------------------------------------------------------------
    // Release
    // ------------------------------------------------------------------

    /// Advance the release counter by `delta` percentage points.
    pub fn advance_release(&self, caller: &AccountId, delta: u8) -> Result<u8, DisburseError> {
        self.require_admin(caller, "advance release")?;
        let mut state = self.state.write();
        let released_percent = state.advance_release(delta)?;
        info!(delta, released_percent, "release advanced");
        Ok(released_percent)
    }

    // ------------------------------------------------------------------
    // Withdrawals
    // ------------------------------------------------------------------

    /// Pay `payee` everything it is currently owed.
    ///
    /// # Errors
    ///
    /// - [`DisburseError::Unauthorized`] unless the authority lets `caller`
    ///   act for `payee`
    /// - `UnknownPayee`, `NothingToClaim`, `TokenNotConfigured`
    /// - `TransferFailed` if the ledger refuses; nothing is recorded and
    ///   the call can be retried
    pub fn withdraw(&self, caller: &AccountId, payee: &AccountId) -> Result<Payout, DisburseError> {
        if !self.authority.may_act_for(caller, payee) {
            warn!(%caller, %payee, "unauthorized withdrawal");
            return Err(DisburseError::Unauthorized {
                caller: *caller,
                action: "withdraw for this payee",
            });
        }
        let mut state = self.state.write();
        let pending = match state.prepare_withdrawal(payee) {
            Ok(p) => p,
            Err(e) if e.is_benign() => {
                debug!(%payee, "nothing to claim");
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        let payout = self.settle(&mut state, &pending)?;
        info!(
            %payee,
            amount = payout.amount,
            claimed = payout.claimed,
            total_claimed = payout.total_claimed,
            released_percent = payout.released_percent,
            "payee withdrawal"
        );
        Ok(payout)
    }

    /// Pay the fee recipient all fees accrued so far.
    pub fn withdraw_fees(&self, caller: &AccountId) -> Result<Payout, DisburseError> {
        let mut state = self.state.write();
        let fee_recipient = state.settings.fee_recipient;
        if !self.authority.may_collect_fees(caller, &fee_recipient) {
            warn!(%caller, %fee_recipient, "unauthorized fee withdrawal");
            return Err(DisburseError::Unauthorized {
                caller: *caller,
                action: "withdraw fees",
            });
        }
        let pending = match state.prepare_fee_withdrawal() {
            Ok(p) => p,
            Err(e) if e.is_benign() => {
                debug!(%fee_recipient, "no fees to claim");
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        let payout = self.settle(&mut state, &pending)?;
        info!(
            %fee_recipient,
            amount = payout.amount,
            fees_claimed = payout.claimed,
            total_claimed = payout.total_claimed,
            released_percent = payout.released_percent,
            "fee withdrawal"
        );
        Ok(payout)
    }

    /// Transfer a prepared withdrawal and record it. Caller holds the
    /// write lock the withdrawal was prepared under.
    fn settle(
        &self,
        state: &mut DistributionState,
        pending: &PendingWithdrawal,
    ) -> Result<Payout, DisburseError> {
        let token = state
            .settings
            .token_address
            .ok_or(ClaimError::TokenNotConfigured)?;
        let custody = state.settings.custody;
        if let Err(reason) = self
            .ledger
            .transfer(&token, &custody, &pending.recipient, pending.amount)
        {
            warn!(
                to = %pending.recipient,
                amount = pending.amount,
                released_percent = pending.released_percent,
                %reason,
                "transfer failed"
            );
            return Err(ClaimError::TransferFailed {
                to: pending.recipient,
                amount: pending.amount,
                reason,
            }
            .into());
        }
        state.commit(pending).map_err(|e| {
            // Unreachable in practice: prepare pre-checks every counter.
            error!(to = %pending.recipient, amount = pending.amount, %e, "transfer succeeded but commit failed");
            DisburseError::from(e)
        })
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    pub fn set_fee_recipient(&self, caller: &AccountId, fee_recipient: AccountId) -> Result<(), DisburseError> {
        self.require_admin(caller, "set fee recipient")?;
        let mut state = self.state.write();
        let previous = std::mem::replace(&mut state.settings.fee_recipient, fee_recipient);
        info!(%previous, %fee_recipient, "fee recipient changed");
        Ok(())
    }

    /// Point the engine at a different token. Claimed amounts are abstract
    /// units and carry over unchanged.
    pub fn set_token_address(&self, caller: &AccountId, token: Option<AccountId>) -> Result<(), DisburseError> {
        self.require_admin(caller, "set token address")?;
        let mut state = self.state.write();
        state.settings.token_address = token;
        match token {
            Some(token) => info!(%token, "token address changed"),
            None => info!("token address cleared"),
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn payee_at(&self, index: usize) -> Result<AccountId, DisburseError> {
        Ok(self.state.read().registry().payee_at(index)?.account)
    }

    pub fn payee_count(&self) -> usize {
        self.state.read().registry().len()
    }

    pub fn share_of(&self, account: &AccountId) -> Result<u64, DisburseError> {
        Ok(self.state.read().registry().get(account)?.shares)
    }

    pub fn fee_rate_of(&self, account: &AccountId) -> Result<u8, DisburseError> {
        Ok(self.state.read().registry().get(account)?.fee_rate)
    }

    pub fn claimed_of(&self, account: &AccountId) -> Result<Amount, DisburseError> {
        Ok(self.state.read().registry().get(account)?.claimed)
    }

    pub fn total_shares(&self) -> u64 {
        self.state.read().registry().total_shares()
    }

    pub fn total_claimed(&self) -> Amount {
        self.state.read().release().total_claimed()
    }

    pub fn released_percent(&self) -> u8 {
        self.state.read().release().released_percent()
    }

    pub fn fee_recipient(&self) -> AccountId {
        self.state.read().settings.fee_recipient
    }

    pub fn fee_recipient_claimed(&self) -> Amount {
        self.state.read().release().fee_recipient_claimed()
    }

    pub fn token_address(&self) -> Option<AccountId> {
        self.state.read().settings.token_address
    }

    pub fn investment_name(&self) -> String {
        self.state.read().settings.investment_name.clone()
    }

    pub fn administrator(&self) -> AccountId {
        self.state.read().settings.administrator
    }

    pub fn custody(&self) -> AccountId {
        self.state.read().settings.custody
    }

    pub fn total_investment(&self) -> Amount {
        self.state.read().total_investment()
    }

    /// Net amount `account` could withdraw right now.
    pub fn pending(&self, account: &AccountId) -> Result<Amount, DisburseError> {
        self.state.read().pending(account)
    }

    /// Fee amount the fee recipient could withdraw right now.
    pub fn pending_fees(&self) -> Result<Amount, DisburseError> {
        Ok(self.state.read().pending_fees()?)
    }

    pub fn claim_status(&self, account: &AccountId) -> Result<ClaimStatus, DisburseError> {
        self.state.read().claim_status(account)
    }

    /// All payees in registration order with their current entitlement.
    pub fn payees(&self) -> Result<Vec<PayeeView>, DisburseError> {
        Ok(self.state.read().payee_views()?)
    }

    /// Everything withdrawable right now, payees and fees together.
    pub fn outstanding_liability(&self) -> Result<Amount, DisburseError> {
        Ok(self.state.read().outstanding_liability()?)
    }

    /// Custody's ledger balance in the configured token.
    pub fn custody_balance(&self) -> Result<Amount, DisburseError> {
        let (token, custody) = {
            let state = self.state.read();
            (state.settings.token_address, state.settings.custody)
        };
        let token = token.ok_or(ClaimError::TokenNotConfigured)?;
        Ok(self.ledger.balance_of(&token, &custody)?)
    }

    /// Re-check every accounting invariant against the live state.
    pub fn verify(&self) -> Result<(), DisburseError> {
        Ok(self.state.read().verify()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::AdminAuthority;
    use crate::ledger::MemoryLedger;
    use disburse_core::error::{LedgerError, RegistryError, ReleaseError};
    use std::sync::Arc;

    fn acct(seed: u8) -> AccountId {
        AccountId([seed; 20])
    }

    const ADMIN: u8 = 0xAD;
    const CUSTODY: u8 = 0xC0;
    const TOKEN: u8 = 0x70;
    const FEES: u8 = 0xFE;

    type Engine = DistributionEngine<Arc<MemoryLedger>, AdminAuthority>;

    fn engine() -> (Engine, Arc<MemoryLedger>) {
        let ledger = Arc::new(MemoryLedger::new());
        ledger.mint(&acct(TOKEN), &acct(CUSTODY), 1_000_000).unwrap();
        let mut settings = Settings::new(acct(ADMIN), acct(CUSTODY));
        settings.token_address = Some(acct(TOKEN));
        settings.fee_recipient = acct(FEES);
        let engine = DistributionEngine::new(settings, Arc::clone(&ledger), AdminAuthority::new(acct(ADMIN)));
        (engine, ledger)
    }

    fn with_payees() -> (Engine, Arc<MemoryLedger>) {
        let (engine, ledger) = engine();
        engine
            .register_payees(
                &acct(ADMIN),
                &[acct(1), acct(2), acct(3)],
                &[1_000, 500, 2_000],
                &[5, 10, 0],
            )
            .unwrap();
        (engine, ledger)
    }

    // ------------------------------------------------------------------
    // authorization
    // ------------------------------------------------------------------

    #[test]
    fn non_admin_cannot_register() {
        let (engine, _) = engine();
        let err = engine.register_payee(&acct(1), acct(1), 10, 0).unwrap_err();
        assert!(matches!(err, DisburseError::Unauthorized { .. }));
        assert_eq!(engine.payee_count(), 0);
    }

    #[test]
    fn batch_registration_checks_capability_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct Counting(AtomicUsize);
        impl Authority for Counting {
            fn is_administrator(&self, _caller: &AccountId) -> bool {
                self.0.fetch_add(1, Ordering::SeqCst);
                true
            }
        }

        let engine = DistributionEngine::new(
            Settings::new(acct(ADMIN), acct(CUSTODY)),
            MemoryLedger::new(),
            Counting(AtomicUsize::new(0)),
        );
        engine
            .register_payees(&acct(ADMIN), &[acct(1), acct(2)], &[10, 20], &[0, 5])
            .unwrap();
        assert_eq!(engine.authority().0.load(Ordering::SeqCst), 1);
        engine.register_specs(&acct(ADMIN), &[PayeeSpec::new(acct(3), 1, 0)]).unwrap();
        assert_eq!(engine.authority().0.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn non_admin_cannot_release() {
        let (engine, _) = with_payees();
        let err = engine.advance_release(&acct(1), 10).unwrap_err();
        assert!(matches!(err, DisburseError::Unauthorized { .. }));
        assert_eq!(engine.released_percent(), 0);
    }

    #[test]
    fn non_admin_cannot_reconfigure() {
        let (engine, _) = engine();
        assert!(engine.set_fee_recipient(&acct(1), acct(1)).is_err());
        assert!(engine.set_token_address(&acct(1), None).is_err());
        assert_eq!(engine.fee_recipient(), acct(FEES));
        assert_eq!(engine.token_address(), Some(acct(TOKEN)));
    }

    #[test]
    fn payee_cannot_withdraw_for_another() {
        let (engine, _) = with_payees();
        engine.advance_release(&acct(ADMIN), 10).unwrap();
        let err = engine.withdraw(&acct(2), &acct(1)).unwrap_err();
        assert!(matches!(err, DisburseError::Unauthorized { .. }));
        assert_eq!(engine.claimed_of(&acct(1)).unwrap(), 0);
    }

    #[test]
    fn stranger_cannot_withdraw_fees() {
        let (engine, _) = with_payees();
        engine.advance_release(&acct(ADMIN), 10).unwrap();
        let err = engine.withdraw_fees(&acct(1)).unwrap_err();
        assert!(matches!(err, DisburseError::Unauthorized { .. }));
    }

    // ------------------------------------------------------------------
    // registry through the engine
    // ------------------------------------------------------------------

    #[test]
    fn registration_queries() {
        let (engine, _) = with_payees();
        assert_eq!(engine.payee_at(0).unwrap(), acct(1));
        assert_eq!(engine.payee_at(2).unwrap(), acct(3));
        assert_eq!(engine.share_of(&acct(2)).unwrap(), 500);
        assert_eq!(engine.fee_rate_of(&acct(1)).unwrap(), 5);
        assert_eq!(engine.claimed_of(&acct(3)).unwrap(), 0);
        assert_eq!(engine.total_shares(), 3_500);
        assert_eq!(engine.total_claimed(), 0);
    }

    #[test]
    fn batch_length_mismatch() {
        let (engine, _) = engine();
        let err = engine
            .register_payees(&acct(ADMIN), &[acct(1)], &[1, 2], &[0])
            .unwrap_err();
        assert!(matches!(
            err,
            DisburseError::Registry(RegistryError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn duplicate_registration_rejected() {
        let (engine, _) = with_payees();
        let err = engine.register_payee(&acct(ADMIN), acct(2), 1, 0).unwrap_err();
        assert_eq!(err, DisburseError::Registry(RegistryError::DuplicatePayee(acct(2))));
        assert_eq!(engine.total_shares(), 3_500);
    }

    // ------------------------------------------------------------------
    // release
    // ------------------------------------------------------------------

    #[test]
    fn release_overflow_leaves_counter() {
        let (engine, _) = with_payees();
        engine.advance_release(&acct(ADMIN), 95).unwrap();
        let err = engine.advance_release(&acct(ADMIN), 6).unwrap_err();
        assert_eq!(
            err,
            DisburseError::Release(ReleaseError::ReleaseOverflow { current: 95, delta: 6 })
        );
        assert_eq!(engine.released_percent(), 95);
    }

    #[test]
    fn release_without_payees() {
        let (engine, _) = engine();
        let err = engine.advance_release(&acct(ADMIN), 10).unwrap_err();
        assert_eq!(err, DisburseError::Release(ReleaseError::NoPayeesRegistered));
    }

    // ------------------------------------------------------------------
    // withdraw
    // ------------------------------------------------------------------

    #[test]
    fn withdraw_transfers_net_amount() {
        let (engine, ledger) = with_payees();
        engine.advance_release(&acct(ADMIN), 10).unwrap();
        let payout = engine.withdraw(&acct(2), &acct(2)).unwrap();
        assert_eq!(payout.amount, 45);
        assert_eq!(ledger.balance_of(&acct(TOKEN), &acct(2)).unwrap(), 45);
        assert_eq!(engine.claimed_of(&acct(2)).unwrap(), 45);
        assert_eq!(engine.total_claimed(), 45);
        engine.verify().unwrap();
    }

    #[test]
    fn second_withdraw_is_nothing_to_claim() {
        let (engine, ledger) = with_payees();
        engine.advance_release(&acct(ADMIN), 10).unwrap();
        engine.withdraw(&acct(1), &acct(1)).unwrap();
        let before = engine.snapshot();
        let err = engine.withdraw(&acct(1), &acct(1)).unwrap_err();
        assert!(err.is_benign());
        assert_eq!(engine.snapshot(), before);
        assert_eq!(ledger.transfers().len(), 1);
    }

    #[test]
    fn withdraw_unknown_payee() {
        let (engine, _) = with_payees();
        engine.advance_release(&acct(ADMIN), 10).unwrap();
        let err = engine.withdraw(&acct(9), &acct(9)).unwrap_err();
        assert_eq!(err, DisburseError::Registry(RegistryError::UnknownPayee(acct(9))));
    }

    #[test]
    fn transfer_failure_mutates_nothing_and_retry_succeeds() {
        let (engine, ledger) = with_payees();
        engine.advance_release(&acct(ADMIN), 10).unwrap();
        ledger.fail_next_transfers(1);
        let before = engine.snapshot();
        let err = engine.withdraw(&acct(3), &acct(3)).unwrap_err();
        assert!(err.is_retryable());
        assert!(matches!(
            err,
            DisburseError::Claim(ClaimError::TransferFailed { amount: 200, reason: LedgerError::Unavailable(_), .. })
        ));
        assert_eq!(engine.snapshot(), before);

        let payout = engine.withdraw(&acct(3), &acct(3)).unwrap();
        assert_eq!(payout.amount, 200);
    }

    #[test]
    fn underfunded_custody_is_transfer_failure() {
        let ledger = Arc::new(MemoryLedger::new());
        ledger.mint(&acct(TOKEN), &acct(CUSTODY), 10).unwrap();
        let mut settings = Settings::new(acct(ADMIN), acct(CUSTODY));
        settings.token_address = Some(acct(TOKEN));
        let engine = DistributionEngine::new(settings, Arc::clone(&ledger), AdminAuthority::new(acct(ADMIN)));
        engine.register_payee(&acct(ADMIN), acct(1), 1_000, 0).unwrap();
        engine.advance_release(&acct(ADMIN), 10).unwrap();
        let err = engine.withdraw(&acct(1), &acct(1)).unwrap_err();
        assert!(matches!(
            err,
            DisburseError::Claim(ClaimError::TransferFailed {
                reason: LedgerError::InsufficientBalance { have: 10, need: 100 },
                ..
            })
        ));
        assert_eq!(engine.claimed_of(&acct(1)).unwrap(), 0);
    }

    #[test]
    fn withdraw_requires_token() {
        let (engine, _) = with_payees();
        engine.set_token_address(&acct(ADMIN), None).unwrap();
        engine.advance_release(&acct(ADMIN), 10).unwrap();
        let err = engine.withdraw(&acct(1), &acct(1)).unwrap_err();
        assert_eq!(err, DisburseError::Claim(ClaimError::TokenNotConfigured));
        assert_eq!(engine.total_claimed(), 0);
    }

    // ------------------------------------------------------------------
    // withdraw_fees
    // ------------------------------------------------------------------

    #[test]
    fn fee_withdrawal_by_recipient_and_admin() {
        let (engine, ledger) = with_payees();
        engine.advance_release(&acct(ADMIN), 10).unwrap();
        let payout = engine.withdraw_fees(&acct(FEES)).unwrap();
        assert_eq!(payout.amount, 10);
        assert_eq!(ledger.balance_of(&acct(TOKEN), &acct(FEES)).unwrap(), 10);

        engine.advance_release(&acct(ADMIN), 10).unwrap();
        let payout = engine.withdraw_fees(&acct(ADMIN)).unwrap();
        assert_eq!(payout.recipient, acct(FEES));
        assert_eq!(payout.amount, 10);
        assert_eq!(engine.fee_recipient_claimed(), 20);
        assert!(engine.withdraw_fees(&acct(FEES)).unwrap_err().is_benign());
        engine.verify().unwrap();
    }

    #[test]
    fn token_switch_keeps_claim_accounting() {
        let (engine, ledger) = with_payees();
        engine.advance_release(&acct(ADMIN), 10).unwrap();
        engine.withdraw(&acct(1), &acct(1)).unwrap();
        ledger.mint(&acct(0x71), &acct(CUSTODY), 1_000).unwrap();
        engine.set_token_address(&acct(ADMIN), Some(acct(0x71))).unwrap();
        engine.advance_release(&acct(ADMIN), 10).unwrap();
        let payout = engine.withdraw(&acct(1), &acct(1)).unwrap();
        assert_eq!(payout.amount, 95);
        assert_eq!(payout.claimed, 190);
        assert_eq!(ledger.balance_of(&acct(0x71), &acct(1)).unwrap(), 95);
        assert_eq!(engine.custody_balance().unwrap(), 905);
    }

    // ------------------------------------------------------------------
    // snapshots
    // ------------------------------------------------------------------

    #[test]
    fn from_state_restores() {
        let (engine, ledger) = with_payees();
        engine.advance_release(&acct(ADMIN), 30).unwrap();
        engine.withdraw(&acct(2), &acct(2)).unwrap();
        let state = engine.snapshot();
        let restored =
            DistributionEngine::from_state(state.clone(), ledger, AdminAuthority::new(acct(ADMIN))).unwrap();
        assert_eq!(restored.snapshot(), state);
        assert_eq!(restored.claimed_of(&acct(2)).unwrap(), 135);
    }

    #[test]
    fn engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Engine>();
    }
}
