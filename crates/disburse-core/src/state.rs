//! Complete distribution state and its state transitions.
//!
//! [`DistributionState`] combines the deployment [`Settings`], the
//! [`PayeeRegistry`], and the [`ReleaseLedger`]. Every transition here is
//! pure: capability checks and ledger transfers are the caller's job.
//!
//! Withdrawals are split in two phases so a transfer can sit between them:
//! [`prepare_withdrawal`](DistributionState::prepare_withdrawal) computes
//! the amount from durable state and pre-checks every counter update,
//! then [`commit`](DistributionState::commit) applies it once the transfer
//! has gone through. Nothing is mutated if the caller never commits.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_INVESTMENT_NAME;
use crate::entitlement::{fits_fixed_investment, withdrawable, EntitlementCalculator};
use crate::error::{ClaimError, DisburseError, InvariantViolation, RegistryError, ReleaseError};
use crate::registry::PayeeRegistry;
use crate::release::ReleaseLedger;
use crate::types::{
    AccountId, Amount, ClaimStatus, InvestmentMode, PayeeId, PayeeSpec, PayeeView, Payout,
};

/// Deployment-level configuration held in state.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Human-readable label of the investment.
    pub investment_name: String,
    /// Account holding the administrative capability at deployment.
    pub administrator: AccountId,
    /// Account whose ledger balance funds every transfer.
    pub custody: AccountId,
    /// Account credited with fee withdrawals.
    pub fee_recipient: AccountId,
    /// Asset being distributed. `None` until configured.
    pub token_address: Option<AccountId>,
    /// How the total investment is derived.
    pub investment: InvestmentMode,
    /// Whether administrators may trigger the fee withdrawal.
    #[serde(default = "default_admin_collects_fees")]
    pub admin_collects_fees: bool,
}

fn default_admin_collects_fees() -> bool {
    true
}

impl Settings {
    /// Settings with the administrator as initial fee recipient.
    pub fn new(administrator: AccountId, custody: AccountId) -> Self {
        Self {
            investment_name: DEFAULT_INVESTMENT_NAME.to_string(),
            administrator,
            custody,
            fee_recipient: administrator,
            token_address: None,
            investment: InvestmentMode::default(),
            admin_collects_fees: true,
        }
    }
}

/// Who a prepared withdrawal pays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Beneficiary {
    Payee(PayeeId),
    FeeRecipient,
}

/// A computed, not yet applied, withdrawal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingWithdrawal {
    pub beneficiary: Beneficiary,
    pub recipient: AccountId,
    pub amount: Amount,
    pub released_percent: u8,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DistributionState {
    pub settings: Settings,
    registry: PayeeRegistry,
    release: ReleaseLedger,
}

impl DistributionState {
    /// Fresh state: no payees, nothing released or claimed.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            registry: PayeeRegistry::new(),
            release: ReleaseLedger::new(),
        }
    }

    pub fn registry(&self) -> &PayeeRegistry {
        &self.registry
    }

    pub fn release(&self) -> &ReleaseLedger {
        &self.release
    }

    /// Total investment the release percentage applies to.
    pub fn total_investment(&self) -> Amount {
        self.settings
            .investment
            .total_investment(self.registry.total_shares())
    }

    /// Entitlement calculator at the current release state.
    pub fn calculator(&self) -> EntitlementCalculator {
        EntitlementCalculator::new(
            self.release.released_percent(),
            self.registry.total_shares(),
            self.total_investment(),
        )
    }

    // ------------------------------------------------------------------
    // Registry
    // ------------------------------------------------------------------

    /// Register payees atomically.
    ///
    /// Under a fixed investment, registration closes once anything has been
    /// released: a new payee would dilute entitlements that may already
    /// have been paid out. A payee whose full-release entitlement could not
    /// be computed against the fixed total is rejected up front.
    pub fn register(&mut self, specs: &[PayeeSpec]) -> Result<Vec<PayeeId>, RegistryError> {
        if let InvestmentMode::Fixed(total) = self.settings.investment {
            let released = self.release.released_percent();
            if released > 0 && !specs.is_empty() {
                return Err(RegistryError::RegistrationClosed {
                    released_percent: released,
                });
            }
            if specs.iter().any(|s| !fits_fixed_investment(s.shares, total)) {
                return Err(RegistryError::ArithmeticOverflow);
            }
        }
        self.registry.register_batch(specs)
    }

    // ------------------------------------------------------------------
    // Release
    // ------------------------------------------------------------------

    /// Advance the release counter.
    pub fn advance_release(&mut self, delta: u8) -> Result<u8, ReleaseError> {
        self.release.advance(delta, self.registry.total_shares())
    }

    // ------------------------------------------------------------------
    // Entitlement queries
    // ------------------------------------------------------------------

    /// Net amount `account` may withdraw now.
    pub fn pending(&self, account: &AccountId) -> Result<Amount, DisburseError> {
        let payee = self.registry.get(account)?;
        Ok(self.calculator().pending(payee)?)
    }

    /// Fee amount the fee recipient may withdraw now.
    pub fn pending_fees(&self) -> Result<Amount, ClaimError> {
        let fees = self.calculator().total_fees(self.registry.iter())?;
        Ok(withdrawable(fees, self.release.fee_recipient_claimed()))
    }

    /// Everything currently withdrawable: all payees plus fees.
    pub fn outstanding_liability(&self) -> Result<Amount, ClaimError> {
        let calc = self.calculator();
        let payees = self.registry.iter().try_fold(0u128, |acc, p| {
            acc.checked_add(calc.pending(p)?)
                .ok_or(ClaimError::ArithmeticOverflow)
        })?;
        payees
            .checked_add(self.pending_fees()?)
            .ok_or(ClaimError::ArithmeticOverflow)
    }

    /// Lifecycle position of a payee.
    pub fn claim_status(&self, account: &AccountId) -> Result<ClaimStatus, DisburseError> {
        let payee = self.registry.get(account)?;
        if payee.claimed == 0 {
            return Ok(ClaimStatus::Registered);
        }
        let net = self.calculator().net(payee)?;
        if self.release.is_complete() && payee.claimed == net {
            Ok(ClaimStatus::FullyClaimed)
        } else {
            Ok(ClaimStatus::PartiallyClaimed)
        }
    }

    /// Ordered view of every payee with its current entitlement.
    pub fn payee_views(&self) -> Result<Vec<PayeeView>, ClaimError> {
        let calc = self.calculator();
        self.registry
            .iter_with_ids()
            .map(|(id, p)| {
                let entitled = calc.net(p)?;
                Ok(PayeeView {
                    id,
                    account: p.account,
                    shares: p.shares,
                    fee_rate: p.fee_rate,
                    claimed: p.claimed,
                    entitled,
                    pending: withdrawable(entitled, p.claimed),
                })
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Withdrawals
    // ------------------------------------------------------------------

    /// Compute a payee withdrawal from durable state.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::UnknownPayee`] if `account` is not registered
    /// - [`ClaimError::NothingToClaim`] if the payee is fully paid up
    /// - [`ClaimError::ArithmeticOverflow`] if a counter would overflow
    pub fn prepare_withdrawal(&self, account: &AccountId) -> Result<PendingWithdrawal, DisburseError> {
        let id = self.registry.id_of(account)?;
        let payee = self.registry.get(account)?;
        let released_percent = self.release.released_percent();
        let amount = self.calculator().pending(payee)?;
        if amount == 0 {
            return Err(ClaimError::NothingToClaim {
                account: *account,
                released_percent,
            }
            .into());
        }
        payee
            .claimed
            .checked_add(amount)
            .and_then(|_| self.release.total_claimed().checked_add(amount))
            .ok_or(ClaimError::ArithmeticOverflow)?;
        Ok(PendingWithdrawal {
            beneficiary: Beneficiary::Payee(id),
            recipient: *account,
            amount,
            released_percent,
        })
    }

    /// Compute the fee recipient's withdrawal from durable state.
    pub fn prepare_fee_withdrawal(&self) -> Result<PendingWithdrawal, DisburseError> {
        let recipient = self.settings.fee_recipient;
        let released_percent = self.release.released_percent();
        let amount = self.pending_fees()?;
        if amount == 0 {
            return Err(ClaimError::NothingToClaim {
                account: recipient,
                released_percent,
            }
            .into());
        }
        self.release
            .total_claimed()
            .checked_add(amount)
            .ok_or(ClaimError::ArithmeticOverflow)?;
        Ok(PendingWithdrawal {
            beneficiary: Beneficiary::FeeRecipient,
            recipient,
            amount,
            released_percent,
        })
    }

    /// Apply a prepared withdrawal after its transfer succeeded.
    ///
    /// Must be called against the same state the withdrawal was prepared
    /// from; the engine guarantees this by holding its write lock across
    /// prepare, transfer, and commit.
    pub fn commit(&mut self, pending: &PendingWithdrawal) -> Result<Payout, ClaimError> {
        let claimed = match pending.beneficiary {
            Beneficiary::Payee(id) => {
                let claimed = self
                    .registry
                    .record_claim(id, pending.amount)
                    .ok_or(ClaimError::ArithmeticOverflow)?;
                self.release
                    .record_payee_claim(pending.amount)
                    .ok_or(ClaimError::ArithmeticOverflow)?;
                claimed
            }
            Beneficiary::FeeRecipient => self
                .release
                .record_fee_claim(pending.amount)
                .ok_or(ClaimError::ArithmeticOverflow)?,
        };
        Ok(Payout {
            recipient: pending.recipient,
            amount: pending.amount,
            claimed,
            total_claimed: self.release.total_claimed(),
            released_percent: pending.released_percent,
        })
    }

    // ------------------------------------------------------------------
    // Invariants
    // ------------------------------------------------------------------

    /// Check every accounting invariant.
    ///
    /// Used after restoring a snapshot and throughout the test suites.
    pub fn verify(&self) -> Result<(), InvariantViolation> {
        let released = self.release.released_percent();
        if released > crate::constants::MAX_RELEASED_PERCENT {
            return Err(InvariantViolation::ReleasedAboveMax(released));
        }

        let mut share_sum: u64 = 0;
        for (id, payee) in self.registry.iter_with_ids() {
            if payee.shares == 0 || payee.fee_rate > crate::constants::MAX_FEE_RATE {
                return Err(InvariantViolation::InvalidPayee(payee.account));
            }
            if self.registry.id_of(&payee.account).ok() != Some(id) {
                return Err(InvariantViolation::IndexCorrupt(payee.account));
            }
            share_sum = share_sum
                .checked_add(payee.shares)
                .ok_or(InvariantViolation::ArithmeticOverflow)?;
        }
        if share_sum != self.registry.total_shares() {
            return Err(InvariantViolation::TotalSharesMismatch {
                recorded: self.registry.total_shares(),
                actual: share_sum,
            });
        }

        let calc = self.calculator();
        for payee in self.registry.iter() {
            let entitled = calc
                .net(payee)
                .map_err(|_| InvariantViolation::ArithmeticOverflow)?;
            if payee.claimed > entitled {
                return Err(InvariantViolation::PayeeOverpaid {
                    account: payee.account,
                    claimed: payee.claimed,
                    entitled,
                });
            }
        }

        let fees = calc
            .total_fees(self.registry.iter())
            .map_err(|_| InvariantViolation::ArithmeticOverflow)?;
        if self.release.fee_recipient_claimed() > fees {
            return Err(InvariantViolation::FeesOverpaid {
                claimed: self.release.fee_recipient_claimed(),
                entitled: fees,
            });
        }

        let claimed_sum = self
            .registry
            .total_payee_claimed()
            .and_then(|s| s.checked_add(self.release.fee_recipient_claimed()))
            .ok_or(InvariantViolation::ArithmeticOverflow)?;
        if claimed_sum != self.release.total_claimed() {
            return Err(InvariantViolation::TotalClaimedMismatch {
                recorded: self.release.total_claimed(),
                actual: claimed_sum,
            });
        }
        Ok(())
    }
}
