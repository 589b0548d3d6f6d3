//! Entitlement math.
//!
//! For a payee holding `shares` out of `total_shares`, with the release
//! counter at `released_percent` and a total expected investment of
//! `total_investment` asset units:
//!
//! ```text
//! gross = shares * released_percent * total_investment / (total_shares * 100)
//! net   = gross * (100 - fee_rate) / 100
//! fee   = gross * fee_rate / 100
//! ```
//!
//! Each quantity truncates exactly once, after the full numerator has been
//! formed. Reordering the operands (dividing by `total_shares` first, or
//! applying the fee before the release percentage) changes the rounding
//! and is not equivalent. `net + fee` may fall short of `gross` by at most
//! one unit; that dust stays in custody.
//!
//! All arithmetic is integer-only with u128 intermediates.

use crate::constants::PERCENT_PRECISION;
use crate::error::ClaimError;
use crate::types::{Amount, Payee};

/// Gross entitlement for `shares` at the given release state.
///
/// Returns 0 when `total_shares` is 0 (no registry to divide among).
/// When `total_investment == total_shares` the ratio cancels and the
/// result is `shares * released_percent / 100`, which cannot overflow.
pub fn gross_entitlement(
    shares: u64,
    released_percent: u8,
    total_shares: u64,
    total_investment: Amount,
) -> Result<Amount, ClaimError> {
    if total_shares == 0 {
        return Ok(0);
    }
    let base = (shares as u128) * (released_percent as u128);
    if total_investment == total_shares as u128 {
        return Ok(base / PERCENT_PRECISION);
    }
    let numerator = base
        .checked_mul(total_investment)
        .ok_or(ClaimError::ArithmeticOverflow)?;
    let denominator = (total_shares as u128)
        .checked_mul(PERCENT_PRECISION)
        .ok_or(ClaimError::ArithmeticOverflow)?;
    Ok(numerator / denominator)
}

/// Whether a payee holding `shares` can be evaluated at every release
/// percentage against a fixed `total_investment` without overflow.
///
/// Gross entitlements never exceed `total_investment`, so once the largest
/// numerator fits, so do the net and fee splits and their sums.
pub fn fits_fixed_investment(shares: u64, total_investment: Amount) -> bool {
    (shares as u128)
        .checked_mul(PERCENT_PRECISION)
        .and_then(|v| v.checked_mul(total_investment))
        .is_some()
}

/// The payee's portion of `gross` after its fee is diverted.
pub fn net_entitlement(gross: Amount, fee_rate: u8) -> Result<Amount, ClaimError> {
    let keep = PERCENT_PRECISION.saturating_sub(fee_rate as u128);
    gross
        .checked_mul(keep)
        .map(|v| v / PERCENT_PRECISION)
        .ok_or(ClaimError::ArithmeticOverflow)
}

/// The fee recipient's portion of `gross`.
pub fn fee_entitlement(gross: Amount, fee_rate: u8) -> Result<Amount, ClaimError> {
    gross
        .checked_mul(fee_rate as u128)
        .map(|v| v / PERCENT_PRECISION)
        .ok_or(ClaimError::ArithmeticOverflow)
}

/// Amount still withdrawable given what was already claimed.
///
/// Saturates at zero: a claim can never exceed its entitlement under the
/// registry's invariants, but the subtraction is never allowed to wrap.
pub fn withdrawable(entitled: Amount, claimed: Amount) -> Amount {
    entitled.saturating_sub(claimed)
}

/// Gross entitlement split into its payee and fee parts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Entitlement {
    pub gross: Amount,
    pub net: Amount,
    pub fee: Amount,
}

impl Entitlement {
    /// Truncation dust: the part of `gross` paid to nobody.
    pub fn dust(&self) -> Amount {
        self.gross - self.net - self.fee
    }
}

/// Release state needed to evaluate entitlements, captured once per
/// operation so every payee is measured against the same counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntitlementCalculator {
    released_percent: u8,
    total_shares: u64,
    total_investment: Amount,
}

impl EntitlementCalculator {
    /// Capture a release state.
    pub fn new(released_percent: u8, total_shares: u64, total_investment: Amount) -> Self {
        Self {
            released_percent,
            total_shares,
            total_investment,
        }
    }

    /// Release percentage this calculator evaluates at.
    pub fn released_percent(&self) -> u8 {
        self.released_percent
    }

    /// Full split for a share weight and fee rate.
    pub fn split(&self, shares: u64, fee_rate: u8) -> Result<Entitlement, ClaimError> {
        let gross = gross_entitlement(
            shares,
            self.released_percent,
            self.total_shares,
            self.total_investment,
        )?;
        Ok(Entitlement {
            gross,
            net: net_entitlement(gross, fee_rate)?,
            fee: fee_entitlement(gross, fee_rate)?,
        })
    }

    /// Net entitlement of a registered payee.
    pub fn net(&self, payee: &Payee) -> Result<Amount, ClaimError> {
        Ok(self.split(payee.shares, payee.fee_rate)?.net)
    }

    /// Fee generated by a registered payee.
    pub fn fee(&self, payee: &Payee) -> Result<Amount, ClaimError> {
        Ok(self.split(payee.shares, payee.fee_rate)?.fee)
    }

    /// What the payee may withdraw right now.
    pub fn pending(&self, payee: &Payee) -> Result<Amount, ClaimError> {
        Ok(withdrawable(self.net(payee)?, payee.claimed))
    }

    /// Total fees generated across `payees`.
    pub fn total_fees<'a, I>(&self, payees: I) -> Result<Amount, ClaimError>
    where
        I: IntoIterator<Item = &'a Payee>,
    {
        payees.into_iter().try_fold(0u128, |acc, p| {
            acc.checked_add(self.fee(p)?)
                .ok_or(ClaimError::ArithmeticOverflow)
        })
    }
}
