//! Error types for Disburse.
use thiserror::Error;

use crate::types::{AccountId, Amount};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountIdError {
    #[error("invalid length: got {got} hex digits, expected {expected}")] InvalidLength { got: usize, expected: usize },
    #[error("invalid hex: {0}")] InvalidHex(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("payee already registered: {0}")] DuplicatePayee(AccountId),
    #[error("invalid shares for {account}: must be positive")] InvalidShares { account: AccountId },
    #[error("invalid fee rate for {account}: {fee_rate} > 100")] InvalidFeeRate { account: AccountId, fee_rate: u8 },
    #[error("batch length mismatch: {accounts} accounts, {shares} shares, {fee_rates} fee rates")] LengthMismatch { accounts: usize, shares: usize, fee_rates: usize },
    #[error("unknown payee: {0}")] UnknownPayee(AccountId),
    #[error("payee index out of bounds: {index} >= {len}")] IndexOutOfBounds { index: usize, len: usize },
    #[error("registration closed: release already at {released_percent}% under a fixed investment")] RegistrationClosed { released_percent: u8 },
    #[error("registry arithmetic overflow")] ArithmeticOverflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReleaseError {
    #[error("release delta must be positive")] InvalidDelta,
    #[error("release overflow: {current}% + {delta}% > 100%")] ReleaseOverflow { current: u8, delta: u8 },
    #[error("no payees registered")] NoPayeesRegistered,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClaimError {
    #[error("nothing to claim for {account} at {released_percent}% released")] NothingToClaim { account: AccountId, released_percent: u8 },
    #[error("transfer of {amount} to {to} failed: {reason}")] TransferFailed { to: AccountId, amount: Amount, reason: LedgerError },
    #[error("token address not configured")] TokenNotConfigured,
    #[error("entitlement arithmetic overflow")] ArithmeticOverflow,
}

/// Failures reported by a [`Ledger`](crate::traits::Ledger) implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient balance: have {have}, need {need}")] InsufficientBalance { have: Amount, need: Amount },
    #[error("rejected: {0}")] Rejected(String),
    #[error("unavailable: {0}")] Unavailable(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("released percent {0} exceeds 100")] ReleasedAboveMax(u8),
    #[error("total shares {recorded} != sum of payee shares {actual}")] TotalSharesMismatch { recorded: u64, actual: u64 },
    #[error("total claimed {recorded} != sum of claims {actual}")] TotalClaimedMismatch { recorded: Amount, actual: Amount },
    #[error("payee {account} overpaid: claimed {claimed} > entitled {entitled}")] PayeeOverpaid { account: AccountId, claimed: Amount, entitled: Amount },
    #[error("fee recipient overpaid: claimed {claimed} > entitled {entitled}")] FeesOverpaid { claimed: Amount, entitled: Amount },
    #[error("payee {0} has invalid shares or fee rate")] InvalidPayee(AccountId),
    #[error("payee index inconsistent at {0}")] IndexCorrupt(AccountId),
    #[error("arithmetic overflow while verifying")] ArithmeticOverflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DisburseError {
    #[error("unauthorized: {caller} may not {action}")] Unauthorized { caller: AccountId, action: &'static str },
    #[error(transparent)] Registry(#[from] RegistryError),
    #[error(transparent)] Release(#[from] ReleaseError),
    #[error(transparent)] Claim(#[from] ClaimError),
    #[error(transparent)] Invariant(#[from] InvariantViolation),
    #[error("ledger: {0}")] Ledger(#[from] LedgerError),
}

impl DisburseError {
    /// `NothingToClaim` is a no-op signal rather than a failure.
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::Claim(ClaimError::NothingToClaim { .. }))
    }

    /// Whether repeating the same call unchanged may succeed.
    ///
    /// Only ledger transfer failures qualify; the engine leaves its state
    /// untouched on those.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Claim(ClaimError::TransferFailed { .. }))
    }
}
