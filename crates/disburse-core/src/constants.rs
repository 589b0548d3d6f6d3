//! Accounting constants. All amounts are abstract asset units.

/// Denominator for every percentage in the system (release counter and
/// fee rates are whole percents).
pub const PERCENT_PRECISION: u128 = 100;

/// Upper bound of the cumulative release counter.
pub const MAX_RELEASED_PERCENT: u8 = 100;

/// Upper bound of a payee's fee rate.
pub const MAX_FEE_RATE: u8 = 100;

/// Label used when a deployment does not name its investment.
pub const DEFAULT_INVESTMENT_NAME: &str = "Unnamed Investment";

/// Length in bytes of an [`AccountId`](crate::types::AccountId).
pub const ACCOUNT_ID_LEN: usize = 20;
