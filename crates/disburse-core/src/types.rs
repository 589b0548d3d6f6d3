//! Core accounting types: account identifiers, payee records, views.
//!
//! Amounts are `u128` asset units; share weights are `u64`; percentages
//! (release counter and fee rates) are whole percents in a `u8`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::ACCOUNT_ID_LEN;
use crate::error::AccountIdError;

/// Quantity of the distributed asset, in abstract units.
pub type Amount = u128;

/// A 20-byte account identifier, rendered as `0x`-prefixed lowercase hex.
///
/// Identifies payees, the fee recipient, the custody account, the
/// administrator, and the token being distributed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct AccountId(pub [u8; ACCOUNT_ID_LEN]);

impl AccountId {
    /// The all-zero ("null") account.
    pub const ZERO: Self = Self([0u8; ACCOUNT_ID_LEN]);

    /// Create an AccountId from a byte array.
    pub fn from_bytes(bytes: [u8; ACCOUNT_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; ACCOUNT_ID_LEN] {
        &self.0
    }

    /// Check if this is the null account.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ACCOUNT_ID_LEN]
    }

    /// Parse from hex, with or without a `0x` prefix.
    pub fn parse(s: &str) -> Result<Self, AccountIdError> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if digits.len() != ACCOUNT_ID_LEN * 2 {
            return Err(AccountIdError::InvalidLength {
                got: digits.len(),
                expected: ACCOUNT_ID_LEN * 2,
            });
        }
        let mut bytes = [0u8; ACCOUNT_ID_LEN];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| AccountIdError::InvalidHex(e.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for AccountId {
    type Err = AccountIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<[u8; ACCOUNT_ID_LEN]> for AccountId {
    fn from(bytes: [u8; ACCOUNT_ID_LEN]) -> Self {
        Self(bytes)
    }
}

impl Serialize for AccountId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Stable arena index of a registered payee.
///
/// Ids are assigned in registration order starting at zero and never
/// reused, so `PayeeId(i)` is also the payee's position in enumeration.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PayeeId(pub u32);

impl PayeeId {
    /// Position in the registry arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PayeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A registered payee.
///
/// `shares` and `fee_rate` are fixed at registration; `claimed` only
/// grows, and only through the payee's own withdrawal.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Payee {
    /// External key of the payee.
    pub account: AccountId,
    /// Share weight, strictly positive.
    pub shares: u64,
    /// Percent of gross entitlement diverted to the fee recipient.
    pub fee_rate: u8,
    /// Cumulative amount already withdrawn.
    pub claimed: Amount,
}

/// A registration request: one element of a (batch) registration.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PayeeSpec {
    /// External key of the payee.
    pub account: AccountId,
    /// Share weight.
    pub shares: u64,
    /// Fee rate in whole percent.
    pub fee_rate: u8,
}

impl PayeeSpec {
    /// Convenience constructor.
    pub fn new(account: AccountId, shares: u64, fee_rate: u8) -> Self {
        Self {
            account,
            shares,
            fee_rate,
        }
    }
}

/// How the total expected investment is determined.
///
/// See [`entitlement::gross_entitlement`](crate::entitlement::gross_entitlement).
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentMode {
    /// The total investment equals `total_shares`: shares are denominated
    /// in asset units and each payee's entitlement is independent of the
    /// others.
    #[default]
    Proportional,
    /// A fixed total investment split pro rata by shares.
    Fixed(Amount),
}

impl InvestmentMode {
    /// Resolve the total investment for the given share total.
    pub fn total_investment(&self, total_shares: u64) -> Amount {
        match self {
            Self::Proportional => total_shares as Amount,
            Self::Fixed(amount) => *amount,
        }
    }

    /// Whether registering a payee changes other payees' entitlements.
    pub fn is_fixed(&self) -> bool {
        matches!(self, Self::Fixed(_))
    }
}

/// Where a payee stands in its claim lifecycle.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    /// Nothing withdrawn yet.
    Registered,
    /// Some amount withdrawn; more may follow.
    PartiallyClaimed,
    /// Release is complete and the full net entitlement has been withdrawn.
    FullyClaimed,
}

/// Read-only snapshot of one payee with its current entitlement.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PayeeView {
    /// Arena id (equals enumeration position).
    pub id: PayeeId,
    /// External key.
    pub account: AccountId,
    /// Share weight.
    pub shares: u64,
    /// Fee rate in whole percent.
    pub fee_rate: u8,
    /// Amount already withdrawn.
    pub claimed: Amount,
    /// Net entitlement at the current release percentage.
    pub entitled: Amount,
    /// `entitled - claimed`.
    pub pending: Amount,
}

/// Receipt for a successful withdrawal.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Payout {
    /// Account credited by the transfer.
    pub recipient: AccountId,
    /// Amount transferred.
    pub amount: Amount,
    /// Recipient's cumulative claimed amount after this payout.
    pub claimed: Amount,
    /// Global claimed total after this payout.
    pub total_claimed: Amount,
    /// Release percentage the payout was computed against.
    pub released_percent: u8,
}
