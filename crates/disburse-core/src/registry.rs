//! Append-only payee registry.
//!
//! Payees live in an arena (`Vec<Payee>`) indexed by [`PayeeId`], with a
//! separate `AccountId -> PayeeId` map for key lookup. Arena order is
//! registration order, so `payee_at(i)` enumerates payees as they were
//! added. Shares and fee rates are immutable once stored; nothing is ever
//! removed.
//!
//! Batch registration is atomic: every element is validated (including
//! duplicates within the batch itself) before any is applied.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::constants::MAX_FEE_RATE;
use crate::error::RegistryError;
use crate::types::{AccountId, Amount, Payee, PayeeId, PayeeSpec};

/// The payee arena plus its key index and share total.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(try_from = "Vec<Payee>", into = "Vec<Payee>")]
pub struct PayeeRegistry {
    /// Arena: `PayeeId(i)` is `payees[i]`.
    payees: Vec<Payee>,
    /// External key → arena id.
    index: HashMap<AccountId, PayeeId>,
    /// Sum of all registered shares.
    total_shares: u64,
}

impl PayeeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered payees.
    pub fn len(&self) -> usize {
        self.payees.len()
    }

    /// Whether no payee has been registered.
    pub fn is_empty(&self) -> bool {
        self.payees.is_empty()
    }

    /// Sum of all registered shares.
    pub fn total_shares(&self) -> u64 {
        self.total_shares
    }

    /// Whether `account` is registered.
    pub fn contains(&self, account: &AccountId) -> bool {
        self.index.contains_key(account)
    }

    /// Arena id of `account`.
    pub fn id_of(&self, account: &AccountId) -> Result<PayeeId, RegistryError> {
        self.index
            .get(account)
            .copied()
            .ok_or(RegistryError::UnknownPayee(*account))
    }

    /// Look up a payee by key.
    pub fn get(&self, account: &AccountId) -> Result<&Payee, RegistryError> {
        let id = self.id_of(account)?;
        Ok(&self.payees[id.index()])
    }

    /// Look up a payee by arena id.
    pub fn by_id(&self, id: PayeeId) -> Option<&Payee> {
        self.payees.get(id.index())
    }

    /// The payee registered in position `index`.
    pub fn payee_at(&self, index: usize) -> Result<&Payee, RegistryError> {
        self.payees.get(index).ok_or(RegistryError::IndexOutOfBounds {
            index,
            len: self.payees.len(),
        })
    }

    /// Iterate payees in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Payee> {
        self.payees.iter()
    }

    /// Iterate `(id, payee)` pairs in registration order.
    pub fn iter_with_ids(&self) -> impl Iterator<Item = (PayeeId, &Payee)> {
        self.payees
            .iter()
            .enumerate()
            .map(|(i, p)| (PayeeId(i as u32), p))
    }

    /// Sum of all payees' claimed amounts.
    pub fn total_payee_claimed(&self) -> Option<Amount> {
        self.payees
            .iter()
            .try_fold(0u128, |acc, p| acc.checked_add(p.claimed))
    }

    /// Zip the array form of a batch registration into specs.
    ///
    /// # Errors
    ///
    /// [`RegistryError::LengthMismatch`] if the three slices differ in length.
    pub fn zip_batch(
        accounts: &[AccountId],
        shares: &[u64],
        fee_rates: &[u8],
    ) -> Result<Vec<PayeeSpec>, RegistryError> {
        if accounts.len() != shares.len() || accounts.len() != fee_rates.len() {
            return Err(RegistryError::LengthMismatch {
                accounts: accounts.len(),
                shares: shares.len(),
                fee_rates: fee_rates.len(),
            });
        }
        Ok(accounts
            .iter()
            .zip(shares)
            .zip(fee_rates)
            .map(|((a, s), f)| PayeeSpec::new(*a, *s, *f))
            .collect())
    }

    /// Check a batch against the registry without applying it.
    ///
    /// Returns the new share total the batch would produce.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::InvalidShares`] if any element has zero shares
    /// - [`RegistryError::InvalidFeeRate`] if any fee rate exceeds 100
    /// - [`RegistryError::DuplicatePayee`] if any key is already registered
    ///   or appears twice in the batch
    /// - [`RegistryError::ArithmeticOverflow`] if the share total overflows
    ///   or the arena would outgrow [`PayeeId`]
    pub fn validate_batch(&self, specs: &[PayeeSpec]) -> Result<u64, RegistryError> {
        self.payees
            .len()
            .checked_add(specs.len())
            .and_then(|n| u32::try_from(n).ok())
            .ok_or(RegistryError::ArithmeticOverflow)?;
        let mut seen = HashSet::with_capacity(specs.len());
        let mut total = self.total_shares;
        for spec in specs {
            validate_spec(spec)?;
            if self.contains(&spec.account) || !seen.insert(spec.account) {
                return Err(RegistryError::DuplicatePayee(spec.account));
            }
            total = total
                .checked_add(spec.shares)
                .ok_or(RegistryError::ArithmeticOverflow)?;
        }
        Ok(total)
    }

    /// Register a single payee.
    pub fn register(&mut self, spec: PayeeSpec) -> Result<PayeeId, RegistryError> {
        let mut ids = self.register_batch(std::slice::from_ref(&spec))?;
        Ok(ids.remove(0))
    }

    /// Register a batch of payees atomically, in order.
    ///
    /// Either every element is appended or the registry is left untouched.
    pub fn register_batch(&mut self, specs: &[PayeeSpec]) -> Result<Vec<PayeeId>, RegistryError> {
        let new_total = self.validate_batch(specs)?;
        let mut ids = Vec::with_capacity(specs.len());
        for spec in specs {
            let id = next_id(self.payees.len())?;
            self.payees.push(Payee {
                account: spec.account,
                shares: spec.shares,
                fee_rate: spec.fee_rate,
                claimed: 0,
            });
            self.index.insert(spec.account, id);
            ids.push(id);
        }
        self.total_shares = new_total;
        Ok(ids)
    }

    /// Add `amount` to a payee's claimed total and return the new total.
    ///
    /// Callers must have checked the amount against the payee's
    /// entitlement; the registry only guards against overflow.
    pub(crate) fn record_claim(
        &mut self,
        id: PayeeId,
        amount: Amount,
    ) -> Option<Amount> {
        let payee = self.payees.get_mut(id.index())?;
        payee.claimed = payee.claimed.checked_add(amount)?;
        Some(payee.claimed)
    }
}

/// Id of the payee appended to an arena of length `len`.
fn next_id(len: usize) -> Result<PayeeId, RegistryError> {
    u32::try_from(len)
        .map(PayeeId)
        .map_err(|_| RegistryError::ArithmeticOverflow)
}

fn validate_spec(spec: &PayeeSpec) -> Result<(), RegistryError> {
    if spec.shares == 0 {
        return Err(RegistryError::InvalidShares {
            account: spec.account,
        });
    }
    if spec.fee_rate > MAX_FEE_RATE {
        return Err(RegistryError::InvalidFeeRate {
            account: spec.account,
            fee_rate: spec.fee_rate,
        });
    }
    Ok(())
}

impl TryFrom<Vec<Payee>> for PayeeRegistry {
    type Error = RegistryError;

    /// Rebuild the key index and share total from a stored arena.
    fn try_from(payees: Vec<Payee>) -> Result<Self, Self::Error> {
        let mut registry = Self::new();
        for payee in &payees {
            validate_spec(&PayeeSpec::new(payee.account, payee.shares, payee.fee_rate))?;
            let id = next_id(registry.index.len())?;
            if registry.index.insert(payee.account, id).is_some() {
                return Err(RegistryError::DuplicatePayee(payee.account));
            }
            registry.total_shares = registry
                .total_shares
                .checked_add(payee.shares)
                .ok_or(RegistryError::ArithmeticOverflow)?;
        }
        registry.payees = payees;
        Ok(registry)
    }
}

impl From<PayeeRegistry> for Vec<Payee> {
    fn from(registry: PayeeRegistry) -> Self {
        registry.payees
    }
}
