//! Shared fixtures for the integration tests.

use std::sync::Arc;

use disburse_core::state::Settings;
use disburse_core::traits::Ledger;
use disburse_core::types::{AccountId, Amount, InvestmentMode, PayeeSpec};
use disburse_engine::{AdminAuthority, DistributionEngine, MemoryLedger};

pub const ADMIN: AccountId = AccountId([0xAD; 20]);
pub const CUSTODY: AccountId = AccountId([0xC0; 20]);
pub const TOKEN: AccountId = AccountId([0x70; 20]);
pub const FEES: AccountId = AccountId([0xFE; 20]);

pub type TestEngine = DistributionEngine<Arc<MemoryLedger>, AdminAuthority>;

/// Account from a seed byte.
pub fn acct(seed: u8) -> AccountId {
    AccountId([seed; 20])
}

/// Distinct account for any index.
pub fn indexed_acct(i: u32) -> AccountId {
    let mut bytes = [0x11u8; 20];
    bytes[16..].copy_from_slice(&i.to_be_bytes());
    AccountId(bytes)
}

/// The three payees of the reference scenario: shares 1000/500/2000,
/// fee rates 5/10/0.
pub fn reference_payees() -> Vec<PayeeSpec> {
    vec![
        PayeeSpec::new(acct(1), 1_000, 5),
        PayeeSpec::new(acct(2), 500, 10),
        PayeeSpec::new(acct(3), 2_000, 0),
    ]
}

/// An engine over a shared in-memory ledger, with the token configured and
/// fees routed to [`FEES`].
pub struct Harness {
    pub engine: TestEngine,
    pub ledger: Arc<MemoryLedger>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_mode(InvestmentMode::Proportional)
    }

    pub fn with_mode(investment: InvestmentMode) -> Self {
        let ledger = Arc::new(MemoryLedger::new());
        let mut settings = Settings::new(ADMIN, CUSTODY);
        settings.investment_name = "Test Investment".to_string();
        settings.token_address = Some(TOKEN);
        settings.fee_recipient = FEES;
        settings.investment = investment;
        let engine = DistributionEngine::new(settings, Arc::clone(&ledger), AdminAuthority::new(ADMIN));
        Self { engine, ledger }
    }

    /// Harness with [`reference_payees`] registered.
    pub fn reference() -> Self {
        let h = Self::new();
        h.engine
            .register_specs(&ADMIN, &reference_payees())
            .expect("reference payees register");
        h
    }

    /// Move `amount` into custody.
    pub fn fund(&self, amount: Amount) {
        self.ledger.mint(&TOKEN, &CUSTODY, amount).expect("mint");
    }

    pub fn balance(&self, owner: &AccountId) -> Amount {
        self.ledger.balance_of(&TOKEN, owner).expect("balance")
    }

    /// Withdraw for `payee` as `payee`, returning the amount paid.
    pub fn withdraw(&self, payee: &AccountId) -> Amount {
        self.engine.withdraw(payee, payee).expect("withdraw").amount
    }

    /// Sum of every transfer out of custody.
    pub fn paid_out(&self) -> Amount {
        self.ledger
            .transfers()
            .iter()
            .filter(|t| t.from == CUSTODY)
            .map(|t| t.amount)
            .sum()
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
