//! Engine configuration.
//!
//! [`EngineConfig`] is layered with the `config` crate: built-in defaults,
//! then an optional TOML file, then `DISBURSE_*` environment variables
//! (nested keys separated by `__`, e.g. `DISBURSE_LOG__LEVEL=debug`).
//!
//! ```toml
//! investment_name = "Seed Round"
//! administrator = "0xadadadadadadadadadadadadadadadadadadadad"
//! custody = "0xc0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0"
//! token_address = "0x7070707070707070707070707070707070707070"
//! # Optional. Amounts beyond the TOML integer range go in quotes.
//! total_investment = "3500000000000000000000"
//!
//! [[payees]]
//! account = "0x0101010101010101010101010101010101010101"
//! shares = 1000
//! fee_rate = 5
//!
//! [log]
//! level = "info"
//! format = "json"
//! ```

use std::fmt;
use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use thiserror::Error;

use disburse_core::constants::DEFAULT_INVESTMENT_NAME;
use disburse_core::error::DisburseError;
use disburse_core::state::Settings;
use disburse_core::traits::Ledger;
use disburse_core::types::{AccountId, Amount, InvestmentMode, PayeeSpec};

use crate::authority::AdminAuthority;
use crate::engine::DistributionEngine;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "DISBURSE";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config load failed: {0}")] Load(#[from] config::ConfigError),
    #[error("invalid config: {0}")] Invalid(String),
    #[error("initial registration failed: {0}")] Registration(#[from] DisburseError),
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive, e.g. "info" or "disburse_engine=debug".
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// Largest integer an f64 holds exactly (2^53).
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

/// An [`Amount`] given as an integer or a decimal string.
struct AmountValue(Amount);

impl<'de> Deserialize<'de> for AmountValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(AmountVisitor).map(AmountValue)
    }
}

struct AmountVisitor;

impl Visitor<'_> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a non-negative integer or a decimal string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
        Ok(v.into())
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<Amount, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
        u128::try_from(v).map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> Result<Amount, E> {
        u128::try_from(v).map_err(|_| E::custom(format!("negative amount {v}")))
    }

    // Environment overrides of large values arrive as floats.
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
        if v >= 0.0 && v.fract() == 0.0 && v <= MAX_EXACT_FLOAT {
            Ok(v as Amount)
        } else {
            Err(E::invalid_value(de::Unexpected::Float(v), &self))
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
        v.trim()
            .parse::<Amount>()
            .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }
}

fn de_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Amount>, D::Error> {
    Ok(Option::<AmountValue>::deserialize(deserializer)?.map(|v| v.0))
}

/// Deployment configuration for a [`DistributionEngine`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub investment_name: String,
    pub administrator: AccountId,
    pub custody: AccountId,
    /// Defaults to the administrator.
    pub fee_recipient: Option<AccountId>,
    pub token_address: Option<AccountId>,
    /// Fixed total investment in base units. Unset means proportional mode.
    #[serde(deserialize_with = "de_amount")]
    pub total_investment: Option<Amount>,
    /// Whether the administrator may trigger fee withdrawals.
    pub admin_collects_fees: bool,
    /// Payees registered when the engine is built.
    pub payees: Vec<PayeeSpec>,
    pub log: LogConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            investment_name: DEFAULT_INVESTMENT_NAME.to_string(),
            administrator: AccountId::ZERO,
            custody: AccountId::ZERO,
            fee_recipient: None,
            token_address: None,
            total_investment: None,
            admin_collects_fees: true,
            payees: Vec::new(),
            log: LogConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load from an optional TOML file overlaid with the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }
        let cfg: Self = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a TOML document, without environment overrides.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let cfg: Self = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.administrator.is_zero() {
            return Err(ConfigError::Invalid("administrator must be set".into()));
        }
        if self.custody.is_zero() {
            return Err(ConfigError::Invalid("custody must be set".into()));
        }
        if self.fee_recipient.is_some_and(|a| a.is_zero()) {
            return Err(ConfigError::Invalid("fee recipient must not be the zero account".into()));
        }
        if self.total_investment == Some(0) {
            return Err(ConfigError::Invalid("total investment must be positive".into()));
        }
        Ok(())
    }

    pub fn investment_mode(&self) -> InvestmentMode {
        match self.total_investment {
            Some(amount) => InvestmentMode::Fixed(amount),
            None => InvestmentMode::Proportional,
        }
    }

    pub fn settings(&self) -> Settings {
        let mut settings = Settings::new(self.administrator, self.custody);
        settings.investment_name = self.investment_name.clone();
        if let Some(fee_recipient) = self.fee_recipient {
            settings.fee_recipient = fee_recipient;
        }
        settings.token_address = self.token_address;
        settings.investment = self.investment_mode();
        settings.admin_collects_fees = self.admin_collects_fees;
        settings
    }

    pub fn authority(&self) -> AdminAuthority {
        AdminAuthority::for_settings(&self.settings())
    }

    /// Build an engine on `ledger` and register the configured payees.
    pub fn build<L: Ledger>(&self, ledger: L) -> Result<DistributionEngine<L, AdminAuthority>, ConfigError> {
        self.validate()?;
        let engine = DistributionEngine::new(self.settings(), ledger, self.authority());
        if !self.payees.is_empty() {
            engine.register_specs(&self.administrator, &self.payees)?;
        }
        Ok(engine)
    }
}
