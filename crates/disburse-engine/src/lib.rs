//! # disburse-engine
//! Thread-safe composition of the Disburse accounting core.
//!
//! [`DistributionEngine`] wraps a [`DistributionState`] behind a single
//! `RwLock`, checks every call against an [`Authority`], and performs
//! payouts through a [`Ledger`]. [`MemoryLedger`] and [`AdminAuthority`]
//! are ready-made implementations for tests and local simulation;
//! [`EngineConfig`] builds an engine from a TOML file and the environment.
//!
//! [`DistributionState`]: disburse_core::state::DistributionState
//! [`Authority`]: disburse_core::traits::Authority
//! [`Ledger`]: disburse_core::traits::Ledger

pub mod authority;
pub mod config;
pub mod engine;
pub mod ledger;
pub mod snapshot;

pub use authority::AdminAuthority;
pub use config::{ConfigError, EngineConfig, LogConfig, LogFormat};
pub use engine::DistributionEngine;
pub use ledger::MemoryLedger;
pub use snapshot::{load_snapshot, save_snapshot, write_atomic, SnapshotError};
