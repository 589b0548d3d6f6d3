//! Cross-crate test suite for Disburse.
//!
//! Integration tests drive a full [`DistributionEngine`] over a
//! [`MemoryLedger`]: the reference three-batch scenario, randomized
//! operation sequences that try to break the accounting invariants, and
//! concurrent withdrawals.
//!
//! [`DistributionEngine`]: disburse_engine::DistributionEngine
//! [`MemoryLedger`]: disburse_engine::MemoryLedger

pub mod helpers;
