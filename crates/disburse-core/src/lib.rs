//! # disburse-core
//! Foundation types, capability traits, and accounting logic for Disburse.
//!
//! Everything in this crate is deterministic and free of I/O. The
//! registry, release ledger, and entitlement calculator operate on plain
//! data; locking, authorization, and transfers are layered on top by
//! `disburse-engine`.

pub mod constants;
pub mod entitlement;
pub mod error;
pub mod registry;
pub mod release;
pub mod state;
pub mod traits;
pub mod types;
