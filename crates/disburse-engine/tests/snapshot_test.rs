//! Persist an engine mid-distribution and resume it from disk.

use std::sync::Arc;

use disburse_core::state::Settings;
use disburse_core::traits::Ledger;
use disburse_core::types::{AccountId, InvestmentMode};
use disburse_engine::ledger::LedgerSnapshot;
use disburse_engine::{load_snapshot, save_snapshot, AdminAuthority, DistributionEngine, MemoryLedger, SnapshotError};

const ADMIN: AccountId = AccountId([0xAD; 20]);
const CUSTODY: AccountId = AccountId([0xC0; 20]);
const TOKEN: AccountId = AccountId([0x70; 20]);

fn acct(seed: u8) -> AccountId {
    AccountId([seed; 20])
}

#[test]
fn resume_from_disk_continues_distribution() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("state.json");
    let ledger_path = dir.path().join("ledger.json");

    let ledger = Arc::new(MemoryLedger::new());
    ledger.mint(&TOKEN, &CUSTODY, 10_000).unwrap();
    let mut settings = Settings::new(ADMIN, CUSTODY);
    settings.token_address = Some(TOKEN);
    settings.investment = InvestmentMode::Fixed(4_000);
    let engine = DistributionEngine::new(settings, Arc::clone(&ledger), AdminAuthority::new(ADMIN));
    engine
        .register_payees(&ADMIN, &[acct(1), acct(2)], &[3, 1], &[10, 0])
        .unwrap();
    engine.advance_release(&ADMIN, 25).unwrap();
    // 3/4 of 4000 at 25% is 750 gross, 675 net.
    assert_eq!(engine.withdraw(&acct(1), &acct(1)).unwrap().amount, 675);

    save_snapshot(&state_path, &engine.snapshot()).unwrap();
    std::fs::write(&ledger_path, serde_json::to_vec(&ledger.snapshot()).unwrap()).unwrap();
    drop(engine);

    let state = load_snapshot(&state_path).unwrap();
    let ledger_snap: LedgerSnapshot = serde_json::from_slice(&std::fs::read(&ledger_path).unwrap()).unwrap();
    let ledger = MemoryLedger::from_snapshot(ledger_snap);
    let engine = DistributionEngine::from_state(state, ledger, AdminAuthority::new(ADMIN)).unwrap();

    assert_eq!(engine.claimed_of(&acct(1)).unwrap(), 675);
    assert!(engine.withdraw(&acct(1), &acct(1)).unwrap_err().is_benign());
    assert_eq!(engine.withdraw(&acct(2), &acct(2)).unwrap().amount, 250);
    assert_eq!(engine.withdraw_fees(&ADMIN).unwrap().amount, 75);
    assert_eq!(engine.ledger().balance_of(&TOKEN, &CUSTODY).unwrap(), 10_000 - 1_000);
    engine.verify().unwrap();
}

#[test]
fn tampered_snapshot_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let engine = DistributionEngine::new(Settings::new(ADMIN, CUSTODY), MemoryLedger::new(), AdminAuthority::new(ADMIN));
    engine.register_payee(&ADMIN, acct(1), 100, 0).unwrap();
    engine.advance_release(&ADMIN, 10).unwrap();
    save_snapshot(&path, &engine.snapshot()).unwrap();

    // Claim more than the 10 units released.
    let text = std::fs::read_to_string(&path)
        .unwrap()
        .replace("\"claimed\": 0", "\"claimed\": 50")
        .replace("\"total_claimed\": 0", "\"total_claimed\": 50");
    std::fs::write(&path, text).unwrap();

    assert!(matches!(load_snapshot(&path), Err(SnapshotError::Invariant(_))));
}

#[test]
fn base_unit_shares_survive_restore() {
    const UNIT: u64 = 1_000_000_000_000_000_000;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let ledger = Arc::new(MemoryLedger::new());
    ledger.mint(&TOKEN, &CUSTODY, 3 * UNIT as u128).unwrap();
    let mut settings = Settings::new(ADMIN, CUSTODY);
    settings.token_address = Some(TOKEN);
    let engine = DistributionEngine::new(settings, Arc::clone(&ledger), AdminAuthority::new(ADMIN));
    engine
        .register_payees(&ADMIN, &[acct(1), acct(2)], &[2 * UNIT, UNIT], &[0, 10])
        .unwrap();
    engine.advance_release(&ADMIN, 60).unwrap();

    assert_eq!(engine.withdraw(&acct(1), &acct(1)).unwrap().amount, 1_200_000_000_000_000_000);
    assert_eq!(engine.withdraw_fees(&ADMIN).unwrap().amount, 60_000_000_000_000_000);
    engine.verify().unwrap();

    save_snapshot(&path, &engine.snapshot()).unwrap();
    let state = load_snapshot(&path).unwrap();
    let engine = DistributionEngine::from_state(state, Arc::clone(&ledger), AdminAuthority::new(ADMIN)).unwrap();
    assert_eq!(engine.withdraw(&acct(2), &acct(2)).unwrap().amount, 540_000_000_000_000_000);
    engine.verify().unwrap();
}
