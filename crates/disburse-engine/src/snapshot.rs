//! JSON snapshots of [`DistributionState`].
//!
//! Snapshots are written to a sibling temp file and renamed into place, so
//! a crash mid-write leaves the previous snapshot intact. Loading re-runs
//! every invariant check before handing the state back.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use disburse_core::error::InvariantViolation;
use disburse_core::state::DistributionState;

/// Current on-disk format version.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("snapshot io: {0}")] Io(#[from] io::Error),
    #[error("snapshot encoding: {0}")] Json(#[from] serde_json::Error),
    #[error("unsupported snapshot version {found}, expected {expected}")] Version { found: u32, expected: u32 },
    #[error("snapshot rejected: {0}")] Invariant(#[from] InvariantViolation),
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    state: &'a DistributionState,
}

#[derive(Deserialize)]
struct SnapshotOwned {
    version: u32,
    state: DistributionState,
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Replace the contents of `path` through a sibling temp file, creating
/// parent directories as needed.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp = temp_path(path);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}

/// Write `state` to `path`, replacing any previous snapshot.
pub fn save_snapshot(path: &Path, state: &DistributionState) -> Result<(), SnapshotError> {
    let json = serde_json::to_vec_pretty(&SnapshotRef {
        version: SNAPSHOT_VERSION,
        state,
    })?;
    write_atomic(path, &json)?;
    debug!(path = %path.display(), "snapshot saved");
    Ok(())
}

/// Read and verify a snapshot written by [`save_snapshot`].
pub fn load_snapshot(path: &Path) -> Result<DistributionState, SnapshotError> {
    let bytes = fs::read(path)?;
    let snapshot: SnapshotOwned = serde_json::from_slice(&bytes)?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(SnapshotError::Version {
            found: snapshot.version,
            expected: SNAPSHOT_VERSION,
        });
    }
    snapshot.state.verify()?;
    debug!(path = %path.display(), "snapshot loaded");
    Ok(snapshot.state)
}
