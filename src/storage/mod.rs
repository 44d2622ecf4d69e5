//! Persistence layer.
//!
//! Saves and loads the pool snapshot to/from a JSON file so the binary
//! survives restarts. The snapshot format is a deployment concern, not
//! part of the engine's contract.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

use crate::engine::PoolSnapshot;

/// Default snapshot file path.
const DEFAULT_STATE_FILE: &str = "pool_state.json";

/// Save a pool snapshot to a JSON file.
pub fn save_snapshot(snapshot: &PoolSnapshot, path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_STATE_FILE);
    let json = serde_json::to_string_pretty(snapshot)
        .context("Failed to serialise pool snapshot")?;

    std::fs::write(path, &json)
        .context(format!("Failed to write snapshot to {path}"))?;

    debug!(path, balance = %snapshot.balance, "Snapshot saved");
    Ok(())
}

/// Load a pool snapshot from a JSON file.
/// Returns None if the file doesn't exist (fresh start).
pub fn load_snapshot(path: Option<&str>) -> Result<Option<PoolSnapshot>> {
    let path = path.unwrap_or(DEFAULT_STATE_FILE);

    if !Path::new(path).exists() {
        info!(path, "No saved snapshot found, starting fresh");
        return Ok(None);
    }

    let json = std::fs::read_to_string(path)
        .context(format!("Failed to read snapshot from {path}"))?;

    let snapshot: PoolSnapshot = serde_json::from_str(&json)
        .context(format!("Failed to parse snapshot from {path}"))?;

    info!(
        path,
        balance = %snapshot.balance,
        stakes = snapshot.stakes.len(),
        outcome = %snapshot.announced,
        "Snapshot loaded from disk"
    );

    Ok(Some(snapshot))
}

/// Delete the snapshot file (for testing or reset).
pub fn delete_snapshot(path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_STATE_FILE);
    if Path::new(path).exists() {
        std::fs::remove_file(path)
            .context(format!("Failed to delete snapshot file {path}"))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
