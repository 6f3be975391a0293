//! SQLite store access for the three databases this system touches.
//!
//! Gateway module (EMBP): connection setup lives here, per-table query
//! helpers live in the sibling modules.
//!
//! - `sensors` – the collector's store, opened read-only
//! - `acks` – the alert store (acknowledgements + display names)
//! - `audit` – the gateway's attempt log and rate-limit window

use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteLockingMode, SqlitePoolOptions};
use sqlx::SqlitePool;

pub mod acks;
pub mod audit;
pub mod sensors;

// ---

/// Open the external sensor store.
///
/// The collector owns this file; opening read-only keeps a misbehaving
/// sweep from ever mutating it.
pub async fn open_sensor_store(path: &str) -> Result<SqlitePool> {
    // ---
    let options = SqliteConnectOptions::new().filename(path).read_only(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open sensor store '{path}'"))
}

/// Open the alert store (acknowledgements and display names).
pub async fn open_alert_store(path: &str) -> Result<SqlitePool> {
    // ---
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open alert store '{path}'"))
}

/// Open the audit store with an exclusive file lock.
///
/// The rate-check and the attempt insert must behave as if serialized
/// across overlapping invocations; the exclusive locking mode holds the
/// write lock for the connection's lifetime, so a second invocation waits
/// (up to the busy timeout) instead of racing for the last window slot.
pub async fn open_audit_store(path: &str) -> Result<SqlitePool> {
    // ---
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .locking_mode(SqliteLockingMode::Exclusive)
        .busy_timeout(Duration::from_secs(10));

    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open audit store '{path}'"))
}
