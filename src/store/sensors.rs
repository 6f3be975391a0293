//! Read-only queries against the collector's sensor store.
//!
//! The store keeps a catalog table `items(ItemId, itemname)` and one
//! per-channel table `itemNNNN` (zero-padded 4-digit ItemId) holding the
//! raw `(time, value)` readings.

use sqlx::SqlitePool;

use crate::models::{LeakChannel, SensorReading};

/// How many of the newest readings a sweep inspects per channel.
pub const READINGS_PER_CHANNEL: i64 = 10;

// ---

/// Enumerate channels whose name follows the water-leak convention.
pub async fn leak_channels(pool: &SqlitePool) -> Result<Vec<LeakChannel>, sqlx::Error> {
    // ---
    sqlx::query_as::<_, LeakChannel>(
        "SELECT ItemId, itemname FROM items WHERE itemname LIKE '%wleak%_leak'",
    )
    .fetch_all(pool)
    .await
}

/// Fetch the most recent readings for one channel, newest first.
///
/// The table name is derived from the numeric item id; it cannot be bound
/// as a parameter, so it is formatted into the statement the same way the
/// collector names the tables.
pub async fn recent_readings(
    pool: &SqlitePool,
    item_id: i64,
) -> Result<Vec<SensorReading>, sqlx::Error> {
    // ---
    let statement = format!(
        "SELECT time, value FROM item{item_id:04} ORDER BY time DESC LIMIT {READINGS_PER_CHANNEL}"
    );

    sqlx::query_as::<_, SensorReading>(&statement)
        .fetch_all(pool)
        .await
}
