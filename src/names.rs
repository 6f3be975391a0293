//! Memoizing resolver for human-readable sensor names.

use std::collections::HashMap;

use sqlx::SqlitePool;

use crate::store::acks;

// ---

/// In-memory name cache with alert-store fallback.
///
/// A name is looked up at most once per run: cache first, then the
/// `human_sensor_names` table, then a synthesized `UNKNOWN <sensor>` label.
/// Whatever was resolved is cached for the remainder of the sweep. The
/// key space is bounded by the installed sensors, so there is no eviction.
#[derive(Debug, Default)]
pub struct NameCache {
    known: HashMap<String, String>,
}

impl NameCache {
    // ---
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the display name for a sensor channel.
    pub async fn resolve(&mut self, alerts: &SqlitePool, sensor: &str) -> Result<String, sqlx::Error> {
        // ---
        if let Some(name) = self.known.get(sensor) {
            return Ok(name.clone());
        }

        let name = match acks::human_name(alerts, sensor).await? {
            Some(name) => name,
            None => format!("UNKNOWN {sensor}"),
        };
        self.known.insert(sensor.to_string(), name.clone());
        Ok(name)
    }
}
