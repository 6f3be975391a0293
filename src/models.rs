//! Simple data models shared by the monitor and the gateway.

/// Timestamp layout used by every store this system touches.
///
/// The collector writes local time in this format and the audit log keeps
/// doing the same, so existing database files stay readable.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ---

/// One water-leak channel from the sensor store's `items` catalog.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LeakChannel {
    // ---
    #[sqlx(rename = "ItemId")]
    pub item_id: i64,
    #[sqlx(rename = "itemname")]
    pub item_name: String,
}

/// One raw reading from a per-channel table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SensorReading {
    // ---
    pub time: String,
    pub value: String,
}

/// Stage of the delivery pipeline where a non-fatal failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Authenticate,
    Send,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Authenticate => write!(f, "authenticate"),
            Self::Send => write!(f, "send"),
        }
    }
}

/// Why a delivery attempt did not go through.
#[derive(Debug, Clone)]
pub struct StageFailure {
    // ---
    pub stage: Stage,
    pub reason: String,
}

impl std::fmt::Display for StageFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.stage, self.reason)
    }
}

/// Outcome of one delivery attempt, after the attempt was recorded.
///
/// Failures below the fatal-precondition tier land here instead of in an
/// error: the caller reads `delivered` to decide acknowledgement.
#[derive(Debug, Clone)]
pub struct SendReport {
    // ---
    pub delivered: bool,
    pub failure: Option<StageFailure>,
}

impl SendReport {
    // ---
    pub fn success() -> Self {
        Self {
            delivered: true,
            failure: None,
        }
    }

    pub fn failed(stage: Stage, reason: impl Into<String>) -> Self {
        Self {
            delivered: false,
            failure: Some(StageFailure {
                stage,
                reason: reason.into(),
            }),
        }
    }
}

/// Counters for one monitor sweep, logged at the end of the run.
#[derive(Debug, Default, Clone, Copy)]
pub struct SweepStats {
    // ---
    /// Leak channels found in the sensor store.
    pub channels: usize,
    /// Unacknowledged readings an alert was attempted for.
    pub alerts: usize,
    /// Alerts delivered to every recipient and marked acknowledged.
    pub acknowledged: usize,
    /// Alerts left unacknowledged because at least one recipient failed.
    pub failed: usize,
}

/// Alert text for one leak event.
pub fn alert_text(human_name: &str, reading: &SensorReading) -> String {
    // ---
    format!(
        "water leak in {} at {} with value {}",
        human_name, reading.time, reading.value
    )
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn alert_text_layout() {
        // ---
        let reading = SensorReading {
            time: "2024-01-01 10:00:00".to_string(),
            value: "1".to_string(),
        };

        assert_eq!(
            alert_text("UNKNOWN leakA", &reading),
            "water leak in UNKNOWN leakA at 2024-01-01 10:00:00 with value 1"
        );
    }

    #[test]
    fn send_report_shapes() {
        // ---
        let ok = SendReport::success();
        assert!(ok.delivered);
        assert!(ok.failure.is_none());

        let failed = SendReport::failed(Stage::Send, "router did not confirm");
        assert!(!failed.delivered);
        let failure = failed.failure.unwrap();
        assert_eq!(failure.stage, Stage::Send);
        assert_eq!(failure.to_string(), "send: router did not confirm");
    }
}
