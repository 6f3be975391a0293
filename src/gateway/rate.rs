//! Sliding-window rate governor for outbound SMS.
//!
//! A safety cap rather than a fairness mechanism: a runaway caller must
//! not be able to push out hundreds of messages before anyone notices.

use chrono::{Duration, NaiveDateTime};

use crate::gateway::GatewayError;
use crate::models::TIME_FORMAT;

/// Messages allowed inside one rate window.
pub const RATE_WINDOW_MESSAGES: usize = 5;

/// Length of the rolling window in minutes.
pub const RATE_WINDOW_MINUTES: i64 = 5;

// ---

/// Decide whether one more send fits the window.
///
/// `recent_desc` holds the stored attempt timestamps, newest first, at
/// most [`RATE_WINDOW_MESSAGES`] of them. With fewer than that, sending is
/// always allowed. Otherwise the oldest of them must be more than
/// [`RATE_WINDOW_MINUTES`] behind `now`. A timestamp that does not parse
/// is data corruption, surfaced distinctly from ordinary throttling.
pub fn check(recent_desc: &[String], now: NaiveDateTime) -> Result<(), GatewayError> {
    // ---
    let Some(oldest) = recent_desc.get(RATE_WINDOW_MESSAGES - 1) else {
        return Ok(());
    };

    let oldest_time = NaiveDateTime::parse_from_str(oldest, TIME_FORMAT)
        .map_err(|_| GatewayError::DataCorruption(oldest.clone()))?;

    if oldest_time + Duration::minutes(RATE_WINDOW_MINUTES) < now {
        Ok(())
    } else {
        Err(GatewayError::RateLimited)
    }
}
