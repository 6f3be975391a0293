//! Audit store queries for the gateway's attempt log.
//!
//! Both helpers run against a caller-held connection so the rate-check
//! read and the attempt insert share one transaction (the two together
//! must be serialized across overlapping invocations).

use sqlx::SqliteConnection;

use crate::gateway::rate::RATE_WINDOW_MESSAGES;

// ---

/// Timestamps of the most recent send attempts, newest first.
///
/// At most [`RATE_WINDOW_MESSAGES`] rows are returned; that is all the
/// rate governor ever looks at.
pub async fn recent_send_times(conn: &mut SqliteConnection) -> Result<Vec<String>, sqlx::Error> {
    // ---
    sqlx::query_scalar("SELECT time FROM sent_sms ORDER BY time DESC LIMIT ?")
        .bind(RATE_WINDOW_MESSAGES as i64)
        .fetch_all(&mut *conn)
        .await
}

/// Append one attempt to the audit log, success or not.
pub async fn record_attempt(
    conn: &mut SqliteConnection,
    time: &str,
    succeeded: bool,
    phone_number: &str,
    message: &str,
) -> Result<(), sqlx::Error> {
    // ---
    sqlx::query(
        "INSERT INTO sent_sms (time, sending_succeeded, phone_number, message) VALUES (?, ?, ?, ?)",
    )
    .bind(time)
    .bind(succeeded)
    .bind(phone_number)
    .bind(message)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
