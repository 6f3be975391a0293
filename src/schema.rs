//! Database schema management for the stores this system owns.
//!
//! Ensures required tables and indexes exist before a run touches them.
//! Applied once on startup from the binaries (EMBP: single gateway call
//! per store). The sensor store belongs to the external collector and is
//! never created or altered here.

use anyhow::Result;
use sqlx::SqlitePool;

// ---

/// Create or update the alert store schema (idempotent).
///
/// Creates `acknowledged_wleaks` for delivery acknowledgements and
/// `human_sensor_names` for operator-assigned display names. Safe to call
/// on every startup; no-op if objects already exist.
///
/// Errors are propagated if any SQL execution fails.
pub async fn ensure_alert_schema(pool: &SqlitePool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    // One row per leak event whose alert was confirmed delivered
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS acknowledged_wleaks (
            id           INTEGER      NOT NULL PRIMARY KEY AUTOINCREMENT,
            itemname     VARCHAR(500) NOT NULL,
            time         TIMESTAMP    NOT NULL,
            value        VARCHAR(6)   NOT NULL,
            acknowledged INTEGER      NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Reference data mapping collector channel names to display names
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS human_sensor_names (
            openhab_sensor_name VARCHAR(500) NOT NULL,
            human_name          VARCHAR(40)  NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // The monitor probes by exact (itemname, time, value) triple
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_acknowledged_wleaks_triple
            ON acknowledged_wleaks (itemname, time, value);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

/// Create or update the audit store schema (idempotent).
///
/// Creates the `sent_sms` attempt log that also backs the rate-limit
/// window. Safe to call on every startup.
pub async fn ensure_audit_schema(pool: &SqlitePool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sent_sms (
            id                INTEGER      NOT NULL PRIMARY KEY AUTOINCREMENT,
            time              TIMESTAMP    NOT NULL,
            sending_succeeded INTEGER      NOT NULL,
            phone_number      VARCHAR(30)  NOT NULL,
            message           VARCHAR(500) NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // The rate check reads the newest rows first
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_sent_sms_time
            ON sent_sms (time DESC);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
