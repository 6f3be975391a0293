//! Alert store queries: acknowledgements and display names.

use sqlx::SqlitePool;

// ---

/// Whether an alert for the exact (itemname, time, value) triple has
/// already been delivered and acknowledged.
pub async fn is_acknowledged(
    pool: &SqlitePool,
    item_name: &str,
    time: &str,
    value: &str,
) -> Result<bool, sqlx::Error> {
    // ---
    let row: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT acknowledged FROM acknowledged_wleaks
        WHERE itemname = ? AND time = ? AND value = ? AND acknowledged = 1
        "#,
    )
    .bind(item_name)
    .bind(time)
    .bind(value)
    .fetch_optional(pool)
    .await?;

    Ok(row.is_some())
}

/// Record that the alert for this leak event was delivered.
pub async fn acknowledge(
    pool: &SqlitePool,
    item_name: &str,
    time: &str,
    value: &str,
) -> Result<(), sqlx::Error> {
    // ---
    sqlx::query(
        "INSERT INTO acknowledged_wleaks (itemname, time, value, acknowledged) VALUES (?, ?, ?, 1)",
    )
    .bind(item_name)
    .bind(time)
    .bind(value)
    .execute(pool)
    .await?;

    Ok(())
}

/// Look up the operator-assigned display name for a channel, if any.
pub async fn human_name(pool: &SqlitePool, sensor: &str) -> Result<Option<String>, sqlx::Error> {
    // ---
    sqlx::query_scalar("SELECT human_name FROM human_sensor_names WHERE openhab_sensor_name = ?")
        .bind(sensor)
        .fetch_optional(pool)
        .await
}
