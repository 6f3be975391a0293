use std::collections::VecDeque;

use anyhow::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use leakwatch::monitor::{run_sweep, SmsSender};
use leakwatch::store::{acks, open_audit_store};
use leakwatch::{schema, GatewayError, NameCache, SendReport, Stage};

// ---

/// In-memory pool pinned to one connection so every query sees the same
/// database.
async fn memory_pool() -> SqlitePool {
    // ---
    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory SQLite pool")
}

/// Build a sensor store with one leak channel and the given readings.
async fn seed_sensor_store(pool: &SqlitePool, readings: &[(&str, &str)]) {
    // ---
    sqlx::query("CREATE TABLE items (ItemId INTEGER NOT NULL, itemname VARCHAR(500) NOT NULL)")
        .execute(pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO items (ItemId, itemname) VALUES (1, 'mihome_sensor_wleak_aq1_158d0001_leak')")
        .execute(pool)
        .await
        .unwrap();
    sqlx::query("CREATE TABLE item0001 (time TIMESTAMP NOT NULL, value VARCHAR(6) NOT NULL)")
        .execute(pool)
        .await
        .unwrap();
    for (time, value) in readings {
        sqlx::query("INSERT INTO item0001 (time, value) VALUES (?, ?)")
            .bind(time)
            .bind(value)
            .execute(pool)
            .await
            .unwrap();
    }
}

/// Scripted sender: pops one outcome per call, defaults to success, and
/// records every (recipient, message) pair it saw.
struct FakeSender {
    script: VecDeque<bool>,
    calls: Vec<(String, String)>,
}

impl FakeSender {
    fn always_succeeding() -> Self {
        Self {
            script: VecDeque::new(),
            calls: Vec::new(),
        }
    }

    fn scripted(outcomes: &[bool]) -> Self {
        Self {
            script: outcomes.iter().copied().collect(),
            calls: Vec::new(),
        }
    }
}

impl SmsSender for FakeSender {
    async fn send(&mut self, phone_number: &str, message: &str) -> Result<SendReport, GatewayError> {
        // ---
        self.calls.push((phone_number.to_string(), message.to_string()));
        let delivered = self.script.pop_front().unwrap_or(true);
        Ok(if delivered {
            SendReport::success()
        } else {
            SendReport::failed(Stage::Send, "scripted failure")
        })
    }
}

fn recipients(numbers: &[&str]) -> Vec<String> {
    numbers.iter().map(|n| n.to_string()).collect()
}

// ---

#[tokio::test]
async fn unacknowledged_leak_is_alerted_and_acknowledged() -> Result<()> {
    // ---
    let sensor_pool = memory_pool().await;
    let alert_pool = memory_pool().await;
    seed_sensor_store(&sensor_pool, &[("2024-01-01 10:00:00", "1")]).await;
    schema::ensure_alert_schema(&alert_pool).await?;

    let mut sender = FakeSender::always_succeeding();
    let to = recipients(&["+358451111111", "+358452222222"]);
    let stats = run_sweep(&sensor_pool, &alert_pool, &mut sender, &to).await?;

    assert_eq!(stats.channels, 1);
    assert_eq!(stats.alerts, 1);
    assert_eq!(stats.acknowledged, 1);
    assert_eq!(stats.failed, 0);

    // Both recipients got the same alert; the name fell back to the
    // synthesized label because no display name is configured.
    let expected = "water leak in UNKNOWN mihome_sensor_wleak_aq1_158d0001_leak \
                    at 2024-01-01 10:00:00 with value 1"
        .to_string();
    assert_eq!(sender.calls.len(), 2);
    assert_eq!(sender.calls[0], ("+358451111111".to_string(), expected.clone()));
    assert_eq!(sender.calls[1], ("+358452222222".to_string(), expected));

    // The confirmed delivery left an acknowledged row for the exact triple
    assert!(
        acks::is_acknowledged(
            &alert_pool,
            "mihome_sensor_wleak_aq1_158d0001_leak",
            "2024-01-01 10:00:00",
            "1"
        )
        .await?
    );
    Ok(())
}

#[tokio::test]
async fn acknowledged_triples_are_never_realerted() -> Result<()> {
    // ---
    let sensor_pool = memory_pool().await;
    let alert_pool = memory_pool().await;
    seed_sensor_store(
        &sensor_pool,
        &[("2024-01-01 10:00:00", "1"), ("2024-01-01 11:00:00", "1")],
    )
    .await;
    schema::ensure_alert_schema(&alert_pool).await?;

    acks::acknowledge(
        &alert_pool,
        "mihome_sensor_wleak_aq1_158d0001_leak",
        "2024-01-01 10:00:00",
        "1",
    )
    .await?;

    let mut sender = FakeSender::always_succeeding();
    let to = recipients(&["+358451111111"]);
    let stats = run_sweep(&sensor_pool, &alert_pool, &mut sender, &to).await?;

    // Only the 11:00 reading alerts; the acknowledged one stays quiet
    assert_eq!(stats.alerts, 1);
    assert_eq!(sender.calls.len(), 1);
    assert!(sender.calls[0].1.contains("at 2024-01-01 11:00:00"));
    Ok(())
}

#[tokio::test]
async fn alerts_fire_in_chronological_order() -> Result<()> {
    // ---
    let sensor_pool = memory_pool().await;
    let alert_pool = memory_pool().await;
    // Inserted newest-first on purpose; the store query returns
    // descending order either way.
    seed_sensor_store(
        &sensor_pool,
        &[
            ("2024-01-01 11:00:00", "1"),
            ("2024-01-01 09:00:00", "1"),
            ("2024-01-01 10:00:00", "1"),
        ],
    )
    .await;
    schema::ensure_alert_schema(&alert_pool).await?;

    let mut sender = FakeSender::always_succeeding();
    let to = recipients(&["+358451111111"]);
    run_sweep(&sensor_pool, &alert_pool, &mut sender, &to).await?;

    let times: Vec<&str> = sender
        .calls
        .iter()
        .map(|(_, message)| {
            message
                .split(" at ")
                .nth(1)
                .and_then(|rest| rest.split(" with value").next())
                .unwrap()
        })
        .collect();
    assert_eq!(
        times,
        vec![
            "2024-01-01 09:00:00",
            "2024-01-01 10:00:00",
            "2024-01-01 11:00:00"
        ]
    );
    Ok(())
}

#[tokio::test]
async fn partial_recipient_failure_leaves_event_unacknowledged() -> Result<()> {
    // ---
    let sensor_pool = memory_pool().await;
    let alert_pool = memory_pool().await;
    seed_sensor_store(&sensor_pool, &[("2024-01-01 10:00:00", "1")]).await;
    schema::ensure_alert_schema(&alert_pool).await?;

    // First recipient succeeds, second fails
    let mut sender = FakeSender::scripted(&[true, false]);
    let to = recipients(&["+358451111111", "+358452222222"]);
    let stats = run_sweep(&sensor_pool, &alert_pool, &mut sender, &to).await?;

    // Every recipient was still attempted
    assert_eq!(sender.calls.len(), 2);
    assert_eq!(stats.acknowledged, 0);
    assert_eq!(stats.failed, 1);
    assert!(
        !acks::is_acknowledged(
            &alert_pool,
            "mihome_sensor_wleak_aq1_158d0001_leak",
            "2024-01-01 10:00:00",
            "1"
        )
        .await?
    );

    // The next sweep picks the event up again and can settle it
    let mut retry = FakeSender::always_succeeding();
    let stats = run_sweep(&sensor_pool, &alert_pool, &mut retry, &to).await?;
    assert_eq!(stats.acknowledged, 1);
    assert_eq!(retry.calls.len(), 2);
    Ok(())
}

#[tokio::test]
async fn unknown_sensor_label_matches_the_documented_text() -> Result<()> {
    // ---
    let alert_pool = memory_pool().await;
    schema::ensure_alert_schema(&alert_pool).await?;

    let mut names = NameCache::new();
    let human_name = names.resolve(&alert_pool, "leakA").await?;
    let reading = leakwatch::SensorReading {
        time: "2024-01-01 10:00:00".to_string(),
        value: "1".to_string(),
    };

    assert_eq!(
        leakwatch::models::alert_text(&human_name, &reading),
        "water leak in UNKNOWN leakA at 2024-01-01 10:00:00 with value 1"
    );
    Ok(())
}

#[tokio::test]
async fn audit_store_opens_and_round_trips_on_disk() -> Result<()> {
    // ---
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("sms_sending.db");
    let path = path.to_str().unwrap();

    let pool = open_audit_store(path).await?;
    schema::ensure_audit_schema(&pool).await?;

    let mut tx = pool.begin().await?;
    leakwatch::store::audit::record_attempt(
        &mut tx,
        "2024-01-01 10:00:00",
        false,
        "+358451111111",
        "water leak in bastu-jk-1 at 2024-01-01 09:59:00 with value 1",
    )
    .await?;
    let recent = leakwatch::store::audit::recent_send_times(&mut tx).await?;
    tx.commit().await?;

    assert_eq!(recent, vec!["2024-01-01 10:00:00"]);

    let (succeeded, number): (i64, String) =
        sqlx::query_as("SELECT sending_succeeded, phone_number FROM sent_sms")
            .fetch_one(&pool)
            .await?;
    assert_eq!(succeeded, 0);
    assert_eq!(number, "+358451111111");
    Ok(())
}
