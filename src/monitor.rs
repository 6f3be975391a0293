//! The leak monitor sweep: detect unacknowledged readings, alert, record.

use anyhow::Result;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::gateway::GatewayError;
use crate::models::{alert_text, SendReport, SweepStats};
use crate::names::NameCache;
use crate::store::{acks, sensors};

// ---

/// Delivery seam between the monitor and the SMS gateway.
///
/// In production this is [`crate::gateway::GatewaySender`]; tests plug in
/// a scripted fake. The typed report replaces the exit-code contract the
/// two halves of this system historically shared.
#[allow(async_fn_in_trait)]
pub trait SmsSender {
    async fn send(&mut self, phone_number: &str, message: &str)
        -> Result<SendReport, GatewayError>;
}

/// Run one full sweep over the sensor store.
///
/// Every leak channel's ten most recent readings are inspected in
/// chronological order, so an older unacknowledged event is alerted before
/// a newer one. An event is marked acknowledged only when delivery
/// succeeded to **every** recipient; partial failures are logged per
/// recipient and leave the event for the next sweep.
pub async fn run_sweep<S: SmsSender>(
    sensor_pool: &SqlitePool,
    alert_pool: &SqlitePool,
    sender: &mut S,
    recipients: &[String],
) -> Result<SweepStats> {
    // ---
    let mut names = NameCache::new();
    let mut stats = SweepStats::default();

    let channels = sensors::leak_channels(sensor_pool).await?;
    stats.channels = channels.len();
    info!("Checking {} water leak channels", channels.len());

    for channel in &channels {
        // ---
        let readings = sensors::recent_readings(sensor_pool, channel.item_id).await?;
        debug!(
            channel = %channel.item_name,
            readings = readings.len(),
            "inspecting channel"
        );

        // The store hands back newest-first; walk oldest-first so earlier
        // events alert before later ones.
        for reading in readings.iter().rev() {
            // ---
            if acks::is_acknowledged(alert_pool, &channel.item_name, &reading.time, &reading.value)
                .await?
            {
                continue;
            }

            let human_name = names.resolve(alert_pool, &channel.item_name).await?;
            let message = alert_text(&human_name, reading);
            info!("Sending the following alert via SMS: {message}");
            stats.alerts += 1;

            let mut delivered_to_all = true;
            for recipient in recipients {
                match sender.send(recipient, &message).await {
                    Ok(SendReport { delivered: true, .. }) => {}
                    Ok(report) => {
                        delivered_to_all = false;
                        let reason = report.failure.map(|f| f.to_string()).unwrap_or_default();
                        warn!(%recipient, %reason, "failed to send SMS");
                    }
                    Err(err) => {
                        delivered_to_all = false;
                        warn!(%recipient, %err, "SMS delivery aborted");
                    }
                }
            }

            if delivered_to_all {
                acks::acknowledge(alert_pool, &channel.item_name, &reading.time, &reading.value)
                    .await?;
                stats.acknowledged += 1;
            } else {
                // Left unacknowledged: the next sweep tries again
                stats.failed += 1;
            }
        }
    }

    Ok(stats)
}
