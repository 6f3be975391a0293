//! Entry point for the `leak-monitor` binary.
//!
//! One run is one sweep: connect to the stores, check every water-leak
//! channel for unacknowledged readings, alert via the in-process SMS
//! gateway, acknowledge what was delivered, and exit. Scheduling (cron,
//! systemd timer) is external.
//!
//! # Environment Variables
//! - `SENSOR_DB` (**required**) – collector's sensor store, opened read-only
//! - `ALERT_DB` (**required**) – acknowledgement/display-name store
//! - `ALERT_RECIPIENTS` (**required**) – comma-separated alert recipients
//! - `ROUTER_*`, `ALLOWED_PHONE_NUMBERS`, `AUDIT_DB` – gateway settings,
//!   see `config`
//! - `LOG_LEVEL` / `RUST_LOG` (optional) – log verbosity
//!
//! Exits 0 after a completed sweep (delivery failures stay visible in the
//! logs and as unacknowledged events); exits 1 on fatal setup errors.

use anyhow::Result;
use dotenvy::dotenv;

use leakwatch::gateway::GatewaySender;
use leakwatch::{config, logging, monitor, schema, store};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    logging::init_tracing();
    dotenv().ok();

    let cfg = config::load_monitor_from_env()?;
    cfg.log_config();

    let sensor_pool = store::open_sensor_store(&cfg.sensor_db).await?;
    let alert_pool = store::open_alert_store(&cfg.alert_db).await?;
    let audit_pool = store::open_audit_store(&cfg.gateway.audit_db).await?;

    schema::ensure_alert_schema(&alert_pool).await?;
    schema::ensure_audit_schema(&audit_pool).await?;

    let mut sender = GatewaySender {
        config: &cfg.gateway,
        audit: &audit_pool,
    };

    let stats = monitor::run_sweep(&sensor_pool, &alert_pool, &mut sender, &cfg.recipients).await?;

    tracing::info!(
        channels = stats.channels,
        alerts = stats.alerts,
        acknowledged = stats.acknowledged,
        failed = stats.failed,
        "sweep complete"
    );

    Ok(())
}
