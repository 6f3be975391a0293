//! Configuration loader for the `leakwatch` tools.
//!
//! This module centralizes all runtime configuration values and their
//! defaults, loading from environment variables (with optional `.env` file
//! support provided by the caller). By consolidating configuration logic
//! here, we avoid scattering `env::var` calls throughout the codebase.

use std::env;
use std::time::Duration;

use anyhow::{anyhow, Result};

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u64 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u64>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Settings needed to deliver one SMS through the router.
///
/// All fields are immutable after loading, ensuring a consistent
/// configuration snapshot for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    // ---
    /// Router management API base URL, without a trailing slash.
    pub base_url: String,

    /// Router web UI account name.
    pub username: String,

    /// Router web UI password (plaintext; hashed per the router's scheme
    /// before transmission).
    pub password: String,

    /// Destination numbers we are willing to send to.
    pub allowed_numbers: Vec<String>,

    /// Path to the SQLite file holding the `sent_sms` audit log.
    pub audit_db: String,

    /// Bound applied to every outbound HTTP call.
    pub http_timeout: Duration,
}

/// Settings for a full monitor sweep, on top of the gateway's.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    // ---
    /// Path to the read-only sensor store (owned by the collector).
    pub sensor_db: String,

    /// Path to the alert store (`acknowledged_wleaks`, `human_sensor_names`).
    pub alert_db: String,

    /// Numbers every leak alert is sent to.
    pub recipients: Vec<String>,

    /// Delivery settings, used in-process by the monitor.
    pub gateway: GatewayConfig,
}

/// Load the SMS gateway configuration from environment variables.
///
/// Required:
/// - `ROUTER_BASE_URL` – router management API base URL
/// - `ROUTER_USERNAME` / `ROUTER_PASSWORD` – router credentials
/// - `ALLOWED_PHONE_NUMBERS` – comma-separated destination allow-list
/// - `AUDIT_DB` – path to the audit/rate-limit SQLite file
///
/// Optional:
/// - `HTTP_TIMEOUT_SECS` – per-request HTTP bound (default: 10)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_gateway_from_env() -> Result<GatewayConfig> {
    // ---
    let base_url = require_env!("ROUTER_BASE_URL")
        .trim_end_matches('/')
        .to_string();
    let username = require_env!("ROUTER_USERNAME");
    let password = require_env!("ROUTER_PASSWORD");
    let allowed_numbers = parse_list(&require_env!("ALLOWED_PHONE_NUMBERS"))
        .ok_or_else(|| anyhow!("ALLOWED_PHONE_NUMBERS must list at least one number"))?;
    let audit_db = require_env!("AUDIT_DB");
    let http_timeout = Duration::from_secs(parse_env_u64!("HTTP_TIMEOUT_SECS", 10));

    Ok(GatewayConfig {
        base_url,
        username,
        password,
        allowed_numbers,
        audit_db,
        http_timeout,
    })
}

/// Load the monitor configuration (gateway settings included).
///
/// Additionally required over [`load_gateway_from_env`]:
/// - `SENSOR_DB` – path to the sensor store SQLite file
/// - `ALERT_DB` – path to the alert/acknowledgement SQLite file
/// - `ALERT_RECIPIENTS` – comma-separated recipients for leak alerts
pub fn load_monitor_from_env() -> Result<MonitorConfig> {
    // ---
    let sensor_db = require_env!("SENSOR_DB");
    let alert_db = require_env!("ALERT_DB");
    let recipients = parse_list(&require_env!("ALERT_RECIPIENTS"))
        .ok_or_else(|| anyhow!("ALERT_RECIPIENTS must list at least one number"))?;
    let gateway = load_gateway_from_env()?;

    Ok(MonitorConfig {
        sensor_db,
        alert_db,
        recipients,
        gateway,
    })
}

/// Split a comma-separated value into trimmed, non-empty entries.
///
/// Returns `None` when nothing usable remains, so required lists can be
/// rejected at load time rather than surfacing as a no-op run.
fn parse_list(raw: &str) -> Option<Vec<String>> {
    // ---
    let entries: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect();
    if entries.is_empty() {
        None
    } else {
        Some(entries)
    }
}

impl GatewayConfig {
    /// Log the loaded configuration for debugging purposes.
    ///
    /// The router password is never printed; everything else that was
    /// loaded is shown as-is.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  ROUTER_BASE_URL       : {}", self.base_url);
        tracing::info!("  ROUTER_USERNAME       : {}", self.username);
        tracing::info!("  ROUTER_PASSWORD       : ****");
        tracing::info!("  ALLOWED_PHONE_NUMBERS : {}", self.allowed_numbers.join(","));
        tracing::info!("  AUDIT_DB              : {}", self.audit_db);
        tracing::info!("  HTTP_TIMEOUT_SECS     : {}", self.http_timeout.as_secs());
    }
}

impl MonitorConfig {
    /// Log the loaded configuration, gateway part included.
    pub fn log_config(&self) {
        // ---
        self.gateway.log_config();
        tracing::info!("  SENSOR_DB             : {}", self.sensor_db);
        tracing::info!("  ALERT_DB              : {}", self.alert_db);
        tracing::info!("  ALERT_RECIPIENTS      : {}", self.recipients.join(","));
    }
}
