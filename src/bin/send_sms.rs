//! Entry point for the `send-sms` binary.
//!
//! Delivers exactly one SMS through the router's management API:
//!
//! ```text
//! send-sms <phone number> <message>
//! ```
//!
//! Exit code 0 means the router confirmed the send. Anything else (bad
//! configuration, a number missing from the allow-list, a full rate
//! window, corrupted audit data, a failed delivery) exits 1, so a caller
//! can treat the exit code as delivered/not-delivered.
//!
//! # Environment Variables
//! - `ROUTER_BASE_URL`, `ROUTER_USERNAME`, `ROUTER_PASSWORD` (**required**)
//! - `ALLOWED_PHONE_NUMBERS` (**required**) – comma-separated allow-list
//! - `AUDIT_DB` (**required**) – audit/rate-limit SQLite file
//! - `HTTP_TIMEOUT_SECS` (optional) – per-request bound, default 10
//! - `LOG_LEVEL` / `RUST_LOG` (optional) – log verbosity

use std::env;
use std::process::ExitCode;

use anyhow::Result;
use dotenvy::dotenv;

use leakwatch::{config, gateway, logging, schema, store};

// ---

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // ---
    let mut args = env::args();
    let program = args.next().unwrap_or_else(|| "send-sms".to_string());
    let (phone_number, message) = match (args.next(), args.next(), args.next()) {
        (Some(number), Some(message), None) => (number, message),
        _ => {
            eprintln!("Syntax: {program} <phone number> <SMS message>");
            return Ok(ExitCode::FAILURE);
        }
    };

    logging::init_tracing();
    dotenv().ok();

    let cfg = config::load_gateway_from_env()?;
    cfg.log_config();

    let audit_pool = store::open_audit_store(&cfg.audit_db).await?;
    schema::ensure_audit_schema(&audit_pool).await?;

    let report = gateway::deliver(&cfg, &audit_pool, &phone_number, &message).await?;

    if report.delivered {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
