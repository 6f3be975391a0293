//! SMS delivery through the router's HTTP management API.
//!
//! One call to [`deliver`] runs the whole linear pipeline for a single
//! message: validate, rate-check, authenticate, send, logout, record.
//! There is no branching back; each stage produces a typed result.
//!
//! Failure semantics follow two tiers. The fatal preconditions
//! ([`GatewayError`]) abort before anything observable happened and leave
//! no audit row. Everything past them resolves to a [`SendReport`]: the
//! attempt is recorded either way, and the caller reads `delivered` to
//! decide what to do next.

use chrono::Local;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::GatewayConfig;
use crate::models::{SendReport, Stage, TIME_FORMAT};
use crate::monitor::SmsSender;
use crate::store::audit;

pub mod auth;
pub mod rate;
pub mod xml;

pub use auth::{Session, TOKEN_HEADER};

// ---

/// Fatal preconditions: nothing was sent, nothing was recorded.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("not allowed to send SMS to number {0}")]
    DisallowedNumber(String),
    #[error("already sent {} SMS within the last {} minutes", rate::RATE_WINDOW_MESSAGES, rate::RATE_WINDOW_MINUTES)]
    RateLimited,
    #[error("audit store holds a malformed timestamp {0:?}")]
    DataCorruption(String),
    #[error("unsupported router password scheme {0:?}")]
    UnsupportedPasswordScheme(String),
    #[error("audit store error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Why the send stage itself did not go through.
#[derive(Debug, Error)]
enum SendError {
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),
    #[error("router did not confirm the send")]
    Unconfirmed,
}

/// Deliver exactly one SMS and record the attempt.
///
/// The audit transaction opened for the rate-check stays open across the
/// network stages and also carries the attempt insert, so overlapping
/// invocations cannot both take the last window slot.
pub async fn deliver(
    config: &GatewayConfig,
    audit_pool: &SqlitePool,
    phone_number: &str,
    message: &str,
) -> Result<SendReport, GatewayError> {
    // ---
    // Stage 1: allow-list. Fatal, no side effects.
    if !config.allowed_numbers.iter().any(|n| n == phone_number) {
        return Err(GatewayError::DisallowedNumber(phone_number.to_string()));
    }

    // Stage 2: rate window, inside the transaction that will also record
    // the attempt. An early return drops the transaction unwritten.
    let mut tx = audit_pool.begin().await?;
    let recent = audit::recent_send_times(&mut tx).await?;
    let now = Local::now().naive_local();
    rate::check(&recent, now)?;
    let stamp = now.format(TIME_FORMAT).to_string();

    // Stages 3-5: authenticate, send, logout. Only an unsupported
    // password scheme escapes as fatal; the rest folds into the report.
    let report = attempt(config, phone_number, message, &stamp).await?;

    // Stage 6: record the attempt regardless of its outcome.
    audit::record_attempt(&mut tx, &stamp, report.delivered, phone_number, message).await?;
    tx.commit().await?;

    match &report.failure {
        None => info!(%phone_number, "SMS delivered"),
        Some(failure) => warn!(%phone_number, %failure, "SMS attempt failed"),
    }
    Ok(report)
}

/// Run the network stages of the pipeline.
async fn attempt(
    config: &GatewayConfig,
    phone_number: &str,
    message: &str,
    stamp: &str,
) -> Result<SendReport, GatewayError> {
    // ---
    let client = match http_client(config) {
        Ok(client) => client,
        Err(err) => return Ok(SendReport::failed(Stage::Authenticate, err.to_string())),
    };

    let mut session = match auth::login(&client, config).await {
        Ok(session) => session,
        Err(auth::LoginError::UnsupportedScheme(code)) => {
            return Err(GatewayError::UnsupportedPasswordScheme(code));
        }
        Err(err) => return Ok(SendReport::failed(Stage::Authenticate, err.to_string())),
    };

    let outcome = send_message(&client, config, &mut session, phone_number, message, stamp).await;

    // Logout runs regardless of the send outcome and never fails the run.
    logout(&client, config, &mut session).await;

    match outcome {
        Ok(()) => Ok(SendReport::success()),
        Err(err) => Ok(SendReport::failed(Stage::Send, err.to_string())),
    }
}

/// Session-scoped HTTP client: cookie jar for the router's session cookie
/// and a bounded timeout on every call.
fn http_client(config: &GatewayConfig) -> reqwest::Result<Client> {
    // ---
    Client::builder()
        .cookie_store(true)
        .timeout(config.http_timeout)
        .build()
}

/// POST one message and check for the router's confirmation marker.
async fn send_message(
    client: &Client,
    config: &GatewayConfig,
    session: &mut Session,
    phone_number: &str,
    message: &str,
    stamp: &str,
) -> Result<(), SendError> {
    // ---
    let escaped = xml::escape_message(message);
    let payload = xml::sms_payload(phone_number, &escaped, stamp);

    let response = client
        .post(format!("{}/api/sms/send-sms", config.base_url))
        .header(TOKEN_HEADER, &session.token)
        .header(CONTENT_TYPE, "charset=UTF-8")
        .body(payload)
        .send()
        .await?;
    session.absorb(response.headers());

    let body = response.text().await?;
    if xml::is_ok_response(&body) {
        Ok(())
    } else {
        Err(SendError::Unconfirmed)
    }
}

/// POST the logout request; failures are logged, never propagated.
async fn logout(client: &Client, config: &GatewayConfig, session: &mut Session) {
    // ---
    let result = client
        .post(format!("{}/api/user/logout", config.base_url))
        .header(TOKEN_HEADER, &session.token)
        .body(xml::LOGOUT_PAYLOAD)
        .send()
        .await;

    match result {
        Ok(response) => {
            session.absorb(response.headers());
            match response.text().await {
                Ok(body) if xml::is_ok_response(&body) => {}
                Ok(_) => warn!("logout of SMS sending device did not report success"),
                Err(err) => warn!(%err, "logout response could not be read"),
            }
        }
        Err(err) => warn!(%err, "logout of SMS sending device failed"),
    }
}

/// In-process sender used by the leak monitor: one [`deliver`] call per
/// recipient, sharing the loaded configuration and the audit pool.
pub struct GatewaySender<'a> {
    pub config: &'a GatewayConfig,
    pub audit: &'a SqlitePool,
}

impl SmsSender for GatewaySender<'_> {
    async fn send(&mut self, phone_number: &str, message: &str) -> Result<SendReport, GatewayError> {
        deliver(self.config, self.audit, phone_number, message).await
    }
}
