//! Router session establishment: token scraping, password hashing, login.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::header::HeaderMap;
use reqwest::Client;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use crate::config::GatewayConfig;
use crate::gateway::xml;

/// Header carrying the rotating anti-forgery token, both directions.
pub const TOKEN_HEADER: &str = "__RequestVerificationToken";

/// The only password scheme this client implements.
const SCHEME_SHA256: &str = "4";

// ---

/// Why the session could not be established.
///
/// [`LoginError::UnsupportedScheme`] is the fatal tier (the client must
/// abort before any POST); everything else resolves to a failed-attempt
/// outcome at the call site.
#[derive(Debug, Error)]
pub enum LoginError {
    #[error("router advertises password scheme {0:?}, only scheme 4 (SHA-256) is supported")]
    UnsupportedScheme(String),
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),
    #[error("login page carries no csrf_token meta element")]
    MissingCsrfToken,
    #[error("state-login response carries no password_type field")]
    MissingPasswordType,
    #[error("login response carries no rotated verification token")]
    MissingRotatedToken,
    #[error("router rejected the login request")]
    Rejected,
}

/// An authenticated router session: the cookie jar lives in the shared
/// [`Client`], the rotating token is carried here.
#[derive(Debug)]
pub struct Session {
    pub token: String,
}

impl Session {
    /// Adopt the rotated verification token from a response, if present.
    ///
    /// The router rotates the token on every authenticated response; a
    /// missing header leaves the current token in place.
    pub fn absorb(&mut self, headers: &HeaderMap) {
        // ---
        if let Some(token) = headers.get(TOKEN_HEADER).and_then(|value| value.to_str().ok()) {
            self.token = token.to_string();
        }
    }
}

/// Compute the transmitted password for the advertised scheme.
///
/// Scheme 4: the plaintext password is SHA-256-hashed, its lowercase hex
/// digest base64-encoded, and that value is concatenated as bytes between
/// the username and the CSRF token; the SHA-256 hex digest of the
/// concatenation, base64-encoded again, goes over the wire.
///
/// Scheme "0" (plain base64) and anything else are refused before any
/// network mutation.
pub fn hash_password(
    username: &str,
    scheme: &str,
    password: &str,
    csrf_token: &str,
) -> Result<String, LoginError> {
    // ---
    if scheme != SCHEME_SHA256 {
        return Err(LoginError::UnsupportedScheme(scheme.to_string()));
    }

    let password_digest = BASE64.encode(hex::encode(Sha256::digest(password.as_bytes())));

    let mut blob = Vec::with_capacity(username.len() + password_digest.len() + csrf_token.len());
    blob.extend_from_slice(username.as_bytes());
    blob.extend_from_slice(password_digest.as_bytes());
    blob.extend_from_slice(csrf_token.as_bytes());

    Ok(BASE64.encode(hex::encode(Sha256::digest(&blob))))
}

/// Run the authentication handshake against the router.
///
/// Scrapes the CSRF token from the index page, asks `state-login` for the
/// expected password scheme, posts the XML login request, and returns a
/// session holding the rotated token from the response headers.
pub async fn login(client: &Client, config: &GatewayConfig) -> Result<Session, LoginError> {
    // ---
    let index_page = client
        .get(format!("{}/html/index.html", config.base_url))
        .send()
        .await?
        .text()
        .await?;
    let csrf_token = xml::scrape_csrf_token(&index_page).ok_or(LoginError::MissingCsrfToken)?;

    let state_login = client
        .get(format!("{}/api/user/state-login", config.base_url))
        .header(TOKEN_HEADER, &csrf_token)
        .send()
        .await?
        .text()
        .await?;
    let scheme =
        xml::extract_tag(&state_login, "password_type").ok_or(LoginError::MissingPasswordType)?;
    debug!(%scheme, "router advertised password scheme");

    let hashed = hash_password(&config.username, &scheme, &config.password, &csrf_token)?;

    let response = client
        .post(format!("{}/api/user/login", config.base_url))
        .header(TOKEN_HEADER, &csrf_token)
        .body(xml::login_payload(&config.username, &hashed))
        .send()
        .await?;
    let rotated = response
        .headers()
        .get(TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let body = response.text().await?;

    if !xml::is_ok_response(&body) {
        return Err(LoginError::Rejected);
    }

    let token = rotated.ok_or(LoginError::MissingRotatedToken)?;
    Ok(Session { token })
}
