//! Payload building and response scraping for the router's XML API.
//!
//! The router speaks a small fixed dialect; payloads are assembled as
//! literal strings and responses are probed for known markers rather than
//! parsed as full documents.

use std::sync::OnceLock;

use regex::Regex;

/// Literal marker the router puts in every successful response body.
pub const OK_RESPONSE: &str = "<response>OK</response>";

/// Logout request body; the session token rides in the header.
pub const LOGOUT_PAYLOAD: &str =
    r#"<?xml version="1.0" encoding="UTF-8"?><request><Logout>1</Logout></request>"#;

// ---

/// Escape the characters the router's SMS endpoint chokes on.
///
/// `&` is replaced first so the entities introduced by the later
/// substitutions are not escaped a second time. UTF-8 text such as scandic
/// letters needs no treatment.
pub fn escape_message(message: &str) -> String {
    // ---
    message
        .replace('&', "&amp;")
        .replace('(', "&#40;")
        .replace(')', "&#41;")
        .replace('\'', "&#39;")
        .replace('"', "&quot;")
        .replace('/', "&#x2F;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Login request body with the already-hashed password.
pub fn login_payload(username: &str, hashed_password: &str) -> String {
    // ---
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" ?><request><Username type="str">{username}</Username><Password type="str">{hashed_password}</Password><password_type type="int">4</password_type></request>"#
    )
}

/// SMS request body for one destination.
///
/// `Length` counts the characters of the escaped content, matching what
/// the router sees in `Content`.
pub fn sms_payload(phone_number: &str, escaped_message: &str, date: &str) -> String {
    // ---
    let length = escaped_message.chars().count();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><request><Index>-1</Index><Phones><Phone>{phone_number}</Phone></Phones><Sca></Sca><Content>{escaped_message}</Content><Length>{length}</Length><Reserved>1</Reserved><Date>{date}</Date></request>"#
    )
}

/// Whether a response body carries the router's success marker.
pub fn is_ok_response(body: &str) -> bool {
    body.contains(OK_RESPONSE)
}

/// Pull the anti-forgery token out of the login page markup.
///
/// The token sits in a `<meta name="csrf_token" content="...">` element;
/// the first occurrence wins.
pub fn scrape_csrf_token(html: &str) -> Option<String> {
    // ---
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)meta name="csrf_token" content="([^"]*)""#).expect("csrf token pattern")
    });

    pattern
        .captures(html)
        .map(|captures| captures[1].to_string())
}

/// Extract the text content of a simple, non-nested XML tag.
pub fn extract_tag(xml: &str, tag: &str) -> Option<String> {
    // ---
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = xml.find(&open)? + open.len();
    let end = xml[start..].find(&close)? + start;
    Some(xml[start..end].to_string())
}
