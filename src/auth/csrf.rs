//! Double-submit CSRF token for the login form
//!
//! The token travels twice: in a cookie set alongside the form and in a
//! hidden form field. A login POST is accepted only when both are present
//! and equal, which a cross-site page cannot arrange.

use super::session::{cookie_value, random_id};
use hyper::HeaderMap;

pub const CSRF_COOKIE_NAME: &str = "docserve_csrftoken";

/// Hidden form field carrying the token
pub const CSRF_FIELD_NAME: &str = "csrfmiddlewaretoken";

/// One year
const CSRF_COOKIE_MAX_AGE: u32 = 31_449_600;

pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    cookie_value(headers, CSRF_COOKIE_NAME)
}

/// Token for a rendered form: the client's current one, or a fresh one
pub fn token_for(existing: Option<&str>) -> String {
    existing
        .filter(|t| !t.is_empty())
        .map_or_else(random_id, ToString::to_string)
}

pub fn rotate() -> String {
    random_id()
}

pub fn cookie_header(token: &str, secure: bool) -> String {
    format!(
        "{CSRF_COOKIE_NAME}={token}; HttpOnly; {}SameSite=Strict; Path=/; Max-Age={CSRF_COOKIE_MAX_AGE}",
        if secure { "Secure; " } else { "" },
    )
}

/// Both copies present, non-empty and equal
pub fn verify(cookie: Option<&str>, submitted: Option<&str>) -> bool {
    match (cookie, submitted) {
        (Some(cookie), Some(submitted)) if !cookie.is_empty() => {
            constant_time_eq(cookie.as_bytes(), submitted.as_bytes())
        }
        _ => false,
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
