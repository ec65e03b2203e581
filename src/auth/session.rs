//! In-memory sessions and the session cookie

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Duration, Utc};
use hyper::HeaderMap;
use rand::RngCore;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

pub const SESSION_COOKIE_NAME: &str = "docserve_session";

/// Upper bound on the session lifetime (ten years)
const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 3600;

#[derive(Debug, Clone)]
struct Session {
    username: String,
    expires_at: DateTime<Utc>,
}

/// Session id -> user mapping with a fixed lifetime
pub struct SessionStore {
    ttl: Duration,
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            ttl: Duration::seconds(i64::try_from(ttl_secs.min(MAX_TTL_SECS)).unwrap_or_default()),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// Start a session and return its id
    pub fn create(&self, username: &str) -> String {
        let session_id = random_id();
        let session = Session {
            username: username.to_string(),
            expires_at: Utc::now() + self.ttl,
        };
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let now = Utc::now();
        sessions.retain(|_, s| s.expires_at > now);
        sessions.insert(session_id.clone(), session);
        session_id
    }

    /// Username for a live session
    pub fn resolve(&self, session_id: &str) -> Option<String> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        sessions
            .get(session_id)
            .filter(|s| s.expires_at > Utc::now())
            .map(|s| s.username.clone())
    }

    pub fn destroy(&self, session_id: &str) -> bool {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(session_id)
            .is_some()
    }

    /// Number of sessions held, expired ones included until the next purge
    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Value of a non-empty cookie `name` across all `Cookie` headers
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(hyper::header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|cookie| {
            cookie
                .trim()
                .strip_prefix(name)
                .and_then(|s| s.strip_prefix('='))
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
        })
}

pub(crate) fn random_id() -> String {
    let mut bytes = [0u8; 24];
    rand::thread_rng().fill_bytes(&mut bytes);
    Base64UrlUnpadded::encode_string(&bytes)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionCookie {
    pub session_id: String,
}

impl SessionCookie {
    pub const fn new(session_id: String) -> Self {
        Self { session_id }
    }

    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        cookie_value(headers, SESSION_COOKIE_NAME).map(Self::new)
    }

    pub fn to_cookie_header(&self, max_age: i64, secure: bool) -> String {
        format!(
            "{SESSION_COOKIE_NAME}={}; HttpOnly; {}SameSite=Lax; Path=/; Max-Age={max_age}",
            self.session_id,
            if secure { "Secure; " } else { "" },
        )
    }

    pub fn delete_cookie_header() -> String {
        format!("{SESSION_COOKIE_NAME}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::{HeaderValue, COOKIE};

    #[test]
    fn test_create_resolve_destroy() {
        let store = SessionStore::new(60);
        let id = store.create("testuser");
        assert_eq!(store.resolve(&id).as_deref(), Some("testuser"));
        assert!(store.resolve("unknown").is_none());
        assert!(store.destroy(&id));
        assert!(store.resolve(&id).is_none());
        assert!(!store.destroy(&id));
    }

    #[test]
    fn test_session_ids_are_unique() {
        let store = SessionStore::new(60);
        let a = store.create("a");
        let b = store.create("a");
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_expired_sessions() {
        let store = SessionStore::new(0);
        let id = store.create("testuser");
        assert!(store.resolve(&id).is_none());
        // Expired entries are purged on the next create
        store.create("other");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_cookie_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("csrftoken=abc; docserve_session=xyz123; theme=dark"),
        );
        assert_eq!(
            SessionCookie::from_headers(&headers),
            Some(SessionCookie::new("xyz123".to_string()))
        );

        let mut empty = HeaderMap::new();
        empty.insert(COOKIE, HeaderValue::from_static("docserve_session="));
        assert!(SessionCookie::from_headers(&empty).is_none());
        assert!(SessionCookie::from_headers(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_cookie_headers() {
        let cookie = SessionCookie::new("abc".to_string());
        let header = cookie.to_cookie_header(3600, false);
        assert!(header.starts_with("docserve_session=abc;"));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("Max-Age=3600"));
        assert!(!header.contains("Secure"));
        assert!(cookie.to_cookie_header(10, true).contains("Secure; "));
        assert!(SessionCookie::delete_cookie_header().contains("Max-Age=0"));
    }
}
