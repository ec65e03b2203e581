//! Authentication module
//!
//! Everything needed to attach a user to a request and to gate documents:
//! configured accounts, cookie sessions, the access policy selector and the
//! login challenge.

pub mod csrf;
pub mod login;
pub mod policy;
pub mod session;
pub mod user;

pub use login::{redirect_to_login, render_login_form, REDIRECT_FIELD_NAME};
pub use policy::{AccessPolicy, Decision, ACCESS_CHOICES};
pub use session::{SessionCookie, SessionStore, SESSION_COOKIE_NAME};
pub use user::{hash_password, AuthError, User, UserDirectory};

use crate::config::AppState;
use hyper::HeaderMap;

/// Resolve the user for a request from its session cookie.
///
/// Missing, unknown or expired sessions, and sessions of accounts that no
/// longer exist, resolve to the anonymous user.
pub fn current_user(headers: &HeaderMap, state: &AppState) -> User {
    SessionCookie::from_headers(headers)
        .and_then(|cookie| state.sessions.resolve(&cookie.session_id))
        .and_then(|username| state.users.get(&username))
        .unwrap_or_else(User::anonymous)
}
