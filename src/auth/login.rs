//! Login challenge helpers
//!
//! The redirect to the login URL, the login form page, form decoding and
//! validation of the post-login `next` target.

use super::csrf::CSRF_FIELD_NAME;
use super::user::User;
use crate::http;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use std::collections::HashMap;

/// Query parameter carrying the page to return to after login
pub const REDIRECT_FIELD_NAME: &str = "next";

/// Build the 302 redirect to `login_path?next=<path>`.
///
/// Slashes in the target stay unescaped so the query reads as a path.
pub fn redirect_to_login(login_path: &str, next: &str) -> Response<Full<Bytes>> {
    let encoded = urlencoding::encode(next).replace("%2F", "/");
    let separator = if login_path.contains('?') { '&' } else { '?' };
    http::build_redirect_response(&format!(
        "{login_path}{separator}{REDIRECT_FIELD_NAME}={encoded}"
    ))
}

/// Render the login form page.
///
/// Served with 200 both from the login URL and in place of a document the
/// current user may not read. The caller sets the matching CSRF cookie.
pub fn render_login_form(
    login_path: &str,
    next: &str,
    user: &User,
    error: Option<&str>,
    csrf_token: &str,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let mut notice = String::new();
    if let Some(error) = error {
        notice.push_str(&format!("<p class=\"errornote\">{}</p>\n", escape_html(error)));
    } else if user.is_authenticated() {
        notice.push_str(&format!(
            "<p class=\"errornote\">You are authenticated as {}, but are not authorized to \
             access this page. Would you like to log in to a different account?</p>\n",
            escape_html(user.display_name())
        ));
    }

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Log in</title>
</head>
<body>
<h1>Log in</h1>
{notice}<form action="{action}" method="post">
<input type="hidden" name="{csrf_field}" value="{csrf_token}">
<p><label for="id_username">Username:</label>
<input type="text" name="username" id="id_username" autofocus required></p>
<p><label for="id_password">Password:</label>
<input type="password" name="password" id="id_password" required></p>
<input type="hidden" name="{field}" value="{next}">
<p><input type="submit" value="Log in"></p>
</form>
</body>
</html>
"#,
        action = escape_html(login_path),
        csrf_field = CSRF_FIELD_NAME,
        csrf_token = escape_html(csrf_token),
        field = REDIRECT_FIELD_NAME,
        next = escape_html(next),
    );

    http::build_html_response(StatusCode::OK, html, is_head)
}

/// Decode an `application/x-www-form-urlencoded` body or query string.
///
/// Pairs that fail to decode are skipped; the last occurrence of a key wins.
pub fn parse_form(input: &str) -> HashMap<String, String> {
    input
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            Some((decode_component(key)?, decode_component(value)?))
        })
        .collect()
}

fn decode_component(raw: &str) -> Option<String> {
    urlencoding::decode(&raw.replace('+', " "))
        .ok()
        .map(|s| s.into_owned())
}

/// Whether `next` is a same-site path that is safe to redirect to
pub fn is_safe_next(next: &str) -> bool {
    next.starts_with('/')
        && !next.starts_with("//")
        && !next.contains('\\')
        && !next.chars().any(char::is_control)
}

/// Pick the post-login target, falling back when `next` is missing or unsafe
pub fn safe_next<'a>(next: Option<&'a str>, fallback: &'a str) -> &'a str {
    next.filter(|n| is_safe_next(n)).unwrap_or(fallback)
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}
