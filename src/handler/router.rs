//! Request routing dispatch module
//!
//! Entry point for HTTP request processing, responsible for method validation, route matching, and dispatching.

use crate::auth::{self, User};
use crate::config::AppState;
use crate::handler::{account, docs};
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderValue, SERVER};
use hyper::http::request::Parts;
use hyper::{HeaderMap, Method, Request, Response, StatusCode, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

const DOCS_METHODS: &str = "GET, HEAD, OPTIONS";
const ACCOUNT_METHODS: &str = "GET, HEAD, POST, OPTIONS";

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    pub path: &'a str,
    /// Path plus query string, the return target of a login challenge
    pub full_path: &'a str,
    pub query: Option<&'a str>,
    pub is_head: bool,
    pub if_none_match: Option<String>,
    pub if_modified_since: Option<String>,
    /// CSRF token from the request cookie, if any
    pub csrf_cookie: Option<String>,
    pub user: User,
}

impl<'a> RequestContext<'a> {
    pub fn from_parts(parts: &'a Parts, user: User) -> Self {
        let path = parts.uri.path();
        Self {
            path,
            full_path: parts.uri.path_and_query().map_or(path, |pq| pq.as_str()),
            query: parts.uri.query(),
            is_head: parts.method == Method::HEAD,
            if_none_match: header_string(&parts.headers, "if-none-match"),
            if_modified_since: header_string(&parts.headers, "if-modified-since"),
            csrf_cookie: auth::csrf::token_from_headers(&parts.headers),
            user,
        }
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let start = Instant::now();
    let (parts, body) = req.into_parts();
    let user = auth::current_user(&parts.headers, &state);

    let entry = state
        .config
        .logging
        .access_log
        .then(|| access_entry(&parts, remote_addr, &user));

    let mut response = route_request(&parts, body, user, &state).await;
    if let Ok(server) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(SERVER, server);
    }

    if let Some(mut entry) = entry {
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or_default();
        entry.request_time_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Route request based on path and configuration
async fn route_request<B>(
    parts: &Parts,
    body: B,
    user: User,
    state: &AppState,
) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let path = parts.uri.path();
    let auth_config = &state.config.auth;
    let is_login = path == auth_config.login_path;
    let is_logout = path == auth_config.logout_path;

    // 1. Check HTTP method
    if let Some(resp) = check_http_method(
        &parts.method,
        is_login || is_logout,
        state.config.http.enable_cors,
    ) {
        return resp;
    }

    // 2. Check body size
    if let Some(resp) = check_body_size(&parts.headers, state.config.http.max_body_size) {
        return resp;
    }

    let ctx = RequestContext::from_parts(parts, user);

    // 3. Account routes
    if is_login {
        return account::login(&ctx, &parts.method, body, state).await;
    }
    if is_logout {
        return account::logout(&ctx, &parts.headers, state);
    }

    // 4. Documentation under the mount path
    match path.strip_prefix(state.mount_path.as_str()) {
        Some(rel) => docs::dispatch(&ctx, state, rel).await,
        None if path == state.mount_path.trim_end_matches('/') => {
            http::build_redirect_response_with_code(&state.mount_path, StatusCode::MOVED_PERMANENTLY)
        }
        None => http::build_404_response(),
    }
}

/// Check HTTP method and return appropriate response for unsupported methods
fn check_http_method(
    method: &Method,
    account_route: bool,
    enable_cors: bool,
) -> Option<Response<Full<Bytes>>> {
    let allow = if account_route {
        ACCOUNT_METHODS
    } else {
        DOCS_METHODS
    };
    match method {
        &Method::GET | &Method::HEAD => None,
        &Method::POST if account_route => None,
        &Method::OPTIONS => Some(http::build_options_response(allow, enable_cors)),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response(allow))
        }
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size(headers: &HeaderMap, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = headers.get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn access_entry(parts: &Parts, remote_addr: SocketAddr, user: &User) -> AccessLogEntry {
    let mut entry = AccessLogEntry::new(
        remote_addr.ip().to_string(),
        parts.method.to_string(),
        parts.uri.path().to_string(),
    );
    entry.remote_user = user.username.clone();
    entry.query = parts.uri.query().map(ToString::to_string);
    entry.http_version = version_label(parts.version).to_string();
    entry.referer = header_string(&parts.headers, "referer");
    entry.user_agent = header_string(&parts.headers, "user-agent");
    entry
}

fn version_label(version: Version) -> &'static str {
    if version == Version::HTTP_10 {
        "1.0"
    } else if version == Version::HTTP_2 {
        "2"
    } else if version == Version::HTTP_09 {
        "0.9"
    } else {
        "1.1"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_http_method() {
        assert!(check_http_method(&Method::GET, false, false).is_none());
        assert!(check_http_method(&Method::HEAD, false, false).is_none());
        assert!(check_http_method(&Method::POST, true, false).is_none());

        let resp = check_http_method(&Method::POST, false, false).unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.headers()["Allow"], DOCS_METHODS);

        let resp = check_http_method(&Method::OPTIONS, true, true).unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(resp.headers()["Allow"], ACCOUNT_METHODS);
    }

    #[test]
    fn test_check_body_size() {
        let mut headers = HeaderMap::new();
        assert!(check_body_size(&headers, 10).is_none());

        headers.insert("content-length", "10".parse().unwrap());
        assert!(check_body_size(&headers, 10).is_none());

        headers.insert("content-length", "11".parse().unwrap());
        let resp = check_body_size(&headers, 10).unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);

        headers.insert("content-length", "lots".parse().unwrap());
        assert!(check_body_size(&headers, 10).is_none());
    }

    #[test]
    fn test_request_context() {
        let req = Request::builder()
            .method(Method::HEAD)
            .uri("/docs/page.html?highlight=x")
            .header("If-None-Match", "\"abc\"")
            .header("Cookie", "docserve_csrftoken=tok")
            .body(())
            .unwrap();
        let (parts, ()) = req.into_parts();
        let ctx = RequestContext::from_parts(&parts, User::anonymous());
        assert_eq!(ctx.path, "/docs/page.html");
        assert_eq!(ctx.full_path, "/docs/page.html?highlight=x");
        assert_eq!(ctx.query, Some("highlight=x"));
        assert!(ctx.is_head);
        assert_eq!(ctx.if_none_match.as_deref(), Some("\"abc\""));
        assert!(ctx.if_modified_since.is_none());
        assert_eq!(ctx.csrf_cookie.as_deref(), Some("tok"));
    }
}
