//! Login and logout views

use crate::auth::{self, csrf, SessionCookie, REDIRECT_FIELD_NAME};
use crate::config::AppState;
use crate::handler::router::RequestContext;
use crate::http;
use crate::logger;
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderValue, SET_COOKIE};
use hyper::{HeaderMap, Method, Response};
use std::collections::HashMap;

const LOGIN_ERROR: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

/// `GET` renders the form, `POST` checks the submitted credentials
pub async fn login<B>(
    ctx: &RequestContext<'_>,
    method: &Method,
    body: B,
    state: &AppState,
) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    if *method != Method::POST {
        let query = auth::login::parse_form(ctx.query.unwrap_or_default());
        let next = query
            .get(REDIRECT_FIELD_NAME)
            .map_or(state.mount_path.as_str(), String::as_str);
        return login_form(ctx, state, next, None);
    }

    let limit = usize::try_from(state.config.http.max_body_size).unwrap_or(usize::MAX);
    let raw = match Limited::new(body, limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            logger::log_warning(&format!("Failed to read login form: {e}"));
            return http::build_413_response();
        }
    };
    let form = auth::login::parse_form(&String::from_utf8_lossy(&raw));

    if !csrf::verify(
        ctx.csrf_cookie.as_deref(),
        form.get(csrf::CSRF_FIELD_NAME).map(String::as_str),
    ) {
        logger::log_warning("Login rejected: CSRF token missing or incorrect");
        return http::build_403_response();
    }

    let username = form_field(&form, "username");
    let next = auth::login::safe_next(
        form.get(REDIRECT_FIELD_NAME).map(String::as_str),
        &state.mount_path,
    );

    let Some(user) = state.users.verify(username, form_field(&form, "password")) else {
        logger::log_login(username, false);
        return login_form(ctx, state, next, Some(LOGIN_ERROR));
    };

    logger::log_login(user.display_name(), true);
    let secure = state.config.auth.secure_cookie;
    let cookie = SessionCookie::new(state.sessions.create(user.display_name()));
    let mut resp = http::build_redirect_response(next);
    append_cookie(
        &mut resp,
        &cookie.to_cookie_header(state.sessions.ttl_secs(), secure),
    );
    // A new token once logged in
    append_cookie(&mut resp, &csrf::cookie_header(&csrf::rotate(), secure));
    resp
}

/// Login form with its CSRF cookie, shown by the login view and in place of
/// documents that need a staff or superuser account
pub fn login_form(
    ctx: &RequestContext<'_>,
    state: &AppState,
    next: &str,
    error: Option<&str>,
) -> Response<Full<Bytes>> {
    let token = csrf::token_for(ctx.csrf_cookie.as_deref());
    let mut resp = auth::render_login_form(
        &state.config.auth.login_path,
        next,
        &ctx.user,
        error,
        &token,
        ctx.is_head,
    );
    append_cookie(
        &mut resp,
        &csrf::cookie_header(&token, state.config.auth.secure_cookie),
    );
    resp
}

fn append_cookie(resp: &mut Response<Full<Bytes>>, cookie: &str) {
    match HeaderValue::from_str(cookie) {
        Ok(value) => {
            resp.headers_mut().append(SET_COOKIE, value);
        }
        Err(e) => logger::log_error(&format!("Invalid Set-Cookie value: {e}")),
    }
}

fn form_field<'a>(form: &'a HashMap<String, String>, name: &str) -> &'a str {
    form.get(name).map_or("", String::as_str)
}

/// End the current session and return to the mount
pub fn logout(
    ctx: &RequestContext<'_>,
    headers: &HeaderMap,
    state: &AppState,
) -> Response<Full<Bytes>> {
    if let Some(cookie) = SessionCookie::from_headers(headers) {
        state.sessions.destroy(&cookie.session_id);
    }
    if ctx.user.is_authenticated() {
        logger::log_info(&format!("User '{}' logged out", ctx.user.display_name()));
    }

    let query = auth::login::parse_form(ctx.query.unwrap_or_default());
    let next = auth::login::safe_next(
        query.get(REDIRECT_FIELD_NAME).map(String::as_str),
        &state.mount_path,
    );

    let mut resp = http::build_redirect_response(next);
    append_cookie(&mut resp, &SessionCookie::delete_cookie_header());
    resp
}
