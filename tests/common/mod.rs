#![allow(dead_code)]

use docserve::auth::csrf::{CSRF_COOKIE_NAME, CSRF_FIELD_NAME};
use docserve::auth::{hash_password, SESSION_COOKIE_NAME};
use docserve::config::{AppState, Config, UserAccount};
use docserve::handler::handle_request;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Method, Request, Response};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

pub const PASSWORD: &str = "correct horse";

pub fn docs_root() -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/test_docs")
        .to_string_lossy()
        .into_owned()
}

pub fn peer() -> SocketAddr {
    "127.0.0.1:1234".parse().unwrap()
}

pub fn base_config() -> Config {
    let mut config = Config::default_config().unwrap();
    config.logging.access_log = false;
    config
}

pub fn account(username: &str, is_staff: bool, is_superuser: bool) -> UserAccount {
    UserAccount {
        username: username.to_string(),
        password_hash: hash_password(PASSWORD).unwrap(),
        is_active: true,
        is_staff,
        is_superuser,
    }
}

/// Test docs served at `/` with the given access policy
pub fn state_with_access(access: &str) -> Arc<AppState> {
    let mut config = base_config();
    config.docs.root = Some(docs_root());
    config.docs.access = Some(access.to_string());
    config.auth.users = vec![
        account("reader", false, false),
        account("staffer", true, false),
        account("admin", true, true),
    ];
    Arc::new(AppState::new(&config))
}

pub fn public_state() -> Arc<AppState> {
    let mut config = base_config();
    config.docs.root = Some(docs_root());
    Arc::new(AppState::new(&config))
}

/// Cookie header value for a fresh session of `username`
pub fn login_cookie(state: &AppState, username: &str) -> String {
    format!("{SESSION_COOKIE_NAME}={}", state.sessions.create(username))
}

pub async fn get(state: &Arc<AppState>, uri: &str) -> Response<Full<Bytes>> {
    send(state, Request::get(uri).body(Full::new(Bytes::new())).unwrap()).await
}

pub async fn get_as(state: &Arc<AppState>, uri: &str, cookie: &str) -> Response<Full<Bytes>> {
    let req = Request::get(uri)
        .header("Cookie", cookie)
        .body(Full::new(Bytes::new()))
        .unwrap();
    send(state, req).await
}

pub async fn post_form(state: &Arc<AppState>, uri: &str, form: &str) -> Response<Full<Bytes>> {
    let req = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(Full::new(Bytes::from(form.to_string())))
        .unwrap();
    send(state, req).await
}

/// Fetch the login page and return its CSRF cookie and form token
pub async fn login_page_token(state: &Arc<AppState>) -> (String, String) {
    let resp = get(state, "/accounts/login/").await;
    let cookie = set_cookies(&resp)
        .into_iter()
        .find(|c| c.starts_with(CSRF_COOKIE_NAME))
        .expect("login page sets the CSRF cookie");
    let cookie = cookie.split(';').next().unwrap().to_string();
    let token = cookie.split_once('=').unwrap().1.to_string();
    (cookie, token)
}

/// Submit the login form the way a browser would after loading it
pub async fn post_login(state: &Arc<AppState>, form: &str) -> Response<Full<Bytes>> {
    let (cookie, token) = login_page_token(state).await;
    post_form_as(
        state,
        "/accounts/login/",
        &format!("{CSRF_FIELD_NAME}={token}&{form}"),
        &cookie,
    )
    .await
}

pub async fn post_form_as(
    state: &Arc<AppState>,
    uri: &str,
    form: &str,
    cookie: &str,
) -> Response<Full<Bytes>> {
    let req = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("Content-Type", "application/x-www-form-urlencoded")
        .header("Cookie", cookie)
        .body(Full::new(Bytes::from(form.to_string())))
        .unwrap();
    send(state, req).await
}

/// Every `Set-Cookie` value of a response
pub fn set_cookies(resp: &Response<Full<Bytes>>) -> Vec<String> {
    resp.headers()
        .get_all("Set-Cookie")
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

pub async fn send(state: &Arc<AppState>, req: Request<Full<Bytes>>) -> Response<Full<Bytes>> {
    handle_request(req, Arc::clone(state), peer()).await.unwrap()
}

pub async fn body_string(resp: Response<Full<Bytes>>) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn header<'a>(resp: &'a Response<Full<Bytes>>, name: &str) -> &'a str {
    resp.headers()[name].to_str().unwrap()
}
