mod common;

use common::*;
use hyper::StatusCode;

fn has_session_cookie(resp: &hyper::Response<http_body_util::Full<hyper::body::Bytes>>) -> bool {
    set_cookies(resp)
        .iter()
        .any(|c| c.starts_with("docserve_session="))
}

#[tokio::test]
async fn login_required_redirects_anonymous_users() {
    let state = state_with_access("login_required");

    let resp = get(&state, "/index.html").await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        header(&resp, "Location"),
        "/accounts/login/?next=/index.html"
    );

    let resp = get(&state, "/index.html?highlight=x").await;
    assert_eq!(
        header(&resp, "Location"),
        "/accounts/login/?next=/index.html%3Fhighlight%3Dx"
    );
}

#[tokio::test]
async fn login_required_serves_authenticated_users() {
    let state = state_with_access("login_required");
    let cookie = login_cookie(&state, "reader");

    let resp = get_as(&state, "/index.html", &cookie).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(header(&resp, "Cache-Control").starts_with("private"));
    assert!(body_string(resp).await.contains("Test docs index"));
}

#[tokio::test]
async fn unknown_session_is_anonymous() {
    let state = state_with_access("login_required");
    let resp = get_as(&state, "/index.html", "docserve_session=forged").await;
    assert_eq!(resp.status(), StatusCode::FOUND);
}

#[tokio::test]
async fn staff_policy_shows_login_form() {
    let state = state_with_access("staff");

    let resp = get(&state, "/index.html").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header(&resp, "Cache-Control"), "no-store");
    let body = body_string(resp).await;
    assert!(body.contains("<form action=\"/accounts/login/\" method=\"post\">"));
    assert!(body.contains("value=\"/index.html\""));
    assert!(!body.contains("Test docs index"));

    let reader = login_cookie(&state, "reader");
    let body = body_string(get_as(&state, "/index.html", &reader).await).await;
    assert!(body.contains("authenticated as reader"));

    let staffer = login_cookie(&state, "staffer");
    let body = body_string(get_as(&state, "/index.html", &staffer).await).await;
    assert!(body.contains("Test docs index"));
}

#[tokio::test]
async fn superuser_policy_shows_login_form() {
    let state = state_with_access("superuser");

    let body = body_string(get(&state, "/index.html").await).await;
    assert!(body.contains("<h1>Log in</h1>"));

    let staffer = login_cookie(&state, "staffer");
    let body = body_string(get_as(&state, "/index.html", &staffer).await).await;
    assert!(!body.contains("Test docs index"));

    let admin = login_cookie(&state, "admin");
    let resp = get_as(&state, "/index.html", &admin).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_string(resp).await.contains("Test docs index"));
}

#[tokio::test]
async fn login_form_round_trip() {
    let state = state_with_access("login_required");

    let resp = get(&state, "/accounts/login/?next=/sub_dir/index.html").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_string(resp).await.contains("value=\"/sub_dir/index.html\""));

    let resp = post_login(
        &state,
        "username=reader&password=correct+horse&next=%2Fsub_dir%2Findex.html",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(header(&resp, "Location"), "/sub_dir/index.html");
    let set_cookie = header(&resp, "Set-Cookie");
    assert!(set_cookie.contains("HttpOnly"));
    let cookie = set_cookie.split(';').next().unwrap().to_string();

    let resp = get_as(&state, "/sub_dir/index.html", &cookie).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn failed_login_rerenders_form() {
    let state = state_with_access("login_required");

    let resp = post_login(&state, "username=reader&password=wrong&next=%2Findex.html").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(!has_session_cookie(&resp));
    assert!(body_string(resp)
        .await
        .contains("Please enter a correct username and password"));
    assert!(state.sessions.is_empty());
}

#[tokio::test]
async fn external_next_is_ignored() {
    let state = state_with_access("login_required");
    let resp = post_login(
        &state,
        "username=reader&password=correct+horse&next=https%3A%2F%2Fevil.example.com%2F",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(header(&resp, "Location"), "/");
}

#[tokio::test]
async fn logout_ends_session() {
    let state = state_with_access("login_required");
    let cookie = login_cookie(&state, "reader");
    assert_eq!(state.sessions.len(), 1);

    let resp = get_as(&state, "/accounts/logout/", &cookie).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(header(&resp, "Location"), "/");
    assert!(header(&resp, "Set-Cookie").contains("Max-Age=0"));
    assert!(state.sessions.is_empty());

    let resp = get_as(&state, "/index.html", &cookie).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
}

#[tokio::test]
async fn inactive_accounts_are_denied() {
    let mut config = base_config();
    config.docs.root = Some(docs_root());
    config.docs.access = Some("login_required".to_string());
    let mut retired = account("retired", true, true);
    retired.is_active = false;
    config.auth.users = vec![retired];
    let state = std::sync::Arc::new(docserve::config::AppState::new(&config));

    // A session left over from before deactivation
    let cookie = login_cookie(&state, "retired");
    let resp = get_as(&state, "/index.html", &cookie).await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    for access in ["staff", "superuser"] {
        state.store.set("DOCS_ACCESS", serde_json::json!(access));
        let body = body_string(get_as(&state, "/index.html", &cookie).await).await;
        assert!(!body.contains("Test docs index"), "{access}");
    }

    let resp = post_login(&state, "username=retired&password=correct+horse").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(!has_session_cookie(&resp));
}

#[tokio::test]
async fn login_form_sets_csrf_cookie() {
    let state = state_with_access("staff");

    let resp = get(&state, "/index.html").await;
    let cookies = set_cookies(&resp);
    let csrf = cookies
        .iter()
        .find(|c| c.starts_with("docserve_csrftoken="))
        .unwrap();
    let token = csrf.split(';').next().unwrap().split_once('=').unwrap().1;
    let body = body_string(resp).await;
    assert!(body.contains(&format!(
        "name=\"csrfmiddlewaretoken\" value=\"{token}\""
    )));

    // An existing token is reused
    let resp = get_as(&state, "/accounts/login/", "docserve_csrftoken=kept").await;
    assert!(body_string(resp)
        .await
        .contains("name=\"csrfmiddlewaretoken\" value=\"kept\""));
}

#[tokio::test]
async fn login_without_csrf_token_is_rejected() {
    let state = state_with_access("login_required");
    let form = "username=reader&password=correct+horse";

    let resp = post_form(&state, "/accounts/login/", form).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Cookie without the matching form field
    let (cookie, _) = login_page_token(&state).await;
    let resp = post_form_as(&state, "/accounts/login/", form, &cookie).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Form field without the cookie, as a cross-site page would send it
    let resp = post_form(
        &state,
        "/accounts/login/",
        &format!("csrfmiddlewaretoken=guessed&{form}"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = post_form_as(
        &state,
        "/accounts/login/",
        &format!("csrfmiddlewaretoken=other&{form}"),
        &cookie,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(state.sessions.is_empty());
}

#[tokio::test]
async fn successful_login_rotates_csrf_token() {
    let state = state_with_access("login_required");
    let (cookie, token) = login_page_token(&state).await;

    let resp = post_form_as(
        &state,
        "/accounts/login/",
        &format!("csrfmiddlewaretoken={token}&username=reader&password=correct+horse"),
        &cookie,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    let cookies = set_cookies(&resp);
    assert!(cookies[0].starts_with("docserve_session="));
    let rotated = cookies
        .iter()
        .find(|c| c.starts_with("docserve_csrftoken="))
        .unwrap();
    assert!(!rotated.starts_with(&format!("{cookie};")));
}
