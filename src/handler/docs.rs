//! Documentation serving
//!
//! Validates the docs settings, applies the configured access policy and
//! serves files from the document root, retrying `<path>/index.html` once
//! when directory-style output is enabled.

use crate::auth::{self, AccessPolicy, Decision, ACCESS_CHOICES};
use crate::config::AppState;
use crate::handler::account;
use crate::handler::router::RequestContext;
use crate::handler::static_files;
use crate::http::{self, cache::CachePolicy};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use std::path::Path;
use thiserror::Error;

/// Misconfigured docs settings; the operator has to fix these
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocsError {
    #[error("DOCS_ACCESS setting value is incorrect: '{value}' (choices are: {choices})", choices = ACCESS_CHOICES.join(", "))]
    AccessSetting { value: String },
    #[error("DOCS_ROOT setting value is incorrect: {value} (must be a valid path)")]
    RootSetting { value: String },
}

/// Entry point for everything under the mount path.
///
/// `path` is relative to the mount. The bare mount redirects to
/// `index.html` unless directory-style output is on.
pub async fn dispatch(
    ctx: &RequestContext<'_>,
    state: &AppState,
    path: &str,
) -> Response<Full<Bytes>> {
    if path.is_empty() && !state.docs.dirhtml() {
        return http::build_redirect_response_with_code(
            &format!("{}index.html", state.mount_path),
            StatusCode::MOVED_PERMANENTLY,
        );
    }

    match serve_docs(ctx, state, path, None).await {
        Ok(resp) => resp,
        Err(e) => {
            logger::log_config_error(&e.to_string());
            http::build_500_response()
        }
    }
}

/// Serve one documentation file.
///
/// `document_root` overrides `DOCS_ROOT` when non-empty. The access value
/// is validated before the root; both are read fresh on every call.
pub async fn serve_docs(
    ctx: &RequestContext<'_>,
    state: &AppState,
    path: &str,
    document_root: Option<&str>,
) -> Result<Response<Full<Bytes>>, DocsError> {
    let access = state.docs.access();
    if !ACCESS_CHOICES.contains(&access.as_str()) {
        return Err(DocsError::AccessSetting { value: access });
    }

    let configured = document_root
        .filter(|r| !r.is_empty())
        .map(ToString::to_string)
        .or_else(|| state.docs.root());
    let root = match configured {
        Some(root) if !root.is_empty() => root,
        Some(root) => return Err(DocsError::RootSetting { value: format!("'{root}'") }),
        None => return Err(DocsError::RootSetting { value: "None".to_string() }),
    };

    let policy = AccessPolicy::select(&access);
    let login_path = &state.config.auth.login_path;

    Ok(match policy.authorize(&ctx.user) {
        Decision::Allow => {
            let cache_policy = cache_policy_for(policy, state.config.http.cache_max_age);
            serve_with_fallback(ctx, state, Path::new(&root), path, cache_policy).await
        }
        Decision::RedirectToLogin => auth::redirect_to_login(login_path, ctx.full_path),
        Decision::ShowLoginForm => account::login_form(ctx, state, ctx.full_path, None),
    })
}

async fn serve_with_fallback(
    ctx: &RequestContext<'_>,
    state: &AppState,
    root: &Path,
    path: &str,
    cache_policy: CachePolicy,
) -> Response<Full<Bytes>> {
    if let Some(resp) = static_files::serve(ctx, root, path, cache_policy).await {
        return resp;
    }

    if state.docs.dirhtml() {
        let index_path = index_path(path);
        if let Some(resp) = static_files::serve(ctx, root, &index_path, cache_policy).await {
            return resp;
        }
    }

    http::build_404_response()
}

/// `sub_dir`, `sub_dir/` -> `sub_dir/index.html`; empty -> `index.html`
fn index_path(path: &str) -> String {
    match path.trim_end_matches('/') {
        "" => "index.html".to_string(),
        base => format!("{base}/index.html"),
    }
}

/// Protected documents must not land in shared caches
const fn cache_policy_for(policy: AccessPolicy, max_age: u32) -> CachePolicy {
    match policy {
        AccessPolicy::Public => CachePolicy::Public(max_age),
        _ => CachePolicy::Private(max_age),
    }
}
