//! Static file serving module
//!
//! Resolves a URL path inside a document root and builds the file response.
//! Directories are never listed.

use crate::handler::router::RequestContext;
use crate::http::cache::{self, CachePolicy};
use crate::http::mime;
use crate::http::response::{self, FileResponse};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Serve `url_path` from `document_root`.
///
/// Returns `None` when there is nothing to serve: missing file, directory,
/// unreadable or missing document root, or a path escaping the root.
pub async fn serve(
    ctx: &RequestContext<'_>,
    document_root: &Path,
    url_path: &str,
    cache_policy: CachePolicy,
) -> Option<Response<Full<Bytes>>> {
    let file_path = resolve_path(document_root, url_path)?;

    let metadata = fs::metadata(&file_path).await.ok()?;
    if !metadata.is_file() {
        return None;
    }

    let content = match fs::read(&file_path).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {}",
                file_path.display(),
                e
            ));
            return None;
        }
    };

    let modified = metadata.modified().ok();
    let etag = cache::generate_etag(&content);

    if cache::is_not_modified(
        ctx.if_none_match.as_deref(),
        ctx.if_modified_since.as_deref(),
        &etag,
        modified,
    ) {
        return Some(response::build_304_response(&etag, cache_policy));
    }

    let (content_type, content_encoding) = mime::guess(&file_path);
    let meta = FileResponse {
        content_type,
        content_encoding,
        etag: &etag,
        last_modified: modified.map(cache::format_http_date),
        cache_policy,
    };

    Some(response::build_file_response(
        Bytes::from(content),
        &meta,
        ctx.is_head,
    ))
}

/// Map a URL path to a canonical file system path inside `document_root`.
///
/// The path is percent-decoded and normalised: empty and `.` segments are
/// dropped, `..` pops a segment and must not climb above the root.
pub fn resolve_path(document_root: &Path, url_path: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(url_path).ok()?;

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            s if s.contains('\\') || s.contains('\0') => return None,
            s => segments.push(s),
        }
    }

    let root_canonical = match document_root.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Document root not found or inaccessible '{}': {e}",
                document_root.display()
            ));
            return None;
        }
    };

    let candidate = segments
        .iter()
        .fold(root_canonical.clone(), |path, segment| path.join(segment));

    // Not found is the common case, no need to log it
    let canonical = candidate.canonicalize().ok()?;
    if !canonical.starts_with(&root_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            url_path,
            canonical.display()
        ));
        return None;
    }

    Some(canonical)
}
