//! MIME type detection module
//!
//! Content type and content encoding from a file name, covering what static
//! documentation builds emit.

use std::path::Path;

/// Content type and optional `Content-Encoding` for a file.
///
/// Compressed files keep the type of the inner file, e.g. `search.js.gz`
/// is `application/javascript` with encoding `gzip`.
///
/// # Examples
/// ```
/// use docserve::http::mime::guess;
/// use std::path::Path;
/// assert_eq!(guess(Path::new("index.html")), ("text/html; charset=utf-8", None));
/// assert_eq!(guess(Path::new("app.js.gz")), ("application/javascript", Some("gzip")));
/// ```
pub fn guess(path: &Path) -> (&'static str, Option<&'static str>) {
    let encoding = match extension(path) {
        Some("gz") => Some("gzip"),
        Some("bz2") => Some("bzip2"),
        Some("xz") => Some("xz"),
        Some("br") => Some("br"),
        _ => None,
    };

    match encoding {
        Some(enc) => {
            let inner = path.file_stem().map(Path::new);
            let content_type = inner.map_or("application/octet-stream", |p| {
                get_content_type(extension(p))
            });
            (content_type, Some(enc))
        }
        None => (get_content_type(extension(path)), None),
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|e| e.to_str())
}

/// Get MIME Content-Type based on file extension
pub fn get_content_type(extension: Option<&str>) -> &'static str {
    match extension.map(str::to_ascii_lowercase).as_deref() {
        // Text
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("txt" | "rst" | "md") => "text/plain; charset=utf-8",
        Some("xml") => "application/xml",
        Some("csv") => "text/csv",

        // Scripts and data
        Some("js" | "mjs") => "application/javascript",
        Some("json" | "map") => "application/json",
        Some("wasm") => "application/wasm",

        // Images
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("webp") => "image/webp",

        // Fonts
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",
        Some("eot") => "application/vnd.ms-fontobject",

        // Downloads
        Some("pdf") => "application/pdf",
        Some("epub") => "application/epub+zip",
        Some("zip") => "application/zip",
        Some("tar") => "application/x-tar",

        // objects.inv, .buildinfo and anything unknown
        _ => "application/octet-stream",
    }
}
