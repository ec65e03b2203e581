//! Static documentation server with a configurable access policy.
//!
//! Documents are read from `DOCS_ROOT` and gated by `DOCS_ACCESS`; the
//! docs settings are cached and invalidated whenever the settings store
//! reports a change under the `DOCS` prefix.

pub mod api;
pub mod auth;
pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
