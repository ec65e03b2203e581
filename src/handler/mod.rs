//! Request handler module
//!
//! Responsible for request routing dispatch and business logic processing:
//! documentation files behind the access policy, plus the login and logout
//! views.

mod account;
pub mod docs;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use docs::{serve_docs, DocsError};
pub use router::{handle_request, RequestContext};
