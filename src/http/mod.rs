//! HTTP protocol layer module
//!
//! Response builders, content-type detection and cache validators shared by
//! the document server, the login views and the management API.

pub mod cache;
pub mod mime;
pub mod response;

pub use response::{
    build_304_response, build_403_response, build_404_response, build_405_response, build_413_response,
    build_500_response, build_html_response, build_options_response, build_redirect_response,
    build_redirect_response_with_code,
};
