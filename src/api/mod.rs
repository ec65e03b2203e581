// API module entry
// Management API for the docs settings

mod handlers;
mod response;
mod types;

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::sync::Arc;

use crate::config::AppState;
use crate::logger;

// Re-export public types
pub use response::*;
pub use types::{SettingsSnapshot, SettingsUpdate, UpdateAck};

pub const SETTINGS_PATH: &str = "/v1/settings";

/// API route handler
///
/// Dispatches to handler functions based on request path and method
pub async fn handle_api_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let path = req.uri().path().to_string();
    let method = req.method().clone();

    match (method, path.as_str()) {
        (Method::GET, SETTINGS_PATH) => Ok(handlers::handle_settings_get(&state)),
        (Method::POST, SETTINGS_PATH) => Ok(handlers::handle_settings_post(req, &state).await),
        // Unknown route
        (method, path) => {
            logger::log_api_request(method.as_str(), path, 404);
            Ok(not_found())
        }
    }
}
