// Settings endpoint handlers

use http_body_util::{BodyExt, Full, Limited};
use http_body_util::LengthLimitError;
use hyper::body::{Body, Bytes};
use hyper::{Request, Response, StatusCode};

use super::response::{bad_request, conflict_response, json_response, payload_too_large};
use super::types::{SettingsSnapshot, SettingsUpdate, UpdateAck};
use super::SETTINGS_PATH;
use crate::config::AppState;
use crate::logger;

/// Resolved docs settings with the current version
pub fn handle_settings_get(state: &AppState) -> Response<Full<Bytes>> {
    let (version, nonce) = state.settings_version.get();
    let prefix = state.docs.prefix();

    let settings = ["ROOT", "ACCESS", "DIRHTML"]
        .into_iter()
        .filter_map(|name| {
            let value = state.docs.get(name).ok()?;
            Some((format!("{prefix}_{name}"), value))
        })
        .collect();

    let snapshot = SettingsSnapshot {
        version_info: version.to_string(),
        nonce: nonce.to_string(),
        settings,
        overrides: state.store.snapshot().into_iter().collect(),
    };

    logger::log_api_request("GET", SETTINGS_PATH, 200);
    json_response(StatusCode::OK, &snapshot)
}

/// Write or remove settings; every write notifies the cached resolvers
pub async fn handle_settings_post<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let max_body_size = state.config.http.max_body_size;
    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    let whole_body = match Limited::new(req.into_body(), limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.is::<LengthLimitError>() => {
            logger::log_api_request("POST", SETTINGS_PATH, 413);
            return payload_too_large(&format!(
                "Request body exceeds {max_body_size} bytes"
            ));
        }
        Err(e) => {
            logger::log_api_request("POST", SETTINGS_PATH, 400);
            return bad_request(&format!("Failed to read request body: {e}"));
        }
    };

    let update: SettingsUpdate = match serde_json::from_slice(&whole_body) {
        Ok(u) => u,
        Err(e) => {
            logger::log_api_request("POST", SETTINGS_PATH, 400);
            return bad_request(&format!("Invalid JSON: {e}"));
        }
    };

    // Optimistic locking
    if !update.version_info.is_empty() {
        let (current_version, _) = state.settings_version.get();
        if update.version_info != current_version.to_string() {
            logger::log_api_request("POST", SETTINGS_PATH, 409);
            return conflict_response(&format!(
                "Version conflict: expected {current_version}, got {}",
                update.version_info
            ));
        }
    }

    if update.settings.is_empty() {
        logger::log_api_request("POST", SETTINGS_PATH, 400);
        return bad_request("No settings provided");
    }
    if let Some(key) = update.settings.keys().find(|k| !is_valid_key(k)) {
        logger::log_api_request("POST", SETTINGS_PATH, 400);
        return bad_request(&format!("Invalid setting name: '{key}'"));
    }

    let mut changed = Vec::with_capacity(update.settings.len());
    for (key, value) in update.settings {
        if value.is_null() {
            state.store.remove(&key);
            logger::log_setting_changed(&key, None);
        } else {
            logger::log_setting_changed(&key, Some(&value));
            state.store.set(&key, value);
        }
        changed.push(key);
    }

    let (new_version, new_nonce) = state.settings_version.increment();
    logger::log_api_request("POST", SETTINGS_PATH, 200);

    json_response(
        StatusCode::OK,
        &UpdateAck {
            status: "ACK",
            version_info: new_version.to_string(),
            nonce: new_nonce.to_string(),
            message: format!("Updated {}", changed.join(", ")),
        },
    )
}

/// Setting names are upper-case identifiers, e.g. `DOCS_ROOT`
fn is_valid_key(key: &str) -> bool {
    key.chars().next().is_some_and(|c| c.is_ascii_uppercase())
        && key
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("DOCS_ROOT"));
        assert!(is_valid_key("OTHER_SETTING2"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("docs_root"));
        assert!(!is_valid_key("_DOCS"));
        assert!(!is_valid_key("DOCS-ROOT"));
    }
}
