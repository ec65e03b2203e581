// API type definitions
// Request/response bodies of the settings endpoint

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Resolved docs settings, defaults included
#[derive(Debug, Serialize)]
pub struct SettingsSnapshot {
    pub version_info: String,
    pub nonce: String,
    pub settings: BTreeMap<String, serde_json::Value>,
    /// Keys explicitly present in the store
    pub overrides: BTreeMap<String, serde_json::Value>,
}

/// Settings update request
#[derive(Debug, Deserialize)]
pub struct SettingsUpdate {
    /// Version the client last saw (optimistic locking); empty skips the check
    #[serde(default)]
    pub version_info: String,
    /// `KEY: value` to set, `KEY: null` to remove
    pub settings: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct UpdateAck {
    pub status: &'static str,
    pub version_info: String,
    pub nonce: String,
    pub message: String,
}
