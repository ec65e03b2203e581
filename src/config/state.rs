// Application state module
// Shared runtime state handed to every request

use std::sync::Arc;

use super::settings::{DocsSettings, SettingsStore};
use super::types::Config;
use super::version::VersionedResource;
use super::DEFAULT_CONFIG_PATH;
use crate::auth::{SessionStore, UserDirectory};

/// Application state
pub struct AppState {
    pub config: Config,
    /// Config file the process was started with, re-read on SIGHUP
    pub config_path: String,
    /// Normalised mount path, always starts and ends with `/`
    pub mount_path: String,
    pub store: Arc<SettingsStore>,
    pub docs: Arc<DocsSettings>,
    pub users: UserDirectory,
    pub sessions: SessionStore,
    pub settings_version: VersionedResource,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self::with_config_path(config, DEFAULT_CONFIG_PATH)
    }

    /// Create `AppState`, seeding the settings store from the `[docs]` table
    pub fn with_config_path(config: &Config, config_path: &str) -> Self {
        let store = Arc::new(SettingsStore::from_docs_config(&config.docs));
        let docs = DocsSettings::new(&store);

        Self {
            config: config.clone(),
            config_path: config_path.to_string(),
            mount_path: config.mount_path(),
            store,
            docs,
            users: UserDirectory::new(&config.auth.users),
            sessions: SessionStore::new(config.auth.session_ttl),
            settings_version: VersionedResource::new(),
        }
    }
}
