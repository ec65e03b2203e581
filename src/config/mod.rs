// Configuration module entry point
// Manages application configuration, process-wide settings, and runtime state

pub mod settings;
mod state;
mod types;
mod version;

use std::net::SocketAddr;

// Re-export public types
pub use settings::{DocsSettings, SettingListener, SettingsError, SettingsStore, DOCS_PREFIX};
pub use state::AppState;
pub use types::{
    AuthConfig, Config, DocsConfig, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig,
    UserAccount,
};
pub use version::VersionedResource;

/// Default config file name (without extension)
pub const DEFAULT_CONFIG_PATH: &str = "docserve";

/// Environment variable prefix, e.g. `DOCSERVE__SERVER__PORT=9090`
pub const ENV_PREFIX: &str = "DOCSERVE";

impl Config {
    /// Load configuration from specified file path (extension optional)
    ///
    /// Missing files are not an error: every field has a default.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = Self::defaults()?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    /// Build a configuration from defaults only (no file, no environment)
    pub fn default_config() -> Result<Self, config::ConfigError> {
        Self::defaults()?.build()?.try_deserialize()
    }

    fn defaults(
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
        config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.api_host", "127.0.0.1")?
            .set_default("server.api_port", 8000)?
            .set_default("server.mount_path", "/")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.server_name", "docserve")?
            .set_default("http.enable_cors", false)?
            .set_default("http.max_body_size", 65_536)?
            .set_default("http.cache_max_age", 3600)?
            .set_default("auth.login_path", "/accounts/login/")?
            .set_default("auth.logout_path", "/accounts/logout/")?
            .set_default("auth.session_ttl", 1_209_600)? // two weeks
            .set_default("auth.secure_cookie", false)
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    pub fn get_api_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.api_host, self.server.api_port)
            .parse()
            .map_err(|e| format!("Invalid API address: {e}"))
    }

    /// Mount path normalised to start and end with `/`
    pub fn mount_path(&self) -> String {
        normalize_mount_path(&self.server.mount_path)
    }
}

impl DocsConfig {
    /// Re-resolve the `[docs]` table for SIGHUP.
    ///
    /// Uses the same layering as startup, so `DOCSERVE__DOCS__*` environment
    /// overrides still win over the file. The rest of the configuration is
    /// fixed for the lifetime of the process.
    pub fn reload_from(config_path: &str) -> Result<Self, config::ConfigError> {
        Config::load_from(config_path).map(|config| config.docs)
    }
}

fn normalize_mount_path(raw: &str) -> String {
    let trimmed = raw.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}/")
    }
}
