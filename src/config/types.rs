// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    #[serde(default)]
    pub docs: DocsConfig,
    pub auth: AuthConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub api_host: String,
    pub api_port: u16,
    pub workers: Option<usize>,
    /// URL prefix the documentation is mounted under (e.g. "/docs/")
    pub mount_path: String,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub enable_cors: bool,
    pub max_body_size: u64,
    /// `max-age` used in `Cache-Control` for served documents
    pub cache_max_age: u32,
}

/// Initial values for the `DOCS_*` settings.
///
/// These seed the settings store at startup and on SIGHUP; afterwards the
/// store is the source of truth.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct DocsConfig {
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default)]
    pub access: Option<String>,
    #[serde(default)]
    pub dirhtml: Option<bool>,
}

/// Authentication configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub login_path: String,
    pub logout_path: String,
    /// Session lifetime in seconds
    pub session_ttl: u64,
    /// Mark the session cookie `Secure`
    pub secure_cookie: bool,
    #[serde(default)]
    pub users: Vec<UserAccount>,
}

/// A user account declared in the configuration file
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub username: String,
    /// Argon2 PHC string, see `docserve hash-password`
    pub password_hash: String,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub is_superuser: bool,
}

#[allow(clippy::missing_const_for_fn)]
fn default_is_active() -> bool {
    true
}
