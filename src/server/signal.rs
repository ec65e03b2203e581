// Signal handling module (nginx-style)
//
// Supported signals:
// - SIGHUP:  Re-resolve the docs settings (file + env) into the settings store
// - SIGTERM: Graceful shutdown
// - SIGINT:  Graceful shutdown (Ctrl+C)
// - SIGUSR1: Reopen log files

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::config::{AppState, DocsConfig};
use crate::logger;

/// Signal handler state
pub struct SignalHandler {
    /// Shutdown signal (SIGTERM, SIGINT)
    pub shutdown: Notify,
    /// Whether shutdown has been requested
    pub shutdown_requested: AtomicBool,
}

impl SignalHandler {
    pub fn new() -> Self {
        Self {
            shutdown: Notify::new(),
            shutdown_requested: AtomicBool::new(false),
        }
    }

    /// Flag shutdown and wake every accept loop
    pub fn request_shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::SeqCst);
        self.shutdown.notify_waiters();
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::SeqCst)
    }
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Re-resolve the docs settings from the startup config file and environment.
///
/// The store notifies the cached resolver, so the next request sees the new
/// values. The settings version is bumped like an API update.
pub fn reload_docs_settings(state: &AppState) -> Result<DocsConfig, ::config::ConfigError> {
    let docs = DocsConfig::reload_from(&state.config_path)?;
    state.store.apply_docs_config(&docs);
    state.settings_version.increment();
    Ok(docs)
}

fn handle_reload(state: &AppState) {
    logger::log_signal("SIGHUP received, reloading docs settings");
    match reload_docs_settings(state) {
        Ok(docs) => logger::log_signal(&format!(
            "Docs settings reloaded: root={:?} access={:?} dirhtml={:?}",
            docs.root, docs.access, docs.dirhtml
        )),
        Err(e) => logger::log_error(&format!(
            "Failed to reload '{}', keeping current settings: {e}",
            state.config_path
        )),
    }
}

fn handle_reopen_logs() {
    logger::log_signal("SIGUSR1 received, reopening log files");
    if let Some(writer) = logger::writer::get() {
        if let Err(e) = writer.reopen() {
            logger::log_error(&format!("Failed to reopen log files: {e}"));
        }
    }
}

/// Start signal handlers (Unix only)
///
/// Signals are registered before the listening task is spawned, so a
/// registration failure is returned to the caller.
///
/// | Signal  | Action                | Nginx Equivalent |
/// |---------|-----------------------|------------------|
/// | SIGHUP  | Reload docs settings  | `nginx -s reload`|
/// | SIGTERM | Graceful stop         | `nginx -s stop`  |
/// | SIGINT  | Graceful stop         | Ctrl+C           |
/// | SIGUSR1 | Reopen logs           | `nginx -s reopen`|
#[cfg(unix)]
pub fn start_signal_handler(
    handler: Arc<SignalHandler>,
    state: Arc<AppState>,
) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sighup = signal(SignalKind::hangup())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigusr1 = signal(SignalKind::user_defined1())?;

    logger::log_signal(&format!(
        "Handlers registered (HUP: reload docs settings, TERM/INT: shutdown, USR1: reopen logs), pid {}",
        std::process::id()
    ));

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = sighup.recv() => handle_reload(&state),
                _ = sigterm.recv() => {
                    logger::log_signal("SIGTERM received, shutting down");
                    handler.request_shutdown();
                    break;
                }
                _ = sigint.recv() => {
                    logger::log_signal("SIGINT received, shutting down");
                    handler.request_shutdown();
                    break;
                }
                _ = sigusr1.recv() => handle_reopen_logs(),
            }
        }
    });

    Ok(())
}

/// Windows fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub fn start_signal_handler(
    handler: Arc<SignalHandler>,
    _state: Arc<AppState>,
) -> std::io::Result<()> {
    tokio::spawn(async move {
        logger::log_signal("Only Ctrl+C is supported; use the management API to change settings");
        if let Ok(()) = tokio::signal::ctrl_c().await {
            logger::log_signal("Ctrl+C received, shutting down");
            handler.request_shutdown();
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::io::Write;

    #[test]
    fn test_request_shutdown() {
        let handler = SignalHandler::new();
        assert!(!handler.is_shutdown_requested());
        handler.request_shutdown();
        assert!(handler.is_shutdown_requested());
    }

    #[test]
    fn test_reload_docs_settings() {
        let dir = std::env::temp_dir().join(format!("docserve-reload-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("docserve.toml");

        let config = Config::default_config().unwrap();
        let state = AppState::with_config_path(&config, path.to_str().unwrap());
        assert_eq!(state.docs.access(), "public");
        let (before, _) = state.settings_version.get();

        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[docs]\nroot = \"/srv/docs\"\naccess = \"staff\"").unwrap();
        drop(file);

        let docs = reload_docs_settings(&state).unwrap();
        assert_eq!(docs.access.as_deref(), Some("staff"));
        assert_eq!(state.docs.access(), "staff");
        assert_eq!(state.docs.root().as_deref(), Some("/srv/docs"));
        assert!(!state.docs.dirhtml());
        assert!(state.settings_version.get().0 > before);

        std::fs::write(&path, "[docs\nbroken").unwrap();
        assert!(reload_docs_settings(&state).is_err());
        assert_eq!(state.docs.access(), "staff");

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
