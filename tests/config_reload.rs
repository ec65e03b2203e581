//! SIGHUP reload keeps the same source layering as startup.
//!
//! Environment variables are process-wide, so this binary holds a single
//! test.

use docserve::config::{AppState, Config};
use docserve::server::signal::reload_docs_settings;
use std::io::Write;

#[test]
fn test_reload_keeps_environment_overrides() {
    let dir = std::env::temp_dir().join(format!("docserve-env-reload-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("docserve.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "[docs]\nroot = \"/srv/docs\"\naccess = \"public\"").unwrap();
    drop(file);

    std::env::set_var("DOCSERVE__DOCS__ACCESS", "staff");
    std::env::set_var("DOCSERVE__DOCS__DIRHTML", "true");

    let config_path = path.to_str().unwrap();
    let config = Config::load_from(config_path).unwrap();
    let state = AppState::with_config_path(&config, config_path);
    assert_eq!(state.docs.access(), "staff");
    assert!(state.docs.dirhtml());

    let docs = reload_docs_settings(&state).unwrap();
    assert_eq!(docs.access.as_deref(), Some("staff"));
    assert_eq!(docs.root.as_deref(), Some("/srv/docs"));
    assert_eq!(state.docs.access(), "staff");
    assert!(state.docs.dirhtml());

    // The file still applies underneath the environment
    std::fs::write(&path, "[docs]\nroot = \"/srv/other\"\n").unwrap();
    reload_docs_settings(&state).unwrap();
    assert_eq!(state.docs.root().as_deref(), Some("/srv/other"));
    assert_eq!(state.docs.access(), "staff");

    std::env::remove_var("DOCSERVE__DOCS__ACCESS");
    std::env::remove_var("DOCSERVE__DOCS__DIRHTML");
    std::fs::remove_dir_all(&dir).unwrap();
}
