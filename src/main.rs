use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;

use docserve::auth::{hash_password, AuthError};
use docserve::config::{AppState, Config, DEFAULT_CONFIG_PATH};
use docserve::logger;
use docserve::server::{self, ServerKind, SignalHandler};

#[derive(Parser, Debug)]
#[command(
    name = "docserve",
    version,
    about = "Serve generated documentation behind an access policy"
)]
struct Cli {
    /// Path to configuration file (extension optional)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the documentation server (default)
    Serve,
    /// Print an Argon2 hash for an `[[auth.users]]` entry
    HashPassword { password: String },
    /// Load and validate the configuration, then exit
    CheckConfig,
}

#[derive(Debug, Error)]
enum StartupError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] ::config::ConfigError),
    #[error("invalid listen address: {0}")]
    Address(String),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("failed to render docs settings: {0}")]
    Render(#[from] toml::ser::Error),
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::HashPassword { password } => {
            println!("{}", hash_password(&password).map_err(StartupError::from)?);
            Ok(())
        }
        Command::CheckConfig => {
            let cfg = Config::load_from(&cli.config).map_err(StartupError::from)?;
            cfg.get_socket_addr().map_err(StartupError::Address)?;
            cfg.get_api_socket_addr().map_err(StartupError::Address)?;
            println!(
                "Configuration OK: mount {}, {} user account(s)",
                cfg.mount_path(),
                cfg.auth.users.len()
            );
            // Effective docs settings, environment overrides applied
            let docs = toml::to_string(&cfg.docs).map_err(StartupError::from)?;
            println!("[docs]\n{docs}");
            Ok(())
        }
        Command::Serve => serve(&cli.config).map_err(Into::into),
    }
}

fn serve(config_path: &str) -> Result<(), StartupError> {
    let cfg = Config::load_from(config_path)?;
    logger::init(&cfg)?;

    // Tokio runtime, worker count from config
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg, config_path))
}

async fn async_main(cfg: Config, config_path: &str) -> Result<(), StartupError> {
    let app_addr = cfg.get_socket_addr().map_err(StartupError::Address)?;
    let api_addr = cfg.get_api_socket_addr().map_err(StartupError::Address)?;

    let app_listener = bind(app_addr)?;
    let api_listener = bind(api_addr)?;

    let state = Arc::new(AppState::with_config_path(&cfg, config_path));
    if state.docs.root().is_none() {
        logger::log_warning("DOCS_ROOT is not set; documentation requests will fail until it is");
    }

    let signals = Arc::new(SignalHandler::new());
    server::start_signal_handler(Arc::clone(&signals), Arc::clone(&state))?;

    logger::log_server_start(&app_addr, &api_addr, &cfg);

    // spawn_local needs a LocalSet
    let local = tokio::task::LocalSet::new();
    local
        .run_until(run_dual_servers(app_listener, api_listener, state, signals))
        .await;

    logger::log_info("Server stopped");
    Ok(())
}

fn bind(addr: SocketAddr) -> Result<TcpListener, StartupError> {
    server::create_reusable_listener(addr).map_err(|source| StartupError::Bind { addr, source })
}

async fn run_dual_servers(
    app_listener: TcpListener,
    api_listener: TcpListener,
    state: Arc<AppState>,
    signals: Arc<SignalHandler>,
) {
    let api_task = tokio::task::spawn_local(server::start_server_loop(
        api_listener,
        Arc::clone(&state),
        Arc::new(AtomicUsize::new(0)),
        ServerKind::Api,
        Arc::clone(&signals),
    ));

    server::start_server_loop(
        app_listener,
        state,
        Arc::new(AtomicUsize::new(0)),
        ServerKind::Docs,
        signals,
    )
    .await;

    if let Err(e) = api_task.await {
        logger::log_api_error(&format!("API server task failed: {e}"));
    }
}
