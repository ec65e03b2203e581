// Server loop module
// Accepts connections until shutdown is requested

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;

use super::connection::{accept_connection, ServerKind};
use super::signal::SignalHandler;
use crate::config::AppState;
use crate::logger;

/// Accept loop shared by the docs and API listeners
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    active_connections: Arc<AtomicUsize>,
    kind: ServerKind,
    signals: Arc<SignalHandler>,
) {
    // Registered before the flag check so a shutdown between the two is not lost
    let shutdown = signals.shutdown.notified();
    tokio::pin!(shutdown);
    shutdown.as_mut().enable();

    loop {
        if signals.is_shutdown_requested() {
            break;
        }

        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections, kind);
                    }
                    Err(e) => match kind {
                        ServerKind::Api => logger::log_api_error(&format!("Failed to accept connection: {e}")),
                        ServerKind::Docs => logger::log_error(&format!("Failed to accept connection: {e}")),
                    },
                }
            }

            () = &mut shutdown => break,
        }
    }

    logger::log_info(&format!(
        "{kind} listener stopped, {} connection(s) still open",
        active_connections.load(Ordering::SeqCst)
    ));
}
