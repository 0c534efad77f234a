//! Server module
//!
//! Binds the listening socket and dispatches each accepted connection to
//! its own task. Runs until the process is terminated; there is no
//! in-process shutdown signal.

mod connection;
mod listener;

pub use listener::create_listener;

use crate::config::AppState;
use crate::logger;
use std::sync::Arc;

/// Bind the configured address and serve requests forever
pub async fn start(state: Arc<AppState>) -> Result<(), Box<dyn std::error::Error>> {
    let addr = state.config.get_socket_addr()?;
    let listener = create_listener(addr)?;
    logger::log_server_start(&addr, &state.root);

    loop {
        match listener.accept().await {
            Ok((stream, peer_addr)) => {
                if state.config.logging.access_log {
                    logger::log_connection_accepted(&peer_addr);
                }
                connection::spawn_connection(stream, Arc::clone(&state));
            }
            Err(e) => {
                logger::log_error(&format!("Failed to accept connection: {e}"));
            }
        }
    }
}
