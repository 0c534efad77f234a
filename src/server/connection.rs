// Connection handling module
// Serves a single accepted TCP connection in its own task

use crate::config::AppState;
use crate::handler;
use crate::logger;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;

/// Serve one connection in a spawned task.
///
/// Wraps the stream in `TokioIo` and configures HTTP/1.1 keep-alive. The
/// configured read timeout bounds how long the connection may sit idle
/// waiting for a request's headers, including the gap between keep-alive
/// requests; a slow but active transfer is never cut off. Each request on
/// the connection goes through `handler::handle_request` independently.
pub fn spawn_connection(stream: TcpStream, state: Arc<AppState>) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let keep_alive = state.config.http.keep_alive_timeout > 0;
        let idle_timeout = Duration::from_secs(state.config.http.read_timeout);

        let mut builder = http1::Builder::new();
        builder
            .keep_alive(keep_alive)
            .timer(TokioTimer::new())
            .header_read_timeout(idle_timeout);

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| handler::handle_request(req, Arc::clone(&service_state))),
        );

        if let Err(err) = conn.await {
            logger::log_connection_error(&err);
        }
    });
}
