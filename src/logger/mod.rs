//! Logger module
//!
//! Logging utilities for the server:
//! - Startup banner
//! - Access logging (gated by `logging.access_log`)
//! - Error and warning logging
//! - Optional file targets for both streams

pub mod writer;

use crate::config::Config;
use chrono::Local;
use std::net::SocketAddr;
use std::path::Path;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

/// Write to info/access log
fn write_info(message: &str) {
    if writer::is_initialized() {
        writer::get().write_info(message);
    } else {
        println!("{message}");
    }
}

/// Write to error log
fn write_error(message: &str) {
    if writer::is_initialized() {
        writer::get().write_error(message);
    } else {
        eprintln!("{message}");
    }
}

pub fn log_server_start(addr: &SocketAddr, root: &Path) {
    write_info(&format!("Starting up staticd, serving: {}", root.display()));
    write_info(&format!("  http://{addr}\n"));
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    write_info(&format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_request(method: &hyper::Method, path: &str) {
    write_info(&format!(
        "[{}] {method} {path}",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
}

pub fn log_response(status: u16, body_bytes: usize) {
    write_info(&format!("  -> {status} ({body_bytes} bytes)"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}
