//! Logger module
//!
//! Provides logging utilities for the gate server including:
//! - Server lifecycle logging
//! - Filter decision and reproxy tracing
//! - Access logging with multiple formats
//! - Error and warning logging

mod format;
pub mod writer;

pub use format::AccessLogEntry;
pub use writer::LogLevel;

use crate::config::Config;
use crate::filters::Decision;
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        LogLevel::parse(&config.logging.level),
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

fn enabled(level: LogLevel) -> bool {
    writer::get().map_or(level <= LogLevel::Info, |w| w.enabled(level))
}

/// Write to info/access log
fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write_info("======================================");
    write_info("Static gate started successfully");
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    write_info(&format!("Static output root: {}", config.gate.static_out_dir));
    write_info(&format!(
        "Reproxy prefix: {} (max delegations: {})",
        config.gate.reproxy_prefix, config.gate.max_delegations
    ));
    for mount in config.effective_mounts() {
        let filters: Vec<String> = mount.filters.iter().map(ToString::to_string).collect();
        write_info(&format!(
            "Mount {} -> [{}] dir={} reproxy={}",
            mount.path,
            filters.join(", "),
            mount.dir.as_deref().unwrap_or(&config.gate.static_out_dir),
            mount.reproxy,
        ));
    }
    write_info("======================================\n");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    if enabled(LogLevel::Debug) {
        write_info(&format!("[Connection] Accepted from: {peer_addr}"));
    }
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    if enabled(LogLevel::Warn) {
        write_error(&format!("[WARN] {message}"));
    }
}

pub fn log_info(message: &str) {
    if enabled(LogLevel::Info) {
        write_info(&format!("[INFO] {message}"));
    }
}

/// Trace one filter decision
pub fn log_decision(filter: &str, script_name: &str, path: &str, decision: &Decision) {
    if enabled(LogLevel::Debug) {
        write_info(&format!(
            "[Filter] {filter} {script_name}{path} -> {}",
            decision.describe()
        ));
    }
}

pub fn log_reproxy(from: &str, to: &str, remaining: u32) {
    if enabled(LogLevel::Info) {
        write_info(&format!(
            "[Reproxy] {from} -> {to} (remaining delegations: {remaining})"
        ));
    }
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    match writer::get() {
        Some(w) => w.write_access(&entry.format(format)),
        None => println!("{}", entry.format(format)),
    }
}

pub fn log_shutdown() {
    write_info("\n[Shutdown] Stopped accepting connections");
}
