//! Server configuration
//!
//! Parsed from the command line by the `emberkv` binary. Library users can
//! build a [`ServerConfig`] directly; `Default` matches the CLI defaults.

use crate::connection::handler::DEFAULT_READ_BUFFER_SIZE;
use crate::{DEFAULT_BACKLOG, DEFAULT_HOST, DEFAULT_PORT};
use clap::Parser;

/// EmberKV server options
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "emberkv")]
#[command(about = "A Redis-compatible RESP server")]
#[command(version)]
pub struct ServerConfig {
    /// Host to bind to
    #[arg(short = 'H', long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Listen backlog for pending connections
    #[arg(long, default_value_t = DEFAULT_BACKLOG)]
    pub backlog: u32,

    /// Maximum bytes taken from the socket per read
    #[arg(long, default_value_t = DEFAULT_READ_BUFFER_SIZE)]
    pub read_buffer_size: usize,

    /// Log filter used when RUST_LOG is not set (e.g. "debug", "emberkv=trace")
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            backlog: DEFAULT_BACKLOG,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Returns the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
