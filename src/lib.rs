//! # EmberKV - A Redis-Compatible Wire-Protocol Engine
//!
//! EmberKV speaks RESP, the Redis serialization protocol. It contains an
//! incremental decoder that survives arbitrary partial reads, an encoder for
//! replies, a command dispatcher, and a small Tokio server that wires them
//! together.
//!
//! ## Features
//!
//! - **Incremental decoding**: A request may arrive one byte at a time or many
//!   requests in one read; values are only produced once complete
//! - **Bounded input**: Nesting depth, bulk size and array length are capped
//! - **Open command registry**: `PING` and `ECHO` built in, more can be added
//! - **Async I/O**: One Tokio task per connection
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              EmberKV                                    │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │ TCP Server  │───>│ Connection  │───>│ Dispatcher  │                  │
//! │  │ (accept)    │    │  Handler    │    │ + Registry  │                  │
//! │  └─────────────┘    └──────┬──────┘    └──────┬──────┘                  │
//! │                            │                  │                         │
//! │                            ▼                  ▼                         │
//! │                     ┌─────────────┐    ┌─────────────┐                  │
//! │                     │ RespDecoder │    │   encoder   │                  │
//! │                     │ feed / next │    │ reply frames│                  │
//! │                     └─────────────┘    └─────────────┘                  │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │ Dict (KeyValueStore) - standalone, not yet used by any command  │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use emberkv::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let server = Server::bind(&ServerConfig::default()).await?;
//!     server
//!         .run_until(async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`protocol`]: RESP value model, decoder and encoder
//! - [`commands`]: Command registry and dispatcher
//! - [`connection`]: Per-connection read/dispatch/write loop
//! - [`server`]: Listener and accept loop
//! - [`config`]: Server configuration
//! - [`storage`]: Key-value store for future stateful commands

pub mod commands;
pub mod config;
pub mod connection;
pub mod protocol;
pub mod server;
pub mod storage;

// Re-export commonly used types for convenience
pub use commands::{CommandError, CommandRegistry, Dispatcher};
pub use config::ServerConfig;
pub use connection::{handle_connection, ConnectionStats};
pub use protocol::{DecodeError, ProtocolError, RespDecoder, RespValue};
pub use server::Server;
pub use storage::{Dict, KeyValueStore};

/// The default port EmberKV listens on (same as Redis)
pub const DEFAULT_PORT: u16 = 6379;

/// The default host EmberKV binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// The default listen backlog
pub const DEFAULT_BACKLOG: u32 = 10;

/// Version of EmberKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
