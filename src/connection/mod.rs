//! Connection Driver
//!
//! Drives one client connection from first byte to close. The server spawns
//! one task per accepted socket; each task owns its own [`RespDecoder`], so
//! no decoding state is ever shared between clients.
//!
//! ```text
//!   socket ──read──> RespDecoder::feed
//!                         │
//!                         ▼
//!             next_value() until Ok(None) ──> Dispatcher::dispatch
//!                                                     │
//!   socket <──write + flush── reply buffer <──────────┘
//! ```
//!
//! The connection ends on EOF, a read or write error, or a protocol error.
//! A protocol error is answered with a single `-ERR Protocol error: ...`
//! frame before closing. Replies to requests that came before the bad
//! bytes are still delivered.
//!
//! ## Example
//!
//! ```ignore
//! use emberkv::commands::Dispatcher;
//! use emberkv::connection::{handle_connection, ConnectionStats};
//! use std::sync::Arc;
//!
//! let stats = Arc::new(ConnectionStats::new());
//! let dispatcher = Dispatcher::new();
//!
//! let (stream, addr) = listener.accept().await?;
//! tokio::spawn(handle_connection(stream, addr, dispatcher.clone(), stats.clone(), 8192));
//! ```
//!
//! [`RespDecoder`]: crate::protocol::RespDecoder

pub mod handler;

pub use handler::{handle_connection, ConnectionError, ConnectionHandler, ConnectionStats};
