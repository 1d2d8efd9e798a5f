//! Command Dispatch Module
//!
//! This module sits between the decoder and the encoder. It receives decoded
//! RESP values, maps them to a registered command and writes one reply.
//!
//! ## Architecture
//!
//! ```text
//! Client Request
//!       │
//!       ▼
//! ┌─────────────────┐
//! │  RespDecoder    │  (protocol module)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │   Dispatcher    │────>│ CommandRegistry  │
//! │  (this module)  │     │  name -> handler │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │    encoder      │  (protocol module)
//! └─────────────────┘
//! ```
//!
//! ## Supported Commands
//!
//! - `PING [arg ...]` - replies `PONG`
//! - `ECHO message` - replies with `message`

pub mod connection;
pub mod handler;
pub mod registry;

pub use handler::Dispatcher;
pub use registry::{Command, CommandError, CommandFn, CommandRegistry};
