//! Command Dispatcher
//!
//! Receives decoded RESP values, validates their shape, looks the command up
//! in the [`CommandRegistry`] and runs its handler.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Dispatcher                           │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐      │
//! │  │  validate   │───>│   lookup    │───>│   execute   │      │
//! │  │  (shape)    │    │  (+ arity)  │    │  (handler)  │      │
//! │  └─────────────┘    └─────────────┘    └─────────────┘      │
//! │         │                  │                  │             │
//! │         └──────────────────┴──────────────────┘             │
//! │                            ▼                                │
//! │                    one reply frame                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every call to [`Dispatcher::dispatch`] appends exactly one frame: the
//! handler's reply, or an `-ERR` reply describing a [`CommandError`].

use super::registry::{CommandError, CommandRegistry};
use crate::protocol::{encoder, RespValue};
use bytes::BytesMut;
use std::sync::Arc;
use tracing::trace;

/// Dispatches commands to their handlers.
///
/// Cloning is cheap; all clones share one registry.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<CommandRegistry>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Creates a dispatcher over the built-in commands.
    pub fn new() -> Self {
        Self::with_registry(CommandRegistry::new())
    }

    pub fn with_registry(registry: CommandRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Executes `command` and appends its reply to `out`.
    ///
    /// # Example
    ///
    /// ```
    /// use emberkv::commands::Dispatcher;
    /// use emberkv::protocol::RespValue;
    /// use bytes::{Bytes, BytesMut};
    ///
    /// let dispatcher = Dispatcher::new();
    /// let mut out = BytesMut::new();
    /// let ping = RespValue::array(vec![RespValue::bulk_string(Bytes::from("PING"))]);
    /// dispatcher.dispatch(&ping, &mut out);
    /// assert_eq!(&out[..], b"+PONG\r\n");
    /// ```
    pub fn dispatch(&self, command: &RespValue, out: &mut BytesMut) {
        let mark = out.len();
        if let Err(err) = self.execute(command, out) {
            trace!(error = %err, "Command rejected");
            out.truncate(mark);
            encoder::write_error(out, &err.to_string());
        }
    }

    fn execute(&self, command: &RespValue, out: &mut BytesMut) -> Result<(), CommandError> {
        let args = match command {
            RespValue::Array(args) if !args.is_empty() => args,
            _ => return Err(CommandError::InvalidCommand),
        };
        let name = args[0].as_text().ok_or(CommandError::InvalidCommand)?;

        let cmd = self
            .registry
            .lookup(name)
            .ok_or_else(|| CommandError::UnknownCommand(printable_name(name)))?;

        if !cmd.accepts(args.len()) {
            return Err(CommandError::WrongArity(cmd.name));
        }

        trace!(command = cmd.name, argc = args.len(), "Executing command");
        (cmd.handler)(args, out)
    }
}

/// Renders a client-supplied name so it is safe inside an error line.
fn printable_name(name: &[u8]) -> String {
    String::from_utf8_lossy(name).replace(['\r', '\n'], " ")
}
