//! Command registry for looking up commands by name.
//!
//! A [`Command`] pairs a name with an arity and a handler function. Arity
//! follows the Redis convention and counts the command name itself:
//!
//! - positive `n`: exactly `n` elements
//! - negative `-n`: at least `n` elements

use crate::protocol::RespValue;
use bytes::BytesMut;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Errors reported to the client as `-ERR` replies.
///
/// None of these close the connection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The request is not a non-empty array headed by a textual name
    #[error("invalid command")]
    InvalidCommand,

    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("wrong number of arguments for '{0}' command")]
    WrongArity(&'static str),

    #[error("wrong type of argument for '{0}' command")]
    WrongArgumentType(&'static str),
}

/// Handler signature.
///
/// `args` is the full request array, name included. A handler writes exactly
/// one frame to `out` on success and nothing on error.
pub type CommandFn = fn(args: &[RespValue], out: &mut BytesMut) -> Result<(), CommandError>;

/// Command definition.
#[derive(Clone, Copy)]
pub struct Command {
    /// Lowercase command name
    pub name: &'static str,
    /// Element count including the name; negative means "at least"
    pub arity: i32,
    /// Handler function
    pub handler: CommandFn,
    /// Help text
    pub summary: &'static str,
}

impl Command {
    pub const fn new(
        name: &'static str,
        arity: i32,
        handler: CommandFn,
        summary: &'static str,
    ) -> Self {
        Self {
            name,
            arity,
            handler,
            summary,
        }
    }

    /// Returns true if a request with `argc` elements satisfies the arity.
    pub fn accepts(&self, argc: usize) -> bool {
        let required = self.arity.unsigned_abs() as usize;
        if self.arity >= 0 {
            argc == required
        } else {
            argc >= required
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("summary", &self.summary)
            .finish()
    }
}

/// Registry of available commands, keyed by lowercase name.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Command>,
}

impl CommandRegistry {
    /// Creates a registry holding the built-in commands.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        super::connection::register(&mut registry);
        registry
    }

    /// Creates a registry with no commands.
    pub fn empty() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// Registers a command, replacing any previous one with the same name.
    pub fn register(&mut self, cmd: Command) {
        self.commands.insert(cmd.name.to_ascii_lowercase(), cmd);
    }

    /// Looks up a command by name, ignoring ASCII case.
    ///
    /// Names that are not valid UTF-8 never match.
    pub fn lookup(&self, name: &[u8]) -> Option<&Command> {
        let name = std::str::from_utf8(name).ok()?;
        self.commands.get(&name.to_ascii_lowercase())
    }

    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.commands.values()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_args: &[RespValue], _out: &mut BytesMut) -> Result<(), CommandError> {
        Ok(())
    }

    #[test]
    fn test_exact_arity() {
        let cmd = Command::new("echo", 2, noop, "");
        assert!(!cmd.accepts(1));
        assert!(cmd.accepts(2));
        assert!(!cmd.accepts(3));
    }

    #[test]
    fn test_minimum_arity() {
        let cmd = Command::new("ping", -1, noop, "");
        assert!(cmd.accepts(1));
        assert!(cmd.accepts(5));
        assert!(!cmd.accepts(0));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = CommandRegistry::new();
        assert_eq!(registry.lookup(b"PING").map(|c| c.name), Some("ping"));
        assert_eq!(registry.lookup(b"pInG").map(|c| c.name), Some("ping"));
        assert_eq!(registry.lookup(b"echo").map(|c| c.name), Some("echo"));
        assert!(registry.lookup(b"PINGX").is_none());
        assert!(registry.lookup(b"\xff\xfe").is_none());
    }

    #[test]
    fn test_register_extends_registry() {
        let mut registry = CommandRegistry::empty();
        assert!(registry.is_empty());
        registry.register(Command::new("NOOP", 1, noop, "does nothing"));
        assert_eq!(registry.len(), 1);
        assert!(registry.lookup(b"noop").is_some());
    }

    #[test]
    fn test_builtin_commands_listed() {
        let registry = CommandRegistry::new();
        let mut names: Vec<_> = registry.commands().map(|c| c.name).collect();
        names.sort_unstable();
        assert_eq!(names, ["echo", "ping"]);
        assert!(registry.commands().all(|c| !c.summary.is_empty()));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(CommandError::InvalidCommand.to_string(), "invalid command");
        assert_eq!(
            CommandError::WrongArity("echo").to_string(),
            "wrong number of arguments for 'echo' command"
        );
        assert_eq!(
            CommandError::UnknownCommand("foo".into()).to_string(),
            "unknown command 'foo'"
        );
    }
}
