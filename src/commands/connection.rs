//! Connection commands: PING, ECHO.

use super::registry::{Command, CommandError, CommandRegistry};
use crate::protocol::{encoder, RespValue};
use bytes::BytesMut;

/// Registers the connection commands.
pub fn register(registry: &mut CommandRegistry) {
    registry.register(Command::new(
        "ping",
        -1,
        cmd_ping,
        "Returns PONG; arguments are ignored",
    ));
    registry.register(Command::new(
        "echo",
        2,
        cmd_echo,
        "Returns the given message",
    ));
}

/// PING [anything ...]
fn cmd_ping(_args: &[RespValue], out: &mut BytesMut) -> Result<(), CommandError> {
    encoder::write_status(out, "PONG");
    Ok(())
}

/// ECHO message
fn cmd_echo(args: &[RespValue], out: &mut BytesMut) -> Result<(), CommandError> {
    match args.get(1) {
        Some(RespValue::BulkString(data)) => encoder::write_bulk_string(out, data),
        Some(RespValue::Status(text)) => encoder::write_bulk_string(out, text.as_bytes()),
        Some(RespValue::Integer(n)) => encoder::write_bulk_string(out, n.to_string().as_bytes()),
        Some(_) => return Err(CommandError::WrongArgumentType("echo")),
        None => return Err(CommandError::WrongArity("echo")),
    }
    Ok(())
}
