//! RESP (Redis Serialization Protocol) Data Types
//!
//! This module defines the value model shared by the decoder, the encoder
//! and the command layer.
//!
//! ## Protocol Format
//!
//! Each RESP type starts with a type prefix byte:
//! - `+` Status (simple string)
//! - `-` Error
//! - `:` Integer
//! - `$` Bulk String
//! - `*` Array
//!
//! All structural lines are terminated with CRLF (`\r\n`).
//!
//! ## Examples
//!
//! Status: `+OK\r\n`
//! Error: `-ERR unknown command\r\n`
//! Integer: `:1000\r\n`
//! Bulk String: `$5\r\nhello\r\n`
//! Array: `*2\r\n$4\r\nECHO\r\n$5\r\nhello\r\n`
//! Nil: `$-1\r\n` or `*-1\r\n`

use crate::protocol::encoder;
use bytes::{Bytes, BytesMut};
use std::fmt;

/// The CRLF terminator used in RESP protocol
pub const CRLF: &[u8] = b"\r\n";

/// RESP protocol type prefixes
pub mod prefix {
    pub const STATUS: u8 = b'+';
    pub const ERROR: u8 = b'-';
    pub const INTEGER: u8 = b':';
    pub const BULK_STRING: u8 = b'$';
    pub const ARRAY: u8 = b'*';
}

/// A single decoded (or to-be-encoded) protocol value.
///
/// Arrays own their elements exclusively, so dropping an array drops the
/// whole tree beneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespValue {
    /// Simple status line. Never contains CR or LF.
    /// Format: `+<text>\r\n`
    Status(String),

    /// Error line, same constraint as `Status`.
    /// Format: `-<text>\r\n`
    Error(String),

    /// 64-bit signed integer.
    /// Format: `:<integer>\r\n`
    Integer(i64),

    /// Binary-safe string; the byte count is the declared length.
    /// Format: `$<length>\r\n<data>\r\n`
    BulkString(Bytes),

    /// Null bulk string (`$-1\r\n`) or null array (`*-1\r\n`).
    ///
    /// The two wire forms decode to the same value.
    Nil,

    /// Ordered sequence of values, possibly empty or nested.
    /// Format: `*<count>\r\n<element1><element2>...`
    Array(Vec<RespValue>),
}

impl RespValue {
    /// Creates a new status value.
    ///
    /// # Example
    /// ```
    /// use emberkv::protocol::types::RespValue;
    /// let ok = RespValue::status("OK");
    /// assert_eq!(ok.serialize(), b"+OK\r\n");
    /// ```
    pub fn status(s: impl Into<String>) -> Self {
        RespValue::Status(s.into())
    }

    /// Creates a new error value. The text is written as-is, without the
    /// `ERR` class prefix the dispatcher adds to its replies.
    pub fn error(s: impl Into<String>) -> Self {
        RespValue::Error(s.into())
    }

    pub fn integer(n: i64) -> Self {
        RespValue::Integer(n)
    }

    /// Creates a new bulk string value.
    ///
    /// # Example
    /// ```
    /// use emberkv::protocol::types::RespValue;
    /// use bytes::Bytes;
    /// let bulk = RespValue::bulk_string(Bytes::from("hello"));
    /// assert_eq!(bulk.serialize(), b"$5\r\nhello\r\n");
    /// ```
    pub fn bulk_string(data: impl Into<Bytes>) -> Self {
        RespValue::BulkString(data.into())
    }

    pub fn nil() -> Self {
        RespValue::Nil
    }

    pub fn array(values: Vec<RespValue>) -> Self {
        RespValue::Array(values)
    }

    /// Common status for successful operations
    pub fn ok() -> Self {
        RespValue::Status("OK".to_string())
    }

    /// Common status for PING
    pub fn pong() -> Self {
        RespValue::Status("PONG".to_string())
    }

    /// Serializes the value to its wire representation.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = BytesMut::new();
        self.serialize_into(&mut buf);
        buf.to_vec()
    }

    /// Serializes the value into an existing buffer.
    ///
    /// Prefer this over `serialize()` when several frames share one buffer.
    pub fn serialize_into(&self, buf: &mut BytesMut) {
        encoder::write_value(buf, self);
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, RespValue::Nil)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, RespValue::Error(_))
    }

    /// Returns the raw bytes of a textual value (`Status` or `BulkString`).
    ///
    /// This is what the command layer treats as a command name or argument.
    pub fn as_text(&self) -> Option<&[u8]> {
        match self {
            RespValue::Status(s) => Some(s.as_bytes()),
            RespValue::BulkString(b) => Some(b),
            _ => None,
        }
    }

    /// Attempts to extract the inner bytes from BulkString.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            RespValue::BulkString(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            RespValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[RespValue]> {
        match self {
            RespValue::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Consumes self and returns the inner array if this is an Array variant.
    pub fn into_array(self) -> Option<Vec<RespValue>> {
        match self {
            RespValue::Array(arr) => Some(arr),
            _ => None,
        }
    }
}

impl fmt::Display for RespValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RespValue::Status(s) => write!(f, "{}", s),
            RespValue::Error(s) => write!(f, "(error) {}", s),
            RespValue::Integer(n) => write!(f, "(integer) {}", n),
            RespValue::BulkString(data) => match std::str::from_utf8(data) {
                Ok(s) => write!(f, "\"{}\"", s.escape_debug()),
                Err(_) => write!(f, "(binary data, {} bytes)", data.len()),
            },
            RespValue::Nil => write!(f, "(nil)"),
            RespValue::Array(values) => {
                if values.is_empty() {
                    return write!(f, "(empty array)");
                }
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}) {}", i + 1, v)?;
                }
                Ok(())
            }
        }
    }
}
