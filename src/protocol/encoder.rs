//! RESP Encoder
//!
//! Stateless framing functions. Every function appends exactly one complete
//! frame to the sink, so callers can flush after any call.
//!
//! Reply shapes used by command handlers:
//!
//! | Function            | Frame                          |
//! |---------------------|--------------------------------|
//! | `write_status`      | `+<text>\r\n`                  |
//! | `write_error`       | `-ERR <message>\r\n`           |
//! | `write_bulk_string` | `$<len>\r\n<bytes>\r\n`        |
//! | `write_integer`     | `:<n>\r\n`                     |
//! | `write_nil`         | `$-1\r\n`                      |
//!
//! `write_value` encodes any [`RespValue`] and is what
//! [`RespValue::serialize`] uses.

use crate::protocol::types::{prefix, RespValue, CRLF};
use bytes::{BufMut, BytesMut};

/// Error class tag prepended to every error reply.
pub const ERROR_CLASS: &str = "ERR";

/// Writes a status line. `text` must not contain CR or LF.
pub fn write_status(out: &mut BytesMut, text: &str) {
    debug_assert!(!text.contains(['\r', '\n']), "status text contains CR/LF");
    out.reserve(1 + text.len() + 2);
    out.put_u8(prefix::STATUS);
    out.put_slice(text.as_bytes());
    out.put_slice(CRLF);
}

/// Writes an error reply tagged with the `ERR` class.
pub fn write_error(out: &mut BytesMut, message: &str) {
    out.reserve(1 + ERROR_CLASS.len() + 1 + message.len() + 2);
    out.put_u8(prefix::ERROR);
    out.put_slice(ERROR_CLASS.as_bytes());
    out.put_u8(b' ');
    out.put_slice(message.as_bytes());
    out.put_slice(CRLF);
}

/// Writes an error line verbatim, without adding a class tag.
pub fn write_raw_error(out: &mut BytesMut, text: &str) {
    out.reserve(1 + text.len() + 2);
    out.put_u8(prefix::ERROR);
    out.put_slice(text.as_bytes());
    out.put_slice(CRLF);
}

/// Writes a bulk string. The payload is binary safe.
pub fn write_bulk_string(out: &mut BytesMut, data: &[u8]) {
    write_length_line(out, prefix::BULK_STRING, data.len() as i64);
    out.reserve(data.len() + 2);
    out.put_slice(data);
    out.put_slice(CRLF);
}

pub fn write_integer(out: &mut BytesMut, n: i64) {
    write_length_line(out, prefix::INTEGER, n);
}

/// Writes the null bulk string, the form used for every `Nil`.
pub fn write_nil(out: &mut BytesMut) {
    write_length_line(out, prefix::BULK_STRING, -1);
}

/// Writes an array header. The caller writes `count` elements afterwards.
pub fn write_array_header(out: &mut BytesMut, count: usize) {
    write_length_line(out, prefix::ARRAY, count as i64);
}

/// Writes any value, recursing into arrays.
pub fn write_value(out: &mut BytesMut, value: &RespValue) {
    match value {
        RespValue::Status(s) => write_status(out, s),
        RespValue::Error(s) => write_raw_error(out, s),
        RespValue::Integer(n) => write_integer(out, *n),
        RespValue::BulkString(data) => write_bulk_string(out, data),
        RespValue::Nil => write_nil(out),
        RespValue::Array(values) => {
            write_array_header(out, values.len());
            for v in values {
                write_value(out, v);
            }
        }
    }
}

#[inline]
fn write_length_line(out: &mut BytesMut, type_byte: u8, n: i64) {
    let digits = n.to_string();
    out.reserve(1 + digits.len() + 2);
    out.put_u8(type_byte);
    out.put_slice(digits.as_bytes());
    out.put_slice(CRLF);
}
