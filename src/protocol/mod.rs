//! RESP Protocol Implementation
//!
//! This module provides the wire-protocol engine: the value model, an
//! incremental decoder for incoming bytes, and the encoder for replies.
//!
//! ## Modules
//!
//! - `types`: Defines the `RespValue` enum
//! - `parser`: Incremental decoder (`RespDecoder`) for incoming RESP data
//! - `encoder`: Framing functions for outgoing replies
//!
//! ## Example
//!
//! ```
//! use emberkv::protocol::{encoder, RespDecoder, RespValue};
//! use bytes::{Bytes, BytesMut};
//!
//! // Decoding incoming data
//! let mut decoder = RespDecoder::new();
//! decoder.feed(b"*2\r\n$4\r\nECHO\r\n$5\r\nhello\r\n").unwrap();
//! let command = decoder.next_value().unwrap().unwrap();
//! assert_eq!(command.as_array().map(|a| a.len()), Some(2));
//!
//! // Writing replies
//! let mut out = BytesMut::new();
//! encoder::write_bulk_string(&mut out, b"hello");
//! assert_eq!(&out[..], b"$5\r\nhello\r\n");
//! ```

pub mod encoder;
pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use parser::{parse_message, DecodeError, ProtocolError, RespDecoder};
pub use types::RespValue;
