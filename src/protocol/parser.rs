//! Incremental RESP Decoder
//!
//! This module turns a raw byte stream into [`RespValue`]s. Bytes arrive in
//! arbitrary chunks (a socket read may deliver one byte or a dozen pipelined
//! commands), so the decoder owns a buffer and a read cursor and only hands
//! out values once they are complete.
//!
//! ## How the Decoder Works
//!
//! 1. The caller appends every socket read with [`RespDecoder::feed`].
//! 2. The caller drains with [`RespDecoder::next_value`] until it returns
//!    `Ok(None)`, then reads more bytes.
//!
//! `next_value` returns:
//! - `Ok(Some(value))` - a complete value; the cursor moved past it
//! - `Ok(None)` - not enough bytes yet; the cursor did not move
//! - `Err(DecodeError::Protocol(_))` - the bytes at the cursor are invalid
//!
//! A protocol error is terminal. The decoder remembers it and keeps
//! returning it, so a caller cannot accidentally resume at an untrustworthy
//! position.
//!
//! ## Buffer Management
//!
//! ```text
//!   consumed        unread               free
//! ┌──────────┬────────────────────┬─────────────────┐
//! │##########│ *2\r\n$4\r\nEC...  │                 │
//! └──────────┴────────────────────┴─────────────────┘
//! 0          pos                  len               cap
//! ```
//!
//! Every `feed` first shifts the unread region down to offset 0, then grows
//! capacity by doubling if the new chunk does not fit. Capacity never
//! shrinks while the decoder lives.

use crate::protocol::types::{prefix, RespValue, CRLF};
use bytes::Bytes;
use thiserror::Error;

/// Initial buffer capacity
pub const INITIAL_BUFFER_SIZE: usize = 4096;

/// Maximum size for a single bulk string (512 MB, same as Redis)
pub const MAX_BULK_SIZE: usize = 512 * 1024 * 1024;

/// Maximum number of elements a single array may declare
pub const MAX_ARRAY_LEN: usize = 1024 * 1024;

/// Maximum array nesting depth (prevent stack overflow)
pub const MAX_NESTING_DEPTH: usize = 32;

/// Longest integer, length or count field (`-9223372036854775808`)
pub const MAX_NUMERIC_LEN: usize = 20;

/// Maximum length of a status or error line
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Upper bound on elements reserved up front for a declared array count.
const ARRAY_PREALLOC_LIMIT: usize = 64;

/// Structural violations of the wire format.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Unknown type prefix byte
    #[error("unknown type prefix: {0:#04x}")]
    UnknownPrefix(u8),

    /// Length, count or integer field is not an optionally signed decimal
    #[error("invalid integer: {0:?}")]
    InvalidInteger(String),

    /// Bulk string or array length below -1
    #[error("invalid length: {0}")]
    InvalidLength(i64),

    /// Status or error line is not valid UTF-8
    #[error("invalid UTF-8 in simple string")]
    InvalidUtf8,

    /// Status or error line holds a CR or LF that is not its terminator
    #[error("CR or LF inside simple string")]
    StrayLineBreak,

    /// Status or error line longer than `MAX_LINE_LEN`, terminated or not
    #[error("line too long (max: {max} bytes)")]
    LineTooLong { max: usize },

    /// Bulk payload not followed by CRLF
    #[error("bulk string missing trailing CRLF")]
    MissingTerminator,

    #[error("bulk string too large: {size} bytes (max: {max})")]
    BulkTooLarge { size: i64, max: usize },

    #[error("array too large: {count} elements (max: {max})")]
    ArrayTooLarge { count: i64, max: usize },

    #[error("maximum nesting depth exceeded: {max}")]
    NestingTooDeep { max: usize },
}

/// Errors returned by [`RespDecoder`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer could not grow to hold the fed bytes
    #[error("out of memory: could not grow buffer to {requested} bytes")]
    OutOfMemory { requested: usize },

    /// The buffered bytes violate the protocol
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl DecodeError {
    /// Returns true for framing violations (as opposed to allocation failure).
    pub fn is_protocol(&self) -> bool {
        matches!(self, DecodeError::Protocol(_))
    }
}

/// Result of one decode step: a value, "need more bytes", or a violation.
type Step = Result<Option<RespValue>, ProtocolError>;

/// How far the CRLF search got on a line that was still unterminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LineScan {
    /// Offset of the line's first byte
    start: usize,
    /// Buffer length when the search gave up
    scanned: usize,
}

/// Read position for one decode attempt over the buffered bytes.
struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
    /// Scan left behind by the previous attempt
    resume: Option<LineScan>,
    /// Set when this attempt stopped on an unterminated line
    stalled: Option<LineScan>,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8], pos: usize, resume: Option<LineScan>) -> Self {
        Self {
            buf,
            pos,
            resume,
            stalled: None,
        }
    }
}

/// Incremental RESP decoder owning its input buffer.
///
/// # Example
///
/// ```
/// use emberkv::protocol::{RespDecoder, RespValue};
/// use bytes::Bytes;
///
/// let mut decoder = RespDecoder::new();
/// decoder.feed(b"*1\r\n$4\r\nPI").unwrap();
/// assert_eq!(decoder.next_value().unwrap(), None);
///
/// decoder.feed(b"NG\r\n").unwrap();
/// assert_eq!(
///     decoder.next_value().unwrap(),
///     Some(RespValue::array(vec![RespValue::bulk_string(Bytes::from("PING"))]))
/// );
/// ```
#[derive(Debug)]
pub struct RespDecoder {
    /// Buffered bytes; `buf.len()` is the total buffered length
    buf: Vec<u8>,

    /// Next unread byte
    pos: usize,

    /// Where the last incomplete attempt stopped looking for a CRLF
    scan: Option<LineScan>,

    /// Set once a protocol error has been returned
    failed: Option<ProtocolError>,
}

impl Default for RespDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl RespDecoder {
    /// Creates an empty decoder with the default initial capacity.
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_BUFFER_SIZE)
    }

    /// Creates an empty decoder with at least `capacity` bytes reserved.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity.max(1)),
            pos: 0,
            scan: None,
            failed: None,
        }
    }

    /// Appends a chunk of input.
    ///
    /// Content is not inspected here. The only failure is the buffer being
    /// unable to grow.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<(), DecodeError> {
        if self.pos > 0 {
            self.buf.drain(..self.pos);
            if let Some(scan) = &mut self.scan {
                scan.start = scan.start.saturating_sub(self.pos);
                scan.scanned = scan.scanned.saturating_sub(self.pos);
            }
            self.pos = 0;
        }

        let needed = self
            .buf
            .len()
            .checked_add(chunk.len())
            .ok_or(DecodeError::OutOfMemory {
                requested: usize::MAX,
            })?;

        if needed > self.buf.capacity() {
            let mut new_cap = self.buf.capacity().max(1);
            while new_cap < needed {
                new_cap = new_cap
                    .checked_mul(2)
                    .ok_or(DecodeError::OutOfMemory { requested: needed })?;
            }
            self.buf
                .try_reserve_exact(new_cap - self.buf.len())
                .map_err(|_| DecodeError::OutOfMemory { requested: new_cap })?;
        }

        self.buf.extend_from_slice(chunk);
        Ok(())
    }

    /// Attempts to decode one top-level value at the cursor.
    ///
    /// On `Ok(None)` the cursor is exactly where it was before the call.
    pub fn next_value(&mut self) -> Result<Option<RespValue>, DecodeError> {
        if let Some(err) = &self.failed {
            return Err(err.clone().into());
        }
        if self.pos >= self.buf.len() {
            return Ok(None);
        }

        let mut cursor = Cursor::new(&self.buf, self.pos, self.scan);
        match parse_value(&mut cursor, 0) {
            Ok(Some(value)) => {
                self.pos = cursor.pos;
                self.scan = None;
                Ok(Some(value))
            }
            Ok(None) => {
                self.scan = cursor.stalled;
                Ok(None)
            }
            Err(err) => {
                self.failed = Some(err.clone());
                Err(err.into())
            }
        }
    }

    /// Number of buffered bytes not yet consumed.
    pub fn buffered(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// True when no unread bytes are buffered.
    pub fn is_empty(&self) -> bool {
        self.buffered() == 0
    }

    /// Offset of the next unread byte within the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Current buffer capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// True once a protocol error has been reported.
    pub fn is_failed(&self) -> bool {
        self.failed.is_some()
    }
}

fn parse_value(cur: &mut Cursor<'_>, depth: usize) -> Step {
    let Some(&type_byte) = cur.buf.get(cur.pos) else {
        return Ok(None);
    };
    cur.pos += 1;

    match type_byte {
        prefix::STATUS => Ok(read_text(cur)?.map(RespValue::Status)),
        prefix::ERROR => Ok(read_text(cur)?.map(RespValue::Error)),
        prefix::INTEGER => Ok(read_number(cur)?.map(RespValue::Integer)),
        prefix::BULK_STRING => parse_bulk_string(cur),
        prefix::ARRAY => parse_array(cur, depth),
        other => Err(ProtocolError::UnknownPrefix(other)),
    }
}

/// `$<length>\r\n<data>\r\n`
fn parse_bulk_string(cur: &mut Cursor<'_>) -> Step {
    let Some(length) = read_number(cur)? else {
        return Ok(None);
    };

    if length == -1 {
        return Ok(Some(RespValue::Nil));
    }
    if length < 0 {
        return Err(ProtocolError::InvalidLength(length));
    }
    if length > MAX_BULK_SIZE as i64 {
        return Err(ProtocolError::BulkTooLarge {
            size: length,
            max: MAX_BULK_SIZE,
        });
    }

    let start = cur.pos;
    let end = start + length as usize;
    if cur.buf.len() < end + CRLF.len() {
        return Ok(None);
    }
    if &cur.buf[end..end + CRLF.len()] != CRLF {
        return Err(ProtocolError::MissingTerminator);
    }

    cur.pos = end + CRLF.len();
    Ok(Some(RespValue::BulkString(Bytes::copy_from_slice(
        &cur.buf[start..end],
    ))))
}

/// `*<count>\r\n<elements...>`
fn parse_array(cur: &mut Cursor<'_>, depth: usize) -> Step {
    if depth >= MAX_NESTING_DEPTH {
        return Err(ProtocolError::NestingTooDeep {
            max: MAX_NESTING_DEPTH,
        });
    }

    let Some(count) = read_number(cur)? else {
        return Ok(None);
    };

    if count == -1 {
        return Ok(Some(RespValue::Nil));
    }
    if count < 0 {
        return Err(ProtocolError::InvalidLength(count));
    }
    if count > MAX_ARRAY_LEN as i64 {
        return Err(ProtocolError::ArrayTooLarge {
            count,
            max: MAX_ARRAY_LEN,
        });
    }

    let count = count as usize;
    let mut elements = Vec::with_capacity(count.min(ARRAY_PREALLOC_LIMIT));
    for _ in 0..count {
        match parse_value(cur, depth + 1)? {
            Some(value) => elements.push(value),
            None => return Ok(None),
        }
    }

    Ok(Some(RespValue::Array(elements)))
}

/// Reads a CRLF-terminated line as UTF-8 text free of CR and LF.
fn read_text(cur: &mut Cursor<'_>) -> Result<Option<String>, ProtocolError> {
    let too_long = |_: &[u8]| ProtocolError::LineTooLong { max: MAX_LINE_LEN };
    let Some(line) = read_line(cur, MAX_LINE_LEN, too_long)? else {
        return Ok(None);
    };
    if line.iter().any(|&b| b == b'\r' || b == b'\n') {
        return Err(ProtocolError::StrayLineBreak);
    }
    std::str::from_utf8(line)
        .map(|s| Some(s.to_owned()))
        .map_err(|_| ProtocolError::InvalidUtf8)
}

/// Reads a CRLF-terminated signed decimal field.
fn read_number(cur: &mut Cursor<'_>) -> Result<Option<i64>, ProtocolError> {
    match read_line(cur, MAX_NUMERIC_LEN, numeric_too_long)? {
        Some(field) => parse_signed(field).map(Some),
        None => Ok(None),
    }
}

/// Returns the bytes up to the first CRLF and moves the cursor past the CRLF.
///
/// A line longer than `max` bytes fails with `too_long` as soon as that many
/// bytes are buffered, whether or not its CRLF has arrived.
fn read_line<'a>(
    cur: &mut Cursor<'a>,
    max: usize,
    too_long: impl FnOnce(&[u8]) -> ProtocolError,
) -> Result<Option<&'a [u8]>, ProtocolError> {
    let buf = cur.buf;
    let start = cur.pos;

    // Bytes already searched hold no CRLF; back up one for a split terminator.
    let from = match cur.resume {
        Some(scan) if scan.start == start => scan.scanned.saturating_sub(1).max(start),
        _ => start,
    };

    match find_crlf(&buf[from..]) {
        Some(offset) => {
            let line = &buf[start..from + offset];
            if line.len() > max {
                return Err(too_long(line));
            }
            cur.pos = from + offset + CRLF.len();
            Ok(Some(line))
        }
        None => {
            let pending = &buf[start..];
            // A trailing CR may be the first half of the terminator.
            let body = pending.strip_suffix(b"\r").unwrap_or(pending);
            if body.len() > max {
                return Err(too_long(pending));
            }
            cur.stalled = Some(LineScan {
                start,
                scanned: buf.len(),
            });
            Ok(None)
        }
    }
}

/// Finds the position of the first CRLF in the buffer.
#[inline]
fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == CRLF)
}

fn numeric_too_long(field: &[u8]) -> ProtocolError {
    let shown = &field[..field.len().min(MAX_NUMERIC_LEN)];
    ProtocolError::InvalidInteger(format!("{}...", String::from_utf8_lossy(shown)))
}

/// Parses an optional `-` followed by one or more ASCII digits.
fn parse_signed(field: &[u8]) -> Result<i64, ProtocolError> {
    let invalid = || ProtocolError::InvalidInteger(String::from_utf8_lossy(field).into_owned());

    let (negative, digits) = match field.split_first() {
        Some((&b'-', rest)) => (true, rest),
        _ => (false, field),
    };
    if digits.is_empty() {
        return Err(invalid());
    }

    let mut value: i64 = 0;
    for &b in digits {
        if !b.is_ascii_digit() {
            return Err(invalid());
        }
        let digit = i64::from(b - b'0');
        value = value
            .checked_mul(10)
            .and_then(|v| {
                if negative {
                    v.checked_sub(digit)
                } else {
                    v.checked_add(digit)
                }
            })
            .ok_or_else(invalid)?;
    }
    Ok(value)
}

/// Decodes a single value from a complete slice.
///
/// Returns the value and the number of bytes it occupied, or `Ok(None)` if
/// the slice ends before the value does.
pub fn parse_message(buf: &[u8]) -> Result<Option<(RespValue, usize)>, ProtocolError> {
    let mut cursor = Cursor::new(buf, 0, None);
    let value = parse_value(&mut cursor, 0)?;
    Ok(value.map(|value| (value, cursor.pos)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(input: &[u8]) -> Result<Vec<RespValue>, DecodeError> {
        let mut decoder = RespDecoder::new();
        decoder.feed(input)?;
        let mut values = Vec::new();
        while let Some(v) = decoder.next_value()? {
            values.push(v);
        }
        Ok(values)
    }

    fn decode_one(input: &[u8]) -> RespValue {
        let mut values = decode_all(input).unwrap();
        assert_eq!(values.len(), 1, "expected exactly one value");
        values.remove(0)
    }

    fn bulk(s: &str) -> RespValue {
        RespValue::bulk_string(Bytes::copy_from_slice(s.as_bytes()))
    }

    #[test]
    fn test_status_and_error() {
        assert_eq!(decode_one(b"+OK\r\n"), RespValue::status("OK"));
        assert_eq!(
            decode_one(b"-ERR unknown command\r\n"),
            RespValue::error("ERR unknown command")
        );
    }

    #[test]
    fn test_empty_status_line() {
        assert_eq!(decode_one(b"+\r\n"), RespValue::status(""));
        assert_eq!(decode_one(b"-\r\n"), RespValue::error(""));
    }

    #[test]
    fn test_status_splits_on_first_crlf() {
        let values = decode_all(b"+a\r\n+b\r\n").unwrap();
        assert_eq!(values, vec![RespValue::status("a"), RespValue::status("b")]);
    }

    #[test]
    fn test_stray_cr_or_lf_in_simple_string() {
        for input in [&b"+a\rb\r\n"[..], b"-x\ny\r\n", b"+a\r\r\n", b"+\n\r\n"] {
            assert_eq!(
                decode_all(input).unwrap_err(),
                DecodeError::Protocol(ProtocolError::StrayLineBreak),
                "input {:?}",
                String::from_utf8_lossy(input)
            );
        }
        // Bulk strings stay binary safe.
        assert_eq!(decode_one(b"$3\r\na\rb\r\n"), bulk("a\rb"));
    }

    #[test]
    fn test_overlong_numeric_field_rejected_before_crlf() {
        for type_byte in [b':', b'$', b'*'] {
            let mut decoder = RespDecoder::new();
            decoder.feed(&[type_byte]).unwrap();
            decoder.feed(&[b'9'; MAX_NUMERIC_LEN]).unwrap();
            assert_eq!(decoder.next_value().unwrap(), None);

            decoder.feed(b"9").unwrap();
            assert!(matches!(
                decoder.next_value().unwrap_err(),
                DecodeError::Protocol(ProtocolError::InvalidInteger(_))
            ));
        }
    }

    #[test]
    fn test_widest_integer_waits_for_lf() {
        let mut decoder = RespDecoder::new();
        decoder.feed(b":-9223372036854775808\r").unwrap();
        assert_eq!(decoder.next_value().unwrap(), None);
        decoder.feed(b"\n").unwrap();
        assert_eq!(decoder.next_value().unwrap(), Some(RespValue::integer(i64::MIN)));
    }

    #[test]
    fn test_unterminated_status_line_is_capped() {
        let mut decoder = RespDecoder::new();
        decoder.feed(b"+").unwrap();
        let chunk = [b'a'; 4096];
        for _ in 0..MAX_LINE_LEN / chunk.len() {
            decoder.feed(&chunk).unwrap();
            assert_eq!(decoder.next_value().unwrap(), None);
        }

        decoder.feed(b"a").unwrap();
        assert_eq!(
            decoder.next_value().unwrap_err(),
            DecodeError::Protocol(ProtocolError::LineTooLong { max: MAX_LINE_LEN })
        );
        assert_eq!(decoder.buffered(), MAX_LINE_LEN + 2);
    }

    #[test]
    fn test_line_length_limit_is_inclusive() {
        let mut line = b"-".to_vec();
        line.extend_from_slice(&[b'e'; MAX_LINE_LEN]);
        line.extend_from_slice(b"\r\n");
        assert_eq!(decode_one(&line), RespValue::error("e".repeat(MAX_LINE_LEN)));

        let mut line = b"+".to_vec();
        line.extend_from_slice(&[b'e'; MAX_LINE_LEN + 1]);
        line.extend_from_slice(b"\r\n");
        assert_eq!(
            decode_all(&line).unwrap_err(),
            DecodeError::Protocol(ProtocolError::LineTooLong { max: MAX_LINE_LEN })
        );
    }

    #[test]
    fn test_line_scan_resumes_across_feeds_and_compaction() {
        let mut decoder = RespDecoder::new();
        decoder.feed(b"+OK\r\n+par").unwrap();
        assert_eq!(decoder.next_value().unwrap(), Some(RespValue::ok()));
        assert_eq!(decoder.next_value().unwrap(), None);

        // Compaction shifts the partial line to offset 0.
        decoder.feed(b"tial\r").unwrap();
        assert_eq!(decoder.next_value().unwrap(), None);

        // The terminator is split across feeds.
        decoder.feed(b"\n:5\r\n").unwrap();
        assert_eq!(decoder.next_value().unwrap(), Some(RespValue::status("partial")));
        assert_eq!(decoder.next_value().unwrap(), Some(RespValue::integer(5)));
        assert!(decoder.is_empty());
    }

    #[test]
    fn test_integers() {
        assert_eq!(decode_one(b":1000\r\n"), RespValue::integer(1000));
        assert_eq!(decode_one(b":-42\r\n"), RespValue::integer(-42));
        assert_eq!(decode_one(b":0\r\n"), RespValue::integer(0));
        assert_eq!(
            decode_one(b":-9223372036854775808\r\n"),
            RespValue::integer(i64::MIN)
        );
        assert_eq!(
            decode_one(b":9223372036854775807\r\n"),
            RespValue::integer(i64::MAX)
        );
    }

    #[test]
    fn test_invalid_integers() {
        for input in [
            &b":\r\n"[..],
            b":-\r\n",
            b":+5\r\n",
            b":1 2\r\n",
            b":--1\r\n",
            b":12a\r\n",
            b":9223372036854775808\r\n",
        ] {
            let err = decode_all(input).unwrap_err();
            assert!(
                matches!(err, DecodeError::Protocol(ProtocolError::InvalidInteger(_))),
                "input {:?} gave {:?}",
                String::from_utf8_lossy(input),
                err
            );
        }
    }

    #[test]
    fn test_bulk_strings() {
        assert_eq!(decode_one(b"$5\r\nhello\r\n"), bulk("hello"));
        assert_eq!(decode_one(b"$0\r\n\r\n"), bulk(""));
        assert_eq!(
            decode_one(b"$7\r\na\r\nb\0c\r\r\n"),
            RespValue::bulk_string(Bytes::from_static(b"a\r\nb\0c\r"))
        );
    }

    #[test]
    fn test_nil_forms_collapse() {
        assert_eq!(decode_one(b"$-1\r\n"), RespValue::Nil);
        assert_eq!(decode_one(b"*-1\r\n"), RespValue::Nil);
    }

    #[test]
    fn test_null_bulk_consumes_only_length_line() {
        let values = decode_all(b"$-1\r\n:7\r\n").unwrap();
        assert_eq!(values, vec![RespValue::Nil, RespValue::integer(7)]);
    }

    #[test]
    fn test_invalid_lengths() {
        assert_eq!(
            decode_all(b"$-2\r\n").unwrap_err(),
            DecodeError::Protocol(ProtocolError::InvalidLength(-2))
        );
        assert_eq!(
            decode_all(b"*-5\r\n").unwrap_err(),
            DecodeError::Protocol(ProtocolError::InvalidLength(-5))
        );
        assert!(matches!(
            decode_all(b"$abc\r\n").unwrap_err(),
            DecodeError::Protocol(ProtocolError::InvalidInteger(_))
        ));
    }

    #[test]
    fn test_size_limits() {
        assert!(matches!(
            decode_all(b"$536870913\r\n").unwrap_err(),
            DecodeError::Protocol(ProtocolError::BulkTooLarge { .. })
        ));
        assert!(matches!(
            decode_all(b"*1048577\r\n").unwrap_err(),
            DecodeError::Protocol(ProtocolError::ArrayTooLarge { .. })
        ));
    }

    #[test]
    fn test_large_declared_array_is_incomplete_not_allocated() {
        let mut decoder = RespDecoder::new();
        decoder.feed(b"*1000000\r\n:1\r\n").unwrap();
        assert_eq!(decoder.next_value().unwrap(), None);
        assert_eq!(decoder.position(), 0);
    }

    #[test]
    fn test_bulk_missing_terminator() {
        assert_eq!(
            decode_all(b"$3\r\nabcXY").unwrap_err(),
            DecodeError::Protocol(ProtocolError::MissingTerminator)
        );
    }

    #[test]
    fn test_arrays() {
        assert_eq!(
            decode_one(b"*2\r\n$4\r\nECHO\r\n$5\r\nhello\r\n"),
            RespValue::array(vec![bulk("ECHO"), bulk("hello")])
        );
        assert_eq!(decode_one(b"*0\r\n"), RespValue::array(vec![]));
        assert_eq!(
            decode_one(b"*3\r\n:1\r\n*2\r\n+a\r\n$-1\r\n*-1\r\n"),
            RespValue::array(vec![
                RespValue::integer(1),
                RespValue::array(vec![RespValue::status("a"), RespValue::Nil]),
                RespValue::Nil,
            ])
        );
    }

    #[test]
    fn test_unknown_prefix() {
        assert_eq!(
            decode_all(b"&").unwrap_err(),
            DecodeError::Protocol(ProtocolError::UnknownPrefix(b'&'))
        );
        // Inline commands are not supported.
        assert!(decode_all(b"PING\r\n").unwrap_err().is_protocol());
    }

    #[test]
    fn test_protocol_error_is_sticky() {
        let mut decoder = RespDecoder::new();
        decoder.feed(b"+OK\r\n&junk").unwrap();
        assert_eq!(decoder.next_value().unwrap(), Some(RespValue::ok()));

        let first = decoder.next_value().unwrap_err();
        assert!(decoder.is_failed());
        decoder.feed(b"+OK\r\n").unwrap();
        assert_eq!(decoder.next_value().unwrap_err(), first);
    }

    #[test]
    fn test_error_inside_array_propagates() {
        let err = decode_all(b"*3\r\n:1\r\n:2\r\n:x\r\n").unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Protocol(ProtocolError::InvalidInteger(_))
        ));
    }

    #[test]
    fn test_incomplete_restores_cursor() {
        let mut decoder = RespDecoder::new();
        decoder.feed(b"+OK\r\n*2\r\n$4\r\nECHO\r\n$5\r\nhel").unwrap();

        assert_eq!(decoder.next_value().unwrap(), Some(RespValue::ok()));
        let pos = decoder.position();
        let buffered = decoder.buffered();

        assert_eq!(decoder.next_value().unwrap(), None);
        assert_eq!(decoder.position(), pos);
        assert_eq!(decoder.buffered(), buffered);

        decoder.feed(b"lo\r\n").unwrap();
        assert_eq!(
            decoder.next_value().unwrap(),
            Some(RespValue::array(vec![bulk("ECHO"), bulk("hello")]))
        );
        assert!(decoder.is_empty());
        assert_eq!(decoder.next_value().unwrap(), None);
    }

    #[test]
    fn test_bulk_with_length_but_no_payload_is_incomplete() {
        let mut decoder = RespDecoder::new();
        decoder.feed(b"$5\r\nhello\r").unwrap();
        assert_eq!(decoder.next_value().unwrap(), None);
        decoder.feed(b"\n").unwrap();
        assert_eq!(decoder.next_value().unwrap(), Some(bulk("hello")));
    }

    #[test]
    fn test_byte_at_a_time() {
        let input = b"*2\r\n$4\r\nECHO\r\n$5\r\nhello\r\n";
        let mut decoder = RespDecoder::new();
        for (i, byte) in input.iter().enumerate() {
            decoder.feed(std::slice::from_ref(byte)).unwrap();
            let value = decoder.next_value().unwrap();
            if i + 1 < input.len() {
                assert_eq!(value, None, "value produced early at byte {}", i);
            } else {
                assert_eq!(
                    value,
                    Some(RespValue::array(vec![bulk("ECHO"), bulk("hello")]))
                );
            }
        }
        assert!(decoder.is_empty());
    }

    #[test]
    fn test_pipelined_values_in_one_feed() {
        let values = decode_all(b"*1\r\n$4\r\nPING\r\n*1\r\n$4\r\nPING\r\n:3\r\n").unwrap();
        assert_eq!(values.len(), 3);
        assert_eq!(values[2], RespValue::integer(3));
    }

    #[test]
    fn test_nesting_depth_limit() {
        let mut ok = b"*1\r\n".repeat(MAX_NESTING_DEPTH);
        ok.extend_from_slice(b":1\r\n");
        assert!(decode_all(&ok).is_ok());

        let mut too_deep = b"*1\r\n".repeat(MAX_NESTING_DEPTH + 1);
        too_deep.extend_from_slice(b":1\r\n");
        assert_eq!(
            decode_all(&too_deep).unwrap_err(),
            DecodeError::Protocol(ProtocolError::NestingTooDeep {
                max: MAX_NESTING_DEPTH
            })
        );
    }

    #[test]
    fn test_buffer_doubles() {
        let mut decoder = RespDecoder::new();
        assert_eq!(decoder.capacity(), INITIAL_BUFFER_SIZE);

        decoder.feed(&[b'x'; 5000]).unwrap();
        assert_eq!(decoder.capacity(), INITIAL_BUFFER_SIZE * 2);

        decoder.feed(&[b'x'; 12000]).unwrap();
        assert_eq!(decoder.capacity(), INITIAL_BUFFER_SIZE * 8);
        assert_eq!(decoder.buffered(), 17000);
    }

    #[test]
    fn test_feed_compacts_consumed_bytes() {
        let mut decoder = RespDecoder::new();
        for _ in 0..10_000 {
            decoder.feed(b"+OK\r\n+PA").unwrap();
            assert_eq!(decoder.next_value().unwrap(), Some(RespValue::ok()));
            assert_eq!(decoder.next_value().unwrap(), None);
            decoder.feed(b"RTIAL\r\n").unwrap();
            assert_eq!(decoder.position(), 0);
            assert_eq!(
                decoder.next_value().unwrap(),
                Some(RespValue::status("PARTIAL"))
            );
        }
        assert_eq!(decoder.capacity(), INITIAL_BUFFER_SIZE);
    }

    #[test]
    fn test_zero_capacity_decoder_grows() {
        let mut decoder = RespDecoder::with_capacity(0);
        decoder.feed(b":12345\r\n").unwrap();
        assert_eq!(decoder.next_value().unwrap(), Some(RespValue::integer(12345)));
    }

    #[test]
    fn test_parse_message_reports_consumed() {
        let (value, consumed) = parse_message(b"$5\r\nhello\r\n+extra").unwrap().unwrap();
        assert_eq!(value, bulk("hello"));
        assert_eq!(consumed, 11);
        assert_eq!(parse_message(b"$5\r\nhel").unwrap(), None);
    }
}
