//! Connection Handler Module
//!
//! This module handles individual client connections. Each client gets its
//! own handler task that runs in a loop, reading requests and sending
//! replies.
//!
//! ## Connection Lifecycle
//!
//! ```text
//! 1. Client connects (TCP handshake)
//!        │
//!        ▼
//! 2. ConnectionHandler spawned
//!        │
//!        ▼
//! 3. ┌──────────────────────────────┐
//!    │      Main Loop               │
//!    │                              │
//!    │  ┌─────────────────────────┐ │
//!    │  │ Read bytes from socket  │ │
//!    │  └───────────┬─────────────┘ │
//!    │              │               │
//!    │              ▼               │
//!    │  ┌─────────────────────────┐ │
//!    │  │ Feed decoder            │ │
//!    │  └───────────┬─────────────┘ │
//!    │              │               │
//!    │              ▼               │
//!    │  ┌─────────────────────────┐ │
//!    │  │ Drain + dispatch each   │ │
//!    │  └───────────┬─────────────┘ │
//!    │              │               │
//!    │              ▼               │
//!    │  ┌─────────────────────────┐ │
//!    │  │ Write + flush replies   │ │
//!    │  └───────────┬─────────────┘ │
//!    │              │               │
//!    │              ▼               │
//!    │         [Loop back]          │
//!    └──────────────────────────────┘
//!        │
//!        ▼
//! 4. EOF / read error / protocol error
//!        │
//!        ▼
//! 5. Handler task ends
//! ```
//!
//! A protocol error is answered with one `-ERR Protocol error: ...` frame and
//! then closes the connection. Command errors (unknown command, arity) are
//! ordinary replies and the connection continues.

use crate::commands::Dispatcher;
use crate::protocol::{encoder, DecodeError, RespDecoder};
use bytes::BytesMut;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{debug, info, trace, warn};

/// Default size of a single socket read
pub const DEFAULT_READ_BUFFER_SIZE: usize = 8192;

/// Initial capacity of the outgoing reply buffer
const INITIAL_REPLY_CAPACITY: usize = 1024;

/// Statistics for connection handling
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Total number of connections accepted
    pub connections_accepted: AtomicU64,
    /// Currently active connections
    pub active_connections: AtomicU64,
    /// Total commands processed
    pub commands_processed: AtomicU64,
    /// Connections closed because of a protocol error
    pub protocol_errors: AtomicU64,
    /// Total bytes read
    pub bytes_read: AtomicU64,
    /// Total bytes written
    pub bytes_written: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn command_processed(&self) {
        self.commands_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn protocol_error(&self) {
        self.protocol_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes_read(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn bytes_written(&self, count: usize) {
        self.bytes_written
            .fetch_add(count as u64, Ordering::Relaxed);
    }
}

/// Handles a single client connection.
///
/// Generic over the stream so the same loop serves TCP sockets and
/// in-memory test streams.
pub struct ConnectionHandler<S> {
    /// The client stream
    stream: BufWriter<S>,

    /// Client's address (for logging)
    addr: SocketAddr,

    /// Incremental decoder for this connection only
    decoder: RespDecoder,

    /// Scratch space for one socket read
    read_buf: Vec<u8>,

    /// Replies produced since the last flush
    replies: BytesMut,

    dispatcher: Dispatcher,

    /// Connection statistics (shared)
    stats: Arc<ConnectionStats>,
}

impl<S> ConnectionHandler<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new connection handler.
    ///
    /// # Arguments
    ///
    /// * `stream` - The client stream
    /// * `addr` - The client's socket address
    /// * `dispatcher` - Executes decoded commands
    /// * `stats` - Shared connection statistics
    pub fn new(
        stream: S,
        addr: SocketAddr,
        dispatcher: Dispatcher,
        stats: Arc<ConnectionStats>,
    ) -> Self {
        stats.connection_opened();

        Self {
            stream: BufWriter::new(stream),
            addr,
            decoder: RespDecoder::new(),
            read_buf: vec![0; DEFAULT_READ_BUFFER_SIZE],
            replies: BytesMut::with_capacity(INITIAL_REPLY_CAPACITY),
            dispatcher,
            stats,
        }
    }

    /// Sets how many bytes a single socket read may return.
    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buf = vec![0; size.max(1)];
        self
    }

    /// Runs the main connection loop.
    ///
    /// Returns when the client disconnects or an error occurs.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        info!(client = %self.addr, "Client connected");

        let result = self.main_loop().await;

        match &result {
            Ok(()) => info!(client = %self.addr, "Client disconnected"),
            Err(ConnectionError::Io(io_err))
                if io_err.kind() == std::io::ErrorKind::ConnectionReset =>
            {
                debug!(client = %self.addr, "Connection reset by client")
            }
            Err(e) => warn!(client = %self.addr, error = %e, "Connection error"),
        }

        result
    }

    /// The read-decode-dispatch-respond loop.
    async fn main_loop(&mut self) -> Result<(), ConnectionError> {
        loop {
            let n = self.stream.get_mut().read(&mut self.read_buf).await?;
            if n == 0 {
                if !self.decoder.is_empty() {
                    debug!(
                        client = %self.addr,
                        buffered = self.decoder.buffered(),
                        "Client closed with a partial request buffered"
                    );
                }
                return Ok(());
            }

            self.stats.bytes_read(n);
            trace!(client = %self.addr, bytes = n, "Read data");

            self.decoder.feed(&self.read_buf[..n])?;

            // Replies for everything decoded so far go out before any error
            // ends the connection.
            let drained = self.drain_requests();
            self.send_replies().await?;
            drained?;
        }
    }

    /// Decodes and dispatches every complete request currently buffered.
    fn drain_requests(&mut self) -> Result<(), DecodeError> {
        loop {
            match self.decoder.next_value() {
                Ok(Some(command)) => {
                    self.dispatcher.dispatch(&command, &mut self.replies);
                    self.stats.command_processed();
                }
                Ok(None) => {
                    trace!(
                        client = %self.addr,
                        buffered = self.decoder.buffered(),
                        "Waiting for more data"
                    );
                    return Ok(());
                }
                Err(err) => {
                    if let DecodeError::Protocol(protocol_err) = &err {
                        self.stats.protocol_error();
                        encoder::write_error(
                            &mut self.replies,
                            &format!("Protocol error: {}", protocol_err),
                        );
                    }
                    return Err(err);
                }
            }
        }
    }

    /// Writes and flushes all pending replies.
    async fn send_replies(&mut self) -> Result<(), ConnectionError> {
        if self.replies.is_empty() {
            return Ok(());
        }

        self.stream.write_all(&self.replies).await?;
        self.stream.flush().await?;
        self.stats.bytes_written(self.replies.len());
        trace!(
            client = %self.addr,
            bytes = self.replies.len(),
            "Sent replies"
        );
        self.replies.clear();
        Ok(())
    }
}

// Runs on normal return and when the task is aborted mid-await.
impl<S> Drop for ConnectionHandler<S> {
    fn drop(&mut self) {
        self.stats.connection_closed();
    }
}

/// Errors that end a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// I/O error (network issue)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The request stream could not be decoded
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}

/// Handles a client connection.
///
/// This is a convenience function that creates a ConnectionHandler
/// and runs it to completion. Errors are already logged by the handler.
pub async fn handle_connection<S>(
    stream: S,
    addr: SocketAddr,
    dispatcher: Dispatcher,
    stats: Arc<ConnectionStats>,
    read_buffer_size: usize,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let handler = ConnectionHandler::new(stream, addr, dispatcher, stats)
        .with_read_buffer_size(read_buffer_size);
    if let Err(e) = handler.run().await {
        trace!(client = %addr, error = %e, "Connection ended with error");
    }
}
