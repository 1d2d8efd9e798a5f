//! TCP Server
//!
//! Binds the listener and runs the accept loop. Every accepted connection is
//! driven by its own task; nothing but the dispatcher's registry and the
//! statistics counters is shared between tasks.
//!
//! ```text
//!        ┌──────────────────────── select! ───────────────────────┐
//!        │                                                        │
//!   shutdown ──> stop accepting, abort connection tasks           │
//!   accept() ──> spawn handle_connection into the JoinSet         │
//!   join_next() ──> reap a finished connection task               │
//!        └────────────────────────────────────────────────────────┘
//! ```
//!
//! Finished tasks are reaped from the same loop, so accepting never waits
//! for an earlier connection to end.

use crate::commands::Dispatcher;
use crate::config::ServerConfig;
use crate::connection::{handle_connection, ConnectionStats};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpSocket};
use tokio::task::JoinSet;
use tracing::{debug, error, info};

/// A bound, not yet running, server.
pub struct Server {
    listener: TcpListener,
    dispatcher: Dispatcher,
    stats: Arc<ConnectionStats>,
    read_buffer_size: usize,
}

impl Server {
    /// Binds a listener according to `config`.
    pub async fn bind(config: &ServerConfig) -> io::Result<Self> {
        let addr = tokio::net::lookup_host(config.bind_address())
            .await?
            .next()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("could not resolve {}", config.bind_address()),
                )
            })?;

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };
        socket.set_reuseaddr(true)?;
        socket.bind(addr)?;
        let listener = socket.listen(config.backlog)?;

        Ok(Self::from_listener(listener, config.read_buffer_size))
    }

    /// Wraps an already bound listener.
    pub fn from_listener(listener: TcpListener, read_buffer_size: usize) -> Self {
        Self {
            listener,
            dispatcher: Dispatcher::new(),
            stats: Arc::new(ConnectionStats::new()),
            read_buffer_size,
        }
    }

    /// Replaces the dispatcher, e.g. to serve extra commands.
    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Shared statistics for all connections of this server.
    pub fn stats(&self) -> Arc<ConnectionStats> {
        Arc::clone(&self.stats)
    }

    /// Accepts connections until `shutdown` completes.
    ///
    /// On shutdown the listener is closed and connection tasks still running
    /// are aborted.
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown signal received, stopping server...");
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        if let Err(e) = stream.set_nodelay(true) {
                            debug!(client = %addr, error = %e, "Failed to set TCP_NODELAY");
                        }
                        connections.spawn(handle_connection(
                            stream,
                            addr,
                            self.dispatcher.clone(),
                            Arc::clone(&self.stats),
                            self.read_buffer_size,
                        ));
                    }
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                    }
                },
                Some(finished) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(e) = finished {
                        if e.is_panic() {
                            error!(error = %e, "Connection task panicked");
                        }
                    }
                }
            }
        }

        let remaining = connections.len();
        if remaining > 0 {
            info!(connections = remaining, "Closing open connections");
        }
        connections.shutdown().await;
    }
}
