//! TCP server for the search daemon.
//!
//! The server:
//! - Listens on a TCP socket for client connections
//! - Spawns a ConnectionHandler for each client
//! - Hands every handler a clone of the shared task queue
//! - Supports graceful shutdown via CancellationToken
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  SearchServer   │
//! │                 │
//! │  TcpListener    │
//! └───────┬─────────┘
//!         │ accept()
//!         ▼
//! ┌─────────────────┐     ┌─────────────────┐
//! │ConnectionHandler│────▶│   TaskQueue     │
//! │   (per client)  │     │                 │
//! └─────────────────┘     └─────────────────┘
//! ```
//!
//! # Panic-Free Guarantees
//!
//! This module follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations use `?`, pattern matching, or `unwrap_or`
//! - Accept errors are logged and allow continued operation

mod connection;

pub use connection::{ConnectionError, ConnectionHandler, SessionSummary, MAX_LINE_SIZE};

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::queue::TaskQueue;
use crate::sink::OutputSink;

/// Pause after a failed accept (e.g. out of file descriptors)
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// TCP acceptor for search clients.
pub struct SearchServer {
    /// Bound listening socket
    listener: TcpListener,

    /// Queue handed to every connection
    queue: TaskQueue,

    /// Cancellation token for graceful shutdown
    cancel_token: CancellationToken,

    /// Connection counter for numbering clients
    connection_counter: AtomicU64,
}

impl SearchServer {
    /// Binds the listening socket.
    ///
    /// # Arguments
    ///
    /// * `addr` - Address to listen on (port 0 picks a free port)
    /// * `queue` - Queue feeding the search worker
    /// * `cancel_token` - Token for graceful shutdown
    ///
    /// # Errors
    ///
    /// - `ServerError::Bind` if the socket cannot be bound
    pub async fn bind(
        addr: SocketAddr,
        queue: TaskQueue,
        cancel_token: CancellationToken,
    ) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr,
                error: e.to_string(),
            })?;

        Ok(Self {
            listener,
            queue,
            cancel_token,
            connection_counter: AtomicU64::new(0),
        })
    }

    /// Returns the address actually bound.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.listener
            .local_addr()
            .map_err(|e| ServerError::Io(e.to_string()))
    }

    /// Runs the accept loop.
    ///
    /// Accepts connections until the cancellation token is triggered.
    /// This method does not return until shutdown.
    pub async fn run(&self) -> Result<(), ServerError> {
        info!(addr = %self.local_addr()?, "Search server listening");

        loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    info!("Server shutdown requested");
                    break;
                }

                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            let conn_num = self.connection_counter.fetch_add(1, Ordering::Relaxed);
                            self.handle_connection(stream, peer, conn_num);
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept connection");
                            tokio::time::sleep(ACCEPT_BACKOFF).await;
                        }
                    }
                }
            }
        }

        info!(
            connections = self.connection_counter.load(Ordering::Relaxed),
            "Server stopped"
        );
        Ok(())
    }

    /// Handles a new client connection by spawning a handler task.
    fn handle_connection(&self, stream: TcpStream, peer: SocketAddr, connection_number: u64) {
        if let Err(e) = stream.set_nodelay(true) {
            debug!(peer = %peer, error = %e, "Failed to set TCP_NODELAY");
        }

        let (reader, writer) = stream.into_split();
        let sink = OutputSink::new(writer, connection_number);
        let handler = ConnectionHandler::new(
            reader,
            sink,
            self.queue.clone(),
            self.cancel_token.clone(),
        )
        .with_peer(peer);

        tokio::spawn(async move {
            let summary = handler.run().await;
            debug!(
                connection = connection_number,
                queued = summary.queued,
                "Connection handler finished"
            );
        });
    }
}

/// Errors that can occur in server operations.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {error}")]
    Bind { addr: SocketAddr, error: String },

    #[error("Socket error: {0}")]
    Io(String),

    #[error("Search worker failed: {0}")]
    Worker(String),
}
