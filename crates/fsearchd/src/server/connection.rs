//! Connection handler for individual client connections.
//!
//! Each client connection gets its own `ConnectionHandler` that:
//! - Sends the greeting and usage hint
//! - Parses `<depth> <mask>` request lines
//! - Queues a `SearchTask` per valid request
//! - Replies with a single error line for malformed requests
//!
//! Match lines are not written here: the search worker writes them through
//! the same `OutputSink` the handler hands over with each task.
//!
//! # Panic-Free Guarantees
//!
//! This module follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations use `?`, pattern matching, or `unwrap_or`
//! - Connection errors are logged and result in graceful disconnect

use std::net::SocketAddr;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use fsearch_protocol::{parse_request, ServerMessage};

use crate::queue::{QueueError, SearchTask, TaskQueue};
use crate::sink::{OutputSink, SinkError};

/// Maximum request line size (64 KiB)
pub const MAX_LINE_SIZE: usize = 64 * 1024;

/// What a connection did over its lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Valid requests handed to the queue
    pub queued: u64,
    /// Malformed requests answered with an error line
    pub rejected: u64,
}

/// Connection handler for a single client.
pub struct ConnectionHandler<R> {
    /// Buffered reader for incoming request lines
    reader: BufReader<R>,

    /// Output shared with the search worker
    sink: OutputSink,

    /// Queue feeding the search worker
    queue: TaskQueue,

    /// Cancellation token for graceful shutdown
    cancel_token: CancellationToken,

    /// Remote address, for logs
    peer: Option<SocketAddr>,

    summary: SessionSummary,
}

impl<R> ConnectionHandler<R>
where
    R: AsyncRead + Unpin,
{
    /// Creates a new connection handler.
    ///
    /// # Arguments
    ///
    /// * `reader` - Read half of the client stream
    /// * `sink` - Output handle for the write half
    /// * `queue` - Queue feeding the search worker
    /// * `cancel_token` - Token for graceful shutdown
    pub fn new(
        reader: R,
        sink: OutputSink,
        queue: TaskQueue,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            reader: BufReader::new(reader),
            sink,
            queue,
            cancel_token,
            peer: None,
            summary: SessionSummary::default(),
        }
    }

    /// Records the remote address for logging.
    pub fn with_peer(mut self, peer: SocketAddr) -> Self {
        self.peer = Some(peer);
        self
    }

    fn connection(&self) -> u64 {
        self.sink.connection()
    }

    /// Runs the connection handler.
    ///
    /// Sends the greeting, then processes request lines until the client
    /// disconnects, a fatal connection error occurs, or shutdown is
    /// requested.
    pub async fn run(mut self) -> SessionSummary {
        debug!(connection = self.connection(), peer = ?self.peer, "New client connected");

        if let Err(e) = self.greet().await {
            warn!(
                connection = self.connection(),
                error = %e,
                "Failed to send greeting"
            );
            self.release().await;
            return self.summary;
        }

        if let Err(e) = self.process_lines().await {
            debug!(
                connection = self.connection(),
                error = %e,
                "Connection closed"
            );
        }
        self.release().await;

        info!(
            connection = self.connection(),
            queued = self.summary.queued,
            rejected = self.summary.rejected,
            "Client disconnected"
        );
        self.summary
    }

    async fn greet(&self) -> Result<(), ConnectionError> {
        self.sink.send(&ServerMessage::Greeting).await?;
        self.sink.send(&ServerMessage::UsageHint).await?;
        Ok(())
    }

    /// Stops all writes to this connection, including those of queued tasks.
    async fn release(&self) {
        self.sink.mark_closed();
        if let Err(e) = self.sink.close().await {
            debug!(connection = self.connection(), error = %e, "Shutdown of write side failed");
        }
    }

    /// Main request loop.
    async fn process_lines(&mut self) -> Result<(), ConnectionError> {
        let cancel_token = self.cancel_token.clone();
        let connection = self.connection();

        loop {
            let read = tokio::select! {
                _ = cancel_token.cancelled() => {
                    debug!(connection, "Shutdown requested");
                    return Ok(());
                }

                read = self.read_line() => read,
            };

            let line = match read {
                Ok(line) => line,
                Err(ConnectionError::Eof) => {
                    debug!(connection, "Client sent EOF");
                    return Ok(());
                }
                Err(e) => return Err(e),
            };

            self.handle_line(&line).await?;
        }
    }

    /// Turns one request line into a queued task or an error reply.
    async fn handle_line(&mut self, line: &str) -> Result<(), ConnectionError> {
        match parse_request(line) {
            Ok(request) => {
                debug!(
                    connection = self.connection(),
                    request = %request,
                    "Queueing search"
                );
                self.queue
                    .put(SearchTask::new(request, self.sink.clone()))?;
                self.summary.queued += 1;
            }
            Err(e) => {
                debug!(
                    connection = self.connection(),
                    error = %e,
                    "Rejected request"
                );
                self.summary.rejected += 1;
                self.sink.send(&e.reply()).await?;
            }
        }

        Ok(())
    }

    /// Reads a single line, decoding invalid UTF-8 lossily.
    async fn read_line(&mut self) -> Result<String, ConnectionError> {
        let mut buf = Vec::new();
        let limit = (MAX_LINE_SIZE + 1) as u64;

        let bytes_read = (&mut self.reader)
            .take(limit)
            .read_until(b'\n', &mut buf)
            .await
            .map_err(|e| ConnectionError::Io(e.to_string()))?;

        if bytes_read == 0 {
            return Err(ConnectionError::Eof);
        }

        if buf.len() > MAX_LINE_SIZE {
            return Err(ConnectionError::LineTooLarge {
                max: MAX_LINE_SIZE,
            });
        }

        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Errors that end a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Connection closed")]
    Eof,

    #[error("Request line too large (max: {max} bytes)")]
    LineTooLarge { max: usize },

    #[error("Write failed: {0}")]
    Sink(#[from] SinkError),

    #[error("Cannot queue search: {0}")]
    Queue(#[from] QueueError),
}
