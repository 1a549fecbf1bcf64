//! Per-connection output handle.
//!
//! A connection's write side is written by two parties: its
//! `ConnectionHandler` (error replies, greeting) and the `SearchWorker`
//! (match lines for that connection's tasks). `OutputSink` is the shared,
//! cloneable handle both use. Every line is written and flushed under the
//! sink's mutex, so lines never interleave mid-line.
//!
//! Once the handler marks the sink closed, every clone refuses further
//! writes, so tasks still queued for that connection are abandoned.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;
use tokio::time::timeout;

use fsearch_protocol::ServerMessage;

/// Write timeout (10 seconds)
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Shared writer for one client connection.
#[derive(Clone)]
pub struct OutputSink {
    writer: Arc<Mutex<BufWriter<BoxedWriter>>>,
    closed: Arc<AtomicBool>,
    connection: u64,
}

impl OutputSink {
    /// Wraps the write half of a connection.
    ///
    /// # Arguments
    ///
    /// * `writer` - Write side of the client stream
    /// * `connection` - Connection number used in logs
    pub fn new<W>(writer: W, connection: u64) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let boxed: BoxedWriter = Box::new(writer);
        Self {
            writer: Arc::new(Mutex::new(BufWriter::new(boxed))),
            closed: Arc::new(AtomicBool::new(false)),
            connection,
        }
    }

    /// Connection number this sink writes to.
    pub fn connection(&self) -> u64 {
        self.connection
    }

    /// Refuses all later writes through this sink and its clones.
    pub fn mark_closed(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Sends one protocol line.
    pub async fn send(&self, msg: &ServerMessage) -> Result<(), SinkError> {
        self.write_line(&msg.to_string()).await
    }

    /// Writes `line` followed by `\n` and flushes immediately.
    pub async fn write_line(&self, line: &str) -> Result<(), SinkError> {
        let mut writer = self.writer.lock().await;
        if self.is_closed() {
            return Err(SinkError::Closed);
        }

        match timeout(WRITE_TIMEOUT, async {
            writer.write_all(line.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
            Ok::<(), std::io::Error>(())
        })
        .await
        {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(SinkError::Io(e.to_string())),
            Err(_) => Err(SinkError::WriteTimeout),
        }
    }

    /// Shuts down the write side so the peer sees end of stream.
    pub async fn close(&self) -> Result<(), SinkError> {
        let mut writer = self.writer.lock().await;
        match timeout(WRITE_TIMEOUT, writer.shutdown()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(SinkError::Io(e.to_string())),
            Err(_) => Err(SinkError::WriteTimeout),
        }
    }
}

impl fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputSink")
            .field("connection", &self.connection)
            .finish_non_exhaustive()
    }
}

/// Errors writing to a client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Write timeout")]
    WriteTimeout,

    #[error("Connection closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, BufReader};

    #[tokio::test]
    async fn test_lines_are_newline_terminated() {
        let (client, server) = tokio::io::duplex(1024);
        let sink = OutputSink::new(server, 7);

        sink.send(&ServerMessage::Greeting).await.unwrap();
        sink.write_line("/tmp/x.txt").await.unwrap();

        let mut lines = BufReader::new(client).lines();
        assert_eq!(
            lines.next_line().await.unwrap().as_deref(),
            Some("Connected to the File Search Server.")
        );
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("/tmp/x.txt"));
        assert_eq!(sink.connection(), 7);
    }

    #[tokio::test]
    async fn test_clones_share_one_writer() {
        let (client, server) = tokio::io::duplex(1024);
        let sink = OutputSink::new(server, 1);
        let other = sink.clone();

        sink.write_line("first").await.unwrap();
        other.write_line("second").await.unwrap();
        sink.close().await.unwrap();

        let mut lines = BufReader::new(client).lines();
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("first"));
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("second"));
        assert_eq!(lines.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_to_dropped_peer_fails() {
        let (client, server) = tokio::io::duplex(64);
        drop(client);
        let sink = OutputSink::new(server, 2);

        let err = sink.write_line("nobody listening").await.unwrap_err();
        assert!(matches!(err, SinkError::Io(_)));
    }

    #[tokio::test]
    async fn test_marked_closed_refuses_writes_on_every_clone() {
        let (client, server) = tokio::io::duplex(1024);
        let sink = OutputSink::new(server, 3);
        let queued = sink.clone();

        sink.write_line("before").await.unwrap();
        sink.mark_closed();
        assert!(queued.is_closed());
        assert_eq!(queued.write_line("after").await, Err(SinkError::Closed));
        sink.close().await.unwrap();

        let mut lines = BufReader::new(client).lines();
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("before"));
        assert_eq!(lines.next_line().await.unwrap(), None);
    }

    #[test]
    fn test_sink_error_display() {
        assert_eq!(SinkError::WriteTimeout.to_string(), "Write timeout");
        assert!(SinkError::Io("broken pipe".into())
            .to_string()
            .contains("broken pipe"));
    }
}
