//! Connection Handler Module
//!
//! This module handles individual client sessions. Each client gets its own
//! handler task that runs in a loop, reading command lines and writing a
//! reply followed by a prompt.
//!
//! ## Session Lifecycle
//!
//! ```text
//! 1. Client connects, handler writes the prompt  "127.0.0.1:8000[0] "
//!        │
//!        ▼
//! 2. ┌──────────────────────────────┐
//!    │      Main Loop               │
//!    │                              │
//!    │  read bytes -> frame a line  │
//!    │  execute    -> reply         │
//!    │  write "reply\n" + prompt    │
//!    │         [Loop back]          │
//!    └──────────────────────────────┘
//!        │
//!        ▼
//! 3. Client disconnects / error, handler task ends
//! ```
//!
//! ## Buffer Management
//!
//! Incoming data accumulates in a `BytesMut` buffer. A single read may carry
//! part of a line or several lines, so lines are framed out of the buffer
//! until none is complete, then more data is read.

use crate::commands::CommandHandler;
use crate::protocol::{LineParser, ParseError, Reply};
use bytes::BytesMut;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{debug, info, trace, warn};

/// Initial buffer capacity
const INITIAL_BUFFER_SIZE: usize = 4096;

/// Statistics for connection handling
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Total number of connections accepted
    pub connections_accepted: AtomicU64,
    /// Currently active connections
    pub active_connections: AtomicU64,
    /// Total commands processed
    pub commands_processed: AtomicU64,
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

    pub fn bytes_read(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn bytes_written(&self, count: usize) {
        self.bytes_written
            .fetch_add(count as u64, Ordering::Relaxed);
    }
}

/// Handles a single client session over any byte stream.
pub struct ConnectionHandler<S> {
    stream: BufWriter<S>,

    /// Client's address (for logging)
    peer: SocketAddr,

    /// Server address shown in the prompt
    server_addr: String,

    /// Buffer for incoming data
    buffer: BytesMut,

    /// The command handler (owns this session's selected database)
    command_handler: CommandHandler,

    parser: LineParser,

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
    /// * `peer` - The client's socket address
    /// * `server_addr` - The address printed in the prompt
    /// * `command_handler` - The command handler for this session
    /// * `stats` - Shared connection statistics
    pub fn new(
        stream: S,
        peer: SocketAddr,
        server_addr: impl Into<String>,
        command_handler: CommandHandler,
        stats: Arc<ConnectionStats>,
    ) -> Self {
        stats.connection_opened();

        Self {
            stream: BufWriter::new(stream),
            peer,
            server_addr: server_addr.into(),
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            command_handler,
            parser: LineParser::new(),
            stats,
        }
    }

    /// The prompt for the currently selected database.
    fn prompt(&self) -> String {
        format!("{}[{}] ", self.server_addr, self.command_handler.db_id())
    }

    /// Runs the session until the client disconnects or an error occurs.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        info!(client = %self.peer, "Client connected");

        let result = self.main_loop().await;

        match &result {
            Ok(()) => info!(client = %self.peer, "Client disconnected gracefully"),
            Err(ConnectionError::ClientDisconnected) => {
                debug!(client = %self.peer, "Client disconnected")
            }
            Err(ConnectionError::IoError(io_err))
                if io_err.kind() == std::io::ErrorKind::ConnectionReset =>
            {
                debug!(client = %self.peer, "Connection reset by client")
            }
            Err(e) => warn!(client = %self.peer, error = %e, "Connection error"),
        }

        self.stats.connection_closed();
        result
    }

    /// The main read-execute-respond loop.
    async fn main_loop(&mut self) -> Result<(), ConnectionError> {
        let prompt = self.prompt();
        self.send(&prompt).await?;

        loop {
            while let Some(line) = self.try_parse_line()? {
                self.respond(&line).await?;
            }

            if self.read_more_data().await? == 0 {
                // Peer closed; a final line without `\n` still runs
                let tail = self.parser.parse_remainder(&self.buffer)?;
                self.buffer.clear();
                if let Some(line) = tail {
                    self.respond(&line).await?;
                }
                return Err(ConnectionError::ClientDisconnected);
            }
        }
    }

    /// Executes one line and writes its reply followed by the prompt.
    async fn respond(&mut self, line: &str) -> Result<(), ConnectionError> {
        let mut out = match self.handle_line(line) {
            Some(Reply::Silent) | None => String::new(),
            Some(reply) => format!("{}\n", reply),
        };
        out.push_str(&self.prompt());
        self.send(&out).await
    }

    /// Executes one line. Blank lines produce no reply.
    fn handle_line(&mut self, line: &str) -> Option<Reply> {
        if line.trim().is_empty() {
            return None;
        }
        let reply = self.command_handler.execute(line);
        self.stats.command_processed();
        Some(reply)
    }

    /// Attempts to frame a line from the buffer.
    fn try_parse_line(&mut self) -> Result<Option<String>, ConnectionError> {
        if self.buffer.is_empty() {
            return Ok(None);
        }

        match self.parser.parse(&self.buffer) {
            Ok(Some((line, consumed))) => {
                let _ = self.buffer.split_to(consumed);
                trace!(
                    client = %self.peer,
                    consumed = consumed,
                    remaining = self.buffer.len(),
                    "Parsed line"
                );
                Ok(Some(line))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                warn!(client = %self.peer, error = %e, "Parse error");
                Err(ConnectionError::ParseError(e))
            }
        }
    }

    /// Reads more data from the stream into the buffer.
    ///
    /// Returns the number of bytes read; `0` means the client closed.
    async fn read_more_data(&mut self) -> Result<usize, ConnectionError> {
        if self.buffer.capacity() - self.buffer.len() < 1024 {
            self.buffer.reserve(INITIAL_BUFFER_SIZE);
        }

        let n = self.stream.get_mut().read_buf(&mut self.buffer).await?;

        if n > 0 {
            self.stats.bytes_read(n);
            trace!(client = %self.peer, bytes = n, "Read data");
        }

        Ok(n)
    }

    /// Writes and flushes text to the client.
    async fn send(&mut self, text: &str) -> Result<(), ConnectionError> {
        self.stream.write_all(text.as_bytes()).await?;
        self.stream.flush().await?;
        self.stats.bytes_written(text.len());
        Ok(())
    }
}

/// Errors that can occur while handling a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// I/O error (network issue)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Line framing error (line too long)
    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),

    /// Client disconnected normally
    #[error("Client disconnected")]
    ClientDisconnected,
}

/// Handles a client session.
///
/// This is a convenience function that creates a ConnectionHandler
/// and runs it to completion.
pub async fn handle_connection<S>(
    stream: S,
    peer: SocketAddr,
    server_addr: String,
    command_handler: CommandHandler,
    stats: Arc<ConnectionStats>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let handler = ConnectionHandler::new(stream, peer, server_addr, command_handler, stats);
    let _ = handler.run().await;
}
