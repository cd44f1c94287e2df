//! A single framed connection: stream halves, frame buffer, and identity.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::net::TcpStream;

use crate::{ConnectionId, FrameReader, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// An open bidirectional byte stream plus its peer address.
///
/// A `Connection` is owned by exactly one task at a time. It moves from
/// the pre-match handler into the pairing queue, and from there into a
/// room, together with any bytes already buffered by its [`FrameReader`].
pub struct Connection<S = TcpStream> {
    id: ConnectionId,
    peer_addr: SocketAddr,
    reader: FrameReader<ReadHalf<S>>,
    writer: WriteHalf<S>,
    closed: bool,
}

impl<S> Connection<S> {
    /// Returns the unique identifier for this connection.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns the remote address, for diagnostics.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite,
{
    /// Wraps a stream, assigning it a fresh [`ConnectionId`].
    pub fn new(stream: S, peer_addr: SocketAddr) -> Self {
        let id = ConnectionId::new(
            NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
        );
        let (read_half, writer) = tokio::io::split(stream);
        Self {
            id,
            peer_addr,
            reader: FrameReader::new(read_half),
            writer,
            closed: false,
        }
    }

    /// Receives the next frame (newline stripped).
    ///
    /// Returns `Ok(None)` when the peer closed the stream. Cancel-safe.
    pub async fn recv(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        self.reader
            .next_frame()
            .await
            .map_err(TransportError::ReceiveFailed)
    }

    /// Sends one frame, appending the terminating newline.
    ///
    /// Frame and newline go out in a single write so frames from the same
    /// sender never interleave.
    pub async fn send(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::ConnectionClosed(self.id.to_string()));
        }
        let mut line = Vec::with_capacity(frame.len() + 1);
        line.extend_from_slice(frame);
        line.push(b'\n');
        self.writer
            .write_all(&line)
            .await
            .map_err(TransportError::SendFailed)?;
        self.writer.flush().await.map_err(TransportError::SendFailed)
    }

    /// Shuts down the write side so the peer observes end-of-stream.
    ///
    /// Calling `close` more than once is a no-op.
    pub async fn close(&mut self) -> Result<(), TransportError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.writer
            .shutdown()
            .await
            .map_err(TransportError::SendFailed)
    }
}

impl<S> std::fmt::Debug for Connection<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("peer_addr", &self.peer_addr)
            .field("closed", &self.closed)
            .finish()
    }
}
