//! Transport layer for Duet.
//!
//! Provides the [`Transport`] trait, its TCP implementation
//! ([`TcpTransport`]), and [`Connection`]: one accepted byte stream with
//! newline framing on top.
//!
//! A connection is generic over its stream so the layers above can be
//! driven with in-memory pipes (`tokio::io::duplex`) in tests.

#![allow(async_fn_in_trait)]

mod connection;
mod error;
mod framing;
mod tcp;

pub use connection::Connection;
pub use error::TransportError;
pub use framing::{FrameReader, MAX_FRAME_LEN};
pub use tcp::TcpTransport;

use std::fmt;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The byte stream carried by each accepted connection.
    type Stream: tokio::io::AsyncRead + tokio::io::AsyncWrite + Send + 'static;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Connection<Self::Stream>, Self::Error>;

    /// Returns the address the transport is listening on.
    fn local_addr(&self) -> std::io::Result<std::net::SocketAddr>;
}
