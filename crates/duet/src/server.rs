//! `DuetServer` builder and server loop.
//!
//! This is the entry point for running a Duet server. It ties together
//! all the layers: transport → pre-match handler → lobby → room.

use duet_lobby::{Matchmaker, PairingQueue, pairing_queue};
use std::time::Duration;

use duet_transport::{TcpTransport, Transport};
use tokio::net::TcpStream;

use crate::DuetError;
use crate::handler::handle_connection;

/// Builder for configuring and starting a Duet server.
///
/// # Example
///
/// ```rust,ignore
/// let server = DuetServer::builder()
///     .bind("0.0.0.0:9000")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct DuetServerBuilder {
    bind_addr: String,
}

impl DuetServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:9000".to_string(),
        }
    }

    /// Sets the address (`"host:port"`) to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Binds the listener and creates this server's pairing queue.
    ///
    /// Nothing is accepted until [`DuetServer::run`] is called.
    pub async fn build(self) -> Result<DuetServer, DuetError> {
        let transport = TcpTransport::bind(&self.bind_addr).await?;
        let (queue, matchmaker) = pairing_queue();
        Ok(DuetServer {
            transport,
            queue,
            matchmaker,
        })
    }
}

impl Default for DuetServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Duet server.
///
/// Each server owns its own pairing queue; two servers in one process
/// never pair each other's clients.
pub struct DuetServer {
    transport: TcpTransport,
    queue: PairingQueue<TcpStream>,
    matchmaker: Matchmaker<TcpStream>,
}

impl DuetServer {
    /// Creates a new builder.
    pub fn builder() -> DuetServerBuilder {
        DuetServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Returns a handle to this server's pairing queue, e.g. to watch how
    /// many clients are waiting.
    pub fn queue(&self) -> PairingQueue<TcpStream> {
        self.queue.clone()
    }

    /// Runs the server.
    ///
    /// Starts the matchmaker, then accepts connections forever, spawning a
    /// pre-match handler task for each. A failed accept or a failed
    /// connection is logged and never stops the loop.
    pub async fn run(mut self) -> Result<(), DuetError> {
        tokio::spawn(self.matchmaker.run());
        tracing::info!(addr = ?self.transport.local_addr().ok(), "Duet server running");

        accept_loop(&mut self.transport, &self.queue).await;
        Ok(())
    }
}

/// How long to wait after a failed accept before trying again.
///
/// Persistent failures (e.g. out of file descriptors) would otherwise spin
/// the loop and flood the log.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Accepts connections forever, spawning a pre-match handler for each.
async fn accept_loop<T: Transport>(transport: &mut T, queue: &PairingQueue<T::Stream>) {
    loop {
        match transport.accept().await {
            Ok(conn) => {
                tracing::info!(conn_id = %conn.id(), peer = %conn.peer_addr(), "new connection");
                let queue = queue.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(conn, queue).await {
                        tracing::debug!(error = %e, "connection ended with error");
                    }
                });
            }
            Err(e) => {
                tracing::error!(error = %e, "accept failed");
                tokio::time::sleep(ACCEPT_BACKOFF).await;
            }
        }
    }
}
