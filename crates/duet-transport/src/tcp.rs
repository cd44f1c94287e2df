//! TCP transport: a listener with address reuse, accepting no-delay sockets.

use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpSocket, TcpStream};

use crate::{Connection, Transport, TransportError};

/// Pending-connection backlog handed to `listen(2)`.
const LISTEN_BACKLOG: u32 = 1024;

/// A TCP [`Transport`] that listens for incoming connections.
pub struct TcpTransport {
    listener: TcpListener,
}

impl TcpTransport {
    /// Binds a new TCP transport to `addr` (`"host:port"`).
    ///
    /// The listening socket is created with `SO_REUSEADDR` so a restarted
    /// server can rebind immediately.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let resolved = tokio::net::lookup_host(addr)
            .await
            .map_err(TransportError::BindFailed)?
            .next()
            .ok_or_else(|| {
                TransportError::BindFailed(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("no address found for {addr}"),
                ))
            })?;

        let socket = if resolved.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .map_err(TransportError::BindFailed)?;
        socket
            .set_reuseaddr(true)
            .map_err(TransportError::BindFailed)?;
        socket.bind(resolved).map_err(TransportError::BindFailed)?;
        let listener = socket
            .listen(LISTEN_BACKLOG)
            .map_err(TransportError::BindFailed)?;

        tracing::info!(addr = %resolved, "TCP transport listening");
        Ok(Self { listener })
    }
}

impl Transport for TcpTransport {
    type Stream = TcpStream;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Connection<TcpStream>, Self::Error> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;
        stream
            .set_nodelay(true)
            .map_err(TransportError::AcceptFailed)?;

        let conn = Connection::new(stream, addr);
        tracing::debug!(conn_id = %conn.id(), %addr, "accepted TCP connection");
        Ok(conn)
    }

    fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}
