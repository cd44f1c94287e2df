//! Error types for the room layer.

use duet_protocol::ProtocolError;
use duet_transport::TransportError;

/// Failure to deliver a server message to one connection.
///
/// Inside a room every such failure means the same thing: that side is
/// gone. Callers log it and end the room rather than retry.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The message could not be written to the socket.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The message could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
