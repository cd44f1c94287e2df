//! Unified error type for the Duet server.

use duet_protocol::ProtocolError;
use duet_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates a `From` impl, so
/// `?` converts sub-crate errors automatically.
///
/// None of these are fatal to the server: a `DuetError` always belongs
/// to one connection, which is dropped. Only [`DuetServerBuilder::build`]
/// can fail the server as a whole (it can't bind).
///
/// [`DuetServerBuilder::build`]: crate::DuetServerBuilder::build
#[derive(Debug, thiserror::Error)]
pub enum DuetError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encoding a server message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
