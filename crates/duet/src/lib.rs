//! # Duet
//!
//! A rendezvous and relay server. Clients connect over TCP and send
//! `[100]` to be paired; once two are waiting they are matched into a
//! room and every line one sends is relayed to the other, until either
//! side sends `[101]` or disconnects.
//!
//! ## Layers
//!
//! ```text
//! duet            server accept loop, pre-match handler
//! duet-lobby      pairing queue + matchmaker
//! duet-room       room relay
//! duet-protocol   opcodes, messages, codec
//! duet-transport  TCP, newline framing
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use duet::prelude::*;
//!
//! # async fn start() -> Result<(), DuetError> {
//! let server = DuetServer::builder()
//!     .bind("0.0.0.0:9000")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::DuetError;
pub use handler::{GateOutcome, handle_connection};
pub use server::{DuetServer, DuetServerBuilder};

/// Everything needed to start a server or talk to its layers.
pub mod prelude {
    pub use crate::{DuetError, DuetServer, DuetServerBuilder, GateOutcome};
    pub use duet_lobby::{Matchmaker, PairingQueue, pairing_queue};
    pub use duet_protocol::{
        ClientRequest, Codec, ErrorCode, JsonCodec, Opcode, ProtocolError, Role, RoomId,
        ServerMessage,
    };
    pub use duet_room::{Room, RoomEnd};
    pub use duet_transport::{Connection, ConnectionId, TcpTransport, Transport, TransportError};
}
