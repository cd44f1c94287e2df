//! Wire protocol for Duet.
//!
//! Every frame on the wire is one JSON array per line. The first element
//! is an opcode:
//!
//! ```text
//! client → server (pre-match)   [100] QUEUE        [101] LEAVE
//! server → client               [110, room_id, role] MATCHED
//!                               [111] PERSON_LEFT
//!                               [120, code, message] ERROR
//! ```
//!
//! This crate owns:
//!
//! - **Types** ([`Opcode`], [`Role`], [`RoomId`], [`ErrorCode`]): the
//!   vocabulary of the protocol.
//! - **Messages** ([`ClientRequest`], [`ServerMessage`]): what the server
//!   accepts before a match and what it emits.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how messages become bytes.
//!
//! Line splitting lives one layer down, in `duet-transport`. Here a frame
//! is already a single line without its newline.
//!
//! # Opcode layout
//!
//! Opcodes and their arguments share one flat array, with no tag field.
//! Internally, requests and messages are tagged Rust enums; the flat
//! array shape only exists at the serialization boundary.

mod codec;
mod error;
mod message;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use message::{ClientRequest, RoomFrame, ServerMessage, classify_room_frame, parse_request};
pub use types::{ErrorCode, Opcode, Role, RoomId};
