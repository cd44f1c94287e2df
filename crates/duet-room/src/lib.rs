//! Room relay for Duet.
//!
//! A room is two matched connections and the task that relays between
//! them. Each room runs as its own Tokio task and owns both connections
//! until it ends; nothing else holds a reference to it.
//!
//! # Key types
//!
//! - [`Room`]: a matched pair, ready to [`run`](Room::run)
//! - [`RoomEnd`]: which side ended the room, and how

mod error;
mod room;

pub use error::RelayError;
pub use room::{Room, RoomEnd, send_message};
