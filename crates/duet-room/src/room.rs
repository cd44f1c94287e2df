//! Room task: announce the match, relay frames, close both sides.
//!
//! The room owns both connections and waits on them together with
//! `tokio::select!`. Whichever side produces a complete frame first is
//! served first; there is no preference between them. Frames from the
//! same side are forwarded in the order they arrived.

use duet_protocol::{
    Codec, JsonCodec, Role, RoomFrame, RoomId, ServerMessage, classify_room_frame,
};
use duet_transport::{Connection, ConnectionId};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

use crate::RelayError;

/// Why a room ended. The role names the side responsible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomEnd {
    /// The side sent `[101]`.
    Left(Role),
    /// The side closed its stream, or reading from it failed.
    Disconnected(Role),
    /// Forwarding a frame to this side failed.
    SendFailed(Role),
}

impl RoomEnd {
    /// The side that caused the room to end.
    pub fn role(self) -> Role {
        match self {
            Self::Left(role) | Self::Disconnected(role) | Self::SendFailed(role) => role,
        }
    }
}

/// Encodes a [`ServerMessage`] and sends it as one frame.
pub async fn send_message<S>(
    conn: &mut Connection<S>,
    msg: &ServerMessage,
) -> Result<(), RelayError>
where
    S: AsyncRead + AsyncWrite,
{
    let bytes = JsonCodec.encode(msg)?;
    conn.send(&bytes).await?;
    tracing::debug!(conn_id = %conn.id(), opcode = %msg.opcode(), "sent server message");
    Ok(())
}

/// Two matched connections plus the room identifier.
///
/// `sides[0]` is the connection that was dequeued first ([`Role::First`]).
pub struct Room<S = TcpStream> {
    room_id: RoomId,
    sides: [Connection<S>; 2],
}

impl<S> Room<S>
where
    S: AsyncRead + AsyncWrite + Send,
{
    /// Creates a room from two connections, in dequeue order.
    pub fn new(room_id: RoomId, first: Connection<S>, second: Connection<S>) -> Self {
        Self {
            room_id,
            sides: [first, second],
        }
    }

    /// Returns the room's identifier.
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Connection IDs of both sides, indexed by role.
    pub fn connection_ids(&self) -> [ConnectionId; 2] {
        [self.sides[0].id(), self.sides[1].id()]
    }

    /// Runs the room to completion.
    ///
    /// 1. Sends `[110, room_id, role]` to each side (failures are logged
    ///    and otherwise ignored; a dead side shows up as a disconnect).
    /// 2. Relays until a side leaves, disconnects, or can't be written to.
    /// 3. Closes both connections, whatever ended the relay.
    pub async fn run(mut self) -> RoomEnd {
        tracing::info!(
            room_id = %self.room_id,
            first = %self.sides[0].peer_addr(),
            second = %self.sides[1].peer_addr(),
            "room relay started"
        );

        self.announce().await;
        let end = self.relay().await;
        self.close().await;

        tracing::info!(room_id = %self.room_id, ?end, "room relay ended");
        end
    }

    /// Tells each side it has been matched, and with which role.
    async fn announce(&mut self) {
        for role in Role::BOTH {
            let msg = ServerMessage::Matched {
                room_id: self.room_id.clone(),
                role,
            };
            let conn = &mut self.sides[role.index()];
            if let Err(e) = send_message(conn, &msg).await {
                tracing::warn!(
                    room_id = %self.room_id,
                    %role,
                    peer = %conn.peer_addr(),
                    error = %e,
                    "failed to send MATCHED"
                );
            }
        }
    }

    /// Relays frames until the room must end.
    async fn relay(&mut self) -> RoomEnd {
        loop {
            // Both `recv` futures borrow a side mutably; they are dropped
            // as soon as `select!` picks one, freeing `self.sides` again.
            // `recv` is cancel-safe, so the losing branch loses nothing.
            let (from, received) = {
                let [first, second] = &mut self.sides;
                tokio::select! {
                    r = first.recv() => (Role::First, r),
                    r = second.recv() => (Role::Second, r),
                }
            };
            let to = from.other();

            let frame = match received {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    tracing::info!(
                        room_id = %self.room_id,
                        role = %from,
                        peer = %self.sides[from.index()].peer_addr(),
                        "client disconnected"
                    );
                    self.notify_left(to).await;
                    return RoomEnd::Disconnected(from);
                }
                Err(e) => {
                    tracing::warn!(
                        room_id = %self.room_id,
                        role = %from,
                        error = %e,
                        "receive failed, treating as disconnect"
                    );
                    self.notify_left(to).await;
                    return RoomEnd::Disconnected(from);
                }
            };

            let frame = frame.trim_ascii();
            if frame.is_empty() {
                continue;
            }

            match classify_room_frame(frame) {
                RoomFrame::Leave => {
                    tracing::info!(
                        room_id = %self.room_id,
                        role = %from,
                        peer = %self.sides[from.index()].peer_addr(),
                        "client left room"
                    );
                    self.notify_left(to).await;
                    return RoomEnd::Left(from);
                }
                RoomFrame::Unparsed => {
                    tracing::warn!(
                        room_id = %self.room_id,
                        role = %from,
                        "bad JSON received in room, forwarding anyway"
                    );
                }
                RoomFrame::Payload => {
                    tracing::debug!(
                        room_id = %self.room_id,
                        role = %from,
                        len = frame.len(),
                        "relaying frame"
                    );
                }
            }

            if let Err(e) = self.sides[to.index()].send(frame).await {
                tracing::warn!(
                    room_id = %self.room_id,
                    role = %to,
                    error = %e,
                    "send failed, ending room"
                );
                return RoomEnd::SendFailed(to);
            }
        }
    }

    /// Sends `[111]` to `role`. The room is ending either way.
    async fn notify_left(&mut self, role: Role) {
        let conn = &mut self.sides[role.index()];
        if let Err(e) = send_message(conn, &ServerMessage::PersonLeft).await {
            tracing::warn!(
                room_id = %self.room_id,
                %role,
                error = %e,
                "failed to send PERSON_LEFT"
            );
        }
    }

    /// Closes both sides.
    ///
    /// Each connection is closed independently; one failing to shut down
    /// does not keep the other open. Dropping the room afterwards releases
    /// the sockets.
    async fn close(&mut self) {
        for conn in &mut self.sides {
            if let Err(e) = conn.close().await {
                tracing::debug!(
                    room_id = %self.room_id,
                    conn_id = %conn.id(),
                    error = %e,
                    "close failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_end_role() {
        assert_eq!(RoomEnd::Left(Role::First).role(), Role::First);
        assert_eq!(RoomEnd::Disconnected(Role::Second).role(), Role::Second);
        assert_eq!(RoomEnd::SendFailed(Role::Second).role(), Role::Second);
    }

    #[tokio::test]
    async fn test_new_room_keeps_id_and_both_sides() {
        let addr = "127.0.0.1:1".parse().unwrap();
        let (a, _ca) = tokio::io::duplex(64);
        let (b, _cb) = tokio::io::duplex(64);
        let room = Room::new(
            RoomId::from("r"),
            Connection::new(a, addr),
            Connection::new(b, addr),
        );
        assert_eq!(room.room_id().as_str(), "r");
        let [first, second] = room.connection_ids();
        assert_ne!(first, second);
    }
}
