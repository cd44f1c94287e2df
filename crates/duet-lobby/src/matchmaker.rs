//! The matchmaker: pairs waiting connections two at a time, in order.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use duet_protocol::RoomId;
use duet_room::Room;
use duet_transport::Connection;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

/// Single consumer of the pairing queue.
///
/// Pairing is strict FIFO: the 1st and 2nd connections queued form a
/// room, then the 3rd and 4th, and so on. A lone connection waits until
/// a partner arrives, however long that takes.
pub struct Matchmaker<S = TcpStream> {
    rx: mpsc::UnboundedReceiver<Connection<S>>,
    waiting: Arc<AtomicUsize>,
}

impl<S> Matchmaker<S> {
    pub(crate) fn new(
        rx: mpsc::UnboundedReceiver<Connection<S>>,
        waiting: Arc<AtomicUsize>,
    ) -> Self {
        Self { rx, waiting }
    }

    /// Removes and returns the connection at the front of the queue,
    /// waiting for one if the queue is empty.
    ///
    /// Returns `None` once every [`PairingQueue`](crate::PairingQueue)
    /// handle is gone and the queue is drained.
    pub async fn dequeue(&mut self) -> Option<Connection<S>> {
        let conn = self.rx.recv().await?;
        self.waiting.fetch_sub(1, Ordering::SeqCst);
        Some(conn)
    }
}

impl<S> Matchmaker<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    /// Dequeues the next two connections and forms a room from them.
    ///
    /// The first connection dequeued takes role 0. Nothing is sent yet;
    /// the room announces the match when it runs.
    pub async fn next_room(&mut self) -> Option<Room<S>> {
        // A connection taken off the channel still counts as waiting
        // until its partner shows up.
        let first = self.rx.recv().await?;
        let second = self.rx.recv().await?;
        self.waiting.fetch_sub(2, Ordering::SeqCst);
        let room_id = RoomId::generate();

        tracing::info!(
            %room_id,
            first = %first.peer_addr(),
            second = %second.peer_addr(),
            "matched into room"
        );
        Some(Room::new(room_id, first, second))
    }

    /// Forms rooms forever, spawning a task for each.
    ///
    /// Socket writes happen inside the room tasks, so a slow or dead
    /// client never holds up the next pairing. Returns only when the
    /// queue is closed.
    pub async fn run(mut self) {
        tracing::info!("matchmaker started");
        while let Some(room) = self.next_room().await {
            tokio::spawn(room.run());
        }
        tracing::info!("matchmaker stopped: pairing queue closed");
    }
}
