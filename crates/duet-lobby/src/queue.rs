//! The pairing queue: an unbounded FIFO of connections awaiting a partner.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use duet_transport::Connection;
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::Matchmaker;

/// Creates a pairing queue and the matchmaker that consumes it.
///
/// The queue side is cheap to clone and is handed to every pre-match
/// handler. The matchmaker is the single consumer; insertion order is
/// dequeue order.
pub fn pairing_queue<S>() -> (PairingQueue<S>, Matchmaker<S>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let waiting = Arc::new(AtomicUsize::new(0));
    let queue = PairingQueue {
        tx,
        waiting: Arc::clone(&waiting),
    };
    (queue, Matchmaker::new(rx, waiting))
}

/// Enqueue handle for the pairing queue.
///
/// Enqueueing moves the connection in: from then on the matchmaker (and
/// later the room) owns it. A connection therefore can't be queued twice.
pub struct PairingQueue<S = TcpStream> {
    tx: mpsc::UnboundedSender<Connection<S>>,
    waiting: Arc<AtomicUsize>,
}

impl<S> PairingQueue<S> {
    /// Adds a connection to the back of the queue. Never blocks.
    ///
    /// If the matchmaker has already stopped, the connection is dropped
    /// (and so closed) with a warning; the caller has nothing to recover.
    pub fn enqueue(&self, conn: Connection<S>) {
        self.waiting.fetch_add(1, Ordering::SeqCst);
        if let Err(mpsc::error::SendError(conn)) = self.tx.send(conn) {
            self.waiting.fetch_sub(1, Ordering::SeqCst);
            tracing::warn!(
                conn_id = %conn.id(),
                "matchmaker stopped, dropping queued connection"
            );
        }
    }

    /// Number of connections enqueued and not yet placed in a room.
    ///
    /// A lone connection the matchmaker is holding while it waits for a
    /// partner still counts.
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }
}

impl<S> Clone for PairingQueue<S> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            waiting: Arc::clone(&self.waiting),
        }
    }
}
