//! Pairing for Duet: the waiting queue and the matchmaker that drains it.
//!
//! # How it fits in the stack
//!
//! ```text
//! pre-match handler  ──enqueue──▶  PairingQueue  ──dequeue×2──▶  Matchmaker
//!                                                                   │
//!                                                          spawn Room::run()
//! ```
//!
//! The queue is created per server instance by [`pairing_queue`] and
//! passed to whoever needs it. There is no process-wide queue, so several
//! servers can share one process (as the integration tests do).

mod matchmaker;
mod queue;

pub use matchmaker::Matchmaker;
pub use queue::{PairingQueue, pairing_queue};
