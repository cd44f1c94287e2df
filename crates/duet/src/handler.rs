//! Per-connection pre-match handler (the "gate").
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! Before a match the only frames a client may send are:
//!
//!   - `[100]` QUEUE → the connection moves into the pairing queue and
//!     this handler is done with it. No reply here; MATCHED comes later
//!     from the room.
//!   - `[101]` LEAVE → the connection is closed.
//!
//! Anything else gets an ERROR frame and the client may try again.

use duet_lobby::PairingQueue;
use duet_protocol::{ClientRequest, Codec, ErrorCode, JsonCodec, ServerMessage, parse_request};
use duet_transport::Connection;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::DuetError;

/// How a connection left the pre-match handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// Sent `[100]`; now owned by the pairing queue.
    Queued,
    /// Sent `[101]`; closed.
    Left,
    /// Closed its stream before queueing.
    Disconnected,
}

/// Handles a single connection from accept until it queues or goes away.
///
/// # Errors
///
/// An I/O failure while reading, or while sending an ERROR frame, ends
/// the handler with that error. The connection is dropped (closed) and is
/// never paired; the caller only logs it.
pub async fn handle_connection<S>(
    mut conn: Connection<S>,
    queue: PairingQueue<S>,
) -> Result<GateOutcome, DuetError>
where
    S: AsyncRead + AsyncWrite,
{
    let conn_id = conn.id();
    let peer = conn.peer_addr();
    tracing::info!(%conn_id, %peer, "handling client");

    loop {
        let Some(frame) = conn.recv().await? else {
            tracing::info!(%conn_id, %peer, "client disconnected before queueing");
            return Ok(GateOutcome::Disconnected);
        };

        let frame = frame.trim_ascii();
        if frame.is_empty() {
            continue;
        }

        match parse_request(frame) {
            Ok(ClientRequest::Queue) => {
                tracing::info!(%conn_id, %peer, "client queued");
                queue.enqueue(conn);
                return Ok(GateOutcome::Queued);
            }
            Ok(ClientRequest::Leave) => {
                tracing::info!(%conn_id, %peer, "client left before queueing");
                if let Err(e) = conn.close().await {
                    tracing::debug!(%conn_id, error = %e, "close failed");
                }
                return Ok(GateOutcome::Left);
            }
            Err(code) => {
                let text = String::from_utf8_lossy(frame);
                match code {
                    ErrorCode::MalformedJson => {
                        tracing::warn!(%conn_id, %peer, frame = %text, "bad JSON")
                    }
                    ErrorCode::NotAList => {
                        tracing::warn!(%conn_id, %peer, frame = %text, "non-list message")
                    }
                    ErrorCode::NotAllowed => {
                        tracing::warn!(%conn_id, %peer, frame = %text, "invalid pre-match message")
                    }
                }
                send_error(&mut conn, code).await?;
            }
        }
    }
}

/// Sends `[120, code, message]` to the client.
async fn send_error<S>(conn: &mut Connection<S>, code: ErrorCode) -> Result<(), DuetError>
where
    S: AsyncRead + AsyncWrite,
{
    let bytes = JsonCodec.encode(&ServerMessage::error(code))?;
    conn.send(&bytes).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    //! Unit tests for the gate, driven over in-memory pipes.
    //!
    //! The handler runs on its own task; the test plays the client on
    //! the other end of the pipe.

    use std::time::Duration;

    use duet_lobby::pairing_queue;
    use serde_json::{Value, json};
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, ReadHalf};
    use tokio::task::JoinHandle;

    use super::*;

    struct TestClient {
        lines: tokio::io::Lines<BufReader<ReadHalf<DuplexStream>>>,
        writer: tokio::io::WriteHalf<DuplexStream>,
    }

    impl TestClient {
        async fn send(&mut self, raw: &[u8]) {
            self.writer.write_all(raw).await.unwrap();
        }

        async fn recv(&mut self) -> Option<Value> {
            let line = tokio::time::timeout(Duration::from_secs(1), self.lines.next_line())
                .await
                .expect("timed out")
                .unwrap()?;
            Some(serde_json::from_str(&line).unwrap())
        }
    }

    fn spawn_gate(
        queue: &PairingQueue<DuplexStream>,
    ) -> (TestClient, JoinHandle<Result<GateOutcome, DuetError>>) {
        let (server, client) = tokio::io::duplex(1024);
        let conn = Connection::new(server, "127.0.0.1:7000".parse().unwrap());
        let handle = tokio::spawn(handle_connection(conn, queue.clone()));
        let (read_half, writer) = tokio::io::split(client);
        (
            TestClient {
                lines: BufReader::new(read_half).lines(),
                writer,
            },
            handle,
        )
    }

    #[tokio::test]
    async fn test_handle_connection_queue_moves_connection_into_queue() {
        let (queue, mut matchmaker) = pairing_queue();
        let (mut client, handle) = spawn_gate(&queue);

        client.send(b"[100]\n").await;
        assert_eq!(handle.await.unwrap().unwrap(), GateOutcome::Queued);
        assert_eq!(queue.waiting(), 1);
        assert!(matchmaker.dequeue().await.is_some());
    }

    #[tokio::test]
    async fn test_handle_connection_leave_closes_connection() {
        let (queue, _matchmaker) = pairing_queue();
        let (mut client, handle) = spawn_gate(&queue);

        client.send(b"[101]\n").await;
        assert_eq!(handle.await.unwrap().unwrap(), GateOutcome::Left);
        assert_eq!(client.recv().await, None);
        assert_eq!(queue.waiting(), 0);
    }

    #[tokio::test]
    async fn test_handle_connection_disconnect_before_queue() {
        let (queue, _matchmaker) = pairing_queue();
        let (client, handle) = spawn_gate(&queue);

        drop(client);
        assert_eq!(handle.await.unwrap().unwrap(), GateOutcome::Disconnected);
        assert_eq!(queue.waiting(), 0);
    }

    #[tokio::test]
    async fn test_handle_connection_errors_are_not_fatal() {
        let (queue, _matchmaker) = pairing_queue();
        let (mut client, handle) = spawn_gate(&queue);

        client.send(b"{nope\n").await;
        assert_eq!(
            client.recv().await,
            Some(json!([120, 1, "Bad JSON; send a list like [100]."]))
        );

        client.send(b"{\"op\":100}\n").await;
        assert_eq!(
            client.recv().await,
            Some(json!([120, 2, "Top level must be a list."]))
        );

        client.send(b"[999]\n").await;
        assert_eq!(
            client.recv().await,
            Some(json!([120, 3, "Must [100] (QUEUE) before sending data."]))
        );

        client.send(b"[100]\n").await;
        assert_eq!(handle.await.unwrap().unwrap(), GateOutcome::Queued);
    }

    #[tokio::test]
    async fn test_handle_connection_ignores_blank_lines() {
        let (queue, _matchmaker) = pairing_queue();
        let (mut client, handle) = spawn_gate(&queue);

        client.send(b"\n   \r\n  [100]  \r\n").await;
        assert_eq!(handle.await.unwrap().unwrap(), GateOutcome::Queued);
    }

    #[tokio::test]
    async fn test_handle_connection_keeps_bytes_sent_after_queue() {
        let (queue, mut matchmaker) = pairing_queue();
        let (mut client, handle) = spawn_gate(&queue);

        client.send(b"[100]\n[\"early\"]\n").await;
        assert_eq!(handle.await.unwrap().unwrap(), GateOutcome::Queued);

        let mut conn = matchmaker.dequeue().await.unwrap();
        assert_eq!(conn.recv().await.unwrap(), Some(b"[\"early\"]".to_vec()));
    }
}
