//! Integration tests for the pairing queue and matchmaker.
//!
//! Connections are in-memory duplex pipes. The test keeps the client end
//! of each pipe and checks what the matchmaker's rooms send to it.

use std::time::Duration;

use duet_lobby::pairing_queue;
use duet_transport::Connection;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader, DuplexStream, Lines};

fn conn() -> (Connection<DuplexStream>, DuplexStream) {
    let (server, client) = tokio::io::duplex(4096);
    (Connection::new(server, "127.0.0.1:5000".parse().unwrap()), client)
}

async fn next_json<R: AsyncRead + Unpin>(lines: &mut Lines<BufReader<R>>) -> Value {
    let line = tokio::time::timeout(Duration::from_secs(1), lines.next_line())
        .await
        .expect("timed out")
        .unwrap()
        .expect("unexpected EOF");
    serde_json::from_str(&line).unwrap()
}

/// Returns `(room_id, role)` from a MATCHED frame.
fn matched(frame: &Value) -> (String, u64) {
    assert_eq!(frame[0], json!(110), "expected MATCHED, got {frame}");
    (
        frame[1].as_str().expect("room id is a string").to_owned(),
        frame[2].as_u64().expect("role is a number"),
    )
}

#[tokio::test]
async fn test_next_room_pairs_in_dequeue_order() {
    let (queue, mut matchmaker) = pairing_queue();
    let (c1, _k1) = conn();
    let (c2, _k2) = conn();
    let (c3, _k3) = conn();
    let (c4, _k4) = conn();
    let ids = [c1.id(), c2.id(), c3.id(), c4.id()];

    queue.enqueue(c1);
    queue.enqueue(c2);
    queue.enqueue(c3);

    let room = matchmaker.next_room().await.expect("two are waiting");
    assert_eq!(room.connection_ids(), [ids[0], ids[1]]);
    assert_eq!(room.room_id().as_str().len(), 32);
    assert_eq!(queue.waiting(), 1);

    queue.enqueue(c4);
    let room = matchmaker.next_room().await.expect("two are waiting");
    assert_eq!(room.connection_ids(), [ids[2], ids[3]]);
    assert_eq!(queue.waiting(), 0);
}

#[tokio::test]
async fn test_next_room_waits_for_a_partner() {
    let (queue, mut matchmaker) = pairing_queue();
    let (c1, _k1) = conn();
    queue.enqueue(c1);

    let pending =
        tokio::time::timeout(Duration::from_millis(50), matchmaker.next_room()).await;
    assert!(pending.is_err(), "a lone client must keep waiting");
}

#[tokio::test]
async fn test_run_matches_pairs_fifo_with_complementary_roles() {
    let (queue, matchmaker) = pairing_queue();
    tokio::spawn(matchmaker.run());

    let mut clients = Vec::new();
    for _ in 0..6 {
        let (server, client) = conn();
        queue.enqueue(server);
        clients.push(BufReader::new(client).lines());
    }

    let mut frames = Vec::new();
    for lines in &mut clients {
        frames.push(matched(&next_json(lines).await));
    }

    let mut seen_rooms = std::collections::HashSet::new();
    for pair in frames.chunks(2) {
        let (room_a, role_a) = &pair[0];
        let (room_b, role_b) = &pair[1];
        assert_eq!(room_a, room_b, "consecutive clients share a room");
        assert_eq!((*role_a, *role_b), (0, 1));
        assert!(seen_rooms.insert(room_a.clone()), "room ids are unique");
    }
}

#[tokio::test]
async fn test_run_relays_between_matched_pair() {
    let (queue, matchmaker) = pairing_queue();
    tokio::spawn(matchmaker.run());

    let (s1, k1) = conn();
    let (s2, k2) = conn();
    queue.enqueue(s1);
    queue.enqueue(s2);

    let (r1, mut w1) = tokio::io::split(k1);
    let mut lines1 = BufReader::new(r1).lines();
    let mut lines2 = BufReader::new(k2).lines();
    let _ = matched(&next_json(&mut lines1).await);
    let _ = matched(&next_json(&mut lines2).await);

    w1.write_all(b"[\"hi\"]\n").await.unwrap();
    assert_eq!(next_json(&mut lines2).await, json!(["hi"]));

    w1.write_all(b"[101]\n").await.unwrap();
    assert_eq!(next_json(&mut lines2).await, json!([111]));
}

#[tokio::test]
async fn test_dead_waiting_client_still_pairs_and_partner_sees_person_left() {
    let (queue, matchmaker) = pairing_queue();
    tokio::spawn(matchmaker.run());

    let (s1, k1) = conn();
    queue.enqueue(s1);
    drop(k1);

    let (s2, k2) = conn();
    queue.enqueue(s2);
    let mut lines2 = BufReader::new(k2).lines();

    let (_, role) = matched(&next_json(&mut lines2).await);
    assert_eq!(role, 1);
    assert_eq!(next_json(&mut lines2).await, json!([111]));
}

#[tokio::test]
async fn test_run_stops_when_queue_closed() {
    let (queue, matchmaker) = pairing_queue::<DuplexStream>();
    let handle = tokio::spawn(matchmaker.run());
    drop(queue);
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("matchmaker should stop")
        .unwrap();
}
