//! In-process relay for two-peer rooms
//!
//! Implements the core transport contract with tokio broadcast channels:
//! a hub keyed by room code, fire-and-forget sends, bounded buffers that
//! drop the oldest messages under lag. Exactly the best-effort,
//! unordered-tolerant delivery the sync protocol is designed for — peers
//! resynchronize from the next message because every message carries the
//! complete position.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use serde_json::Value;
use tokio::sync::broadcast;

use chess_sandbox_core::sync::{Channel, Transport};
use chess_sandbox_core::{Error, Result, RoomCode};

/// Messages buffered per room before the oldest are dropped.
const ROOM_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
struct Envelope {
    sender: u64,
    kind: String,
    payload: Value,
}

/// Room-keyed pub/sub hub. Cheap to share by reference between the sessions
/// of one process.
#[derive(Default)]
pub struct RelayHub {
    rooms: Mutex<HashMap<String, broadcast::Sender<Envelope>>>,
    next_peer: AtomicU64,
}

impl RelayHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many channels are currently open on a room.
    pub fn peer_count(&self, room: &RoomCode) -> usize {
        let rooms = match self.rooms.lock() {
            Ok(rooms) => rooms,
            Err(_) => return 0,
        };
        rooms
            .get(room.as_str())
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }
}

impl Transport for RelayHub {
    fn open_channel(&self, room: &RoomCode) -> Result<Box<dyn Channel>> {
        let mut rooms = self.rooms.lock().map_err(|_| Error::ChannelUnavailable)?;
        let tx = rooms
            .entry(room.as_str().to_string())
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0)
            .clone();
        let rx = tx.subscribe();
        let peer = self.next_peer.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(RelayChannel { peer, tx, rx }))
    }
}

/// One peer's end of a room.
pub struct RelayChannel {
    peer: u64,
    tx: broadcast::Sender<Envelope>,
    rx: broadcast::Receiver<Envelope>,
}

impl Channel for RelayChannel {
    fn send(&self, kind: &str, payload: Value) {
        // Fire and forget: a room with no other peer simply drops the message.
        let _ = self.tx.send(Envelope {
            sender: self.peer,
            kind: kind.to_string(),
            payload,
        });
    }

    fn try_recv(&mut self) -> Option<(String, Value)> {
        loop {
            match self.rx.try_recv() {
                Ok(envelope) if envelope.sender == self.peer => continue,
                Ok(envelope) => return Some((envelope.kind, envelope.payload)),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    tracing::debug!("relay receiver lagged, {} messages dropped", skipped);
                    continue;
                }
                Err(_) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn room() -> RoomCode {
        RoomCode::new("TESTS")
    }

    #[test]
    fn test_peers_share_a_room() {
        let hub = RelayHub::new();
        let a = hub.open_channel(&room()).unwrap();
        let mut b = hub.open_channel(&room()).unwrap();

        a.send("move", json!({"n": 1}));
        let (kind, payload) = b.try_recv().unwrap();
        assert_eq!(kind, "move");
        assert_eq!(payload["n"], 1);
        assert!(b.try_recv().is_none());
    }

    #[test]
    fn test_sender_does_not_hear_itself() {
        let hub = RelayHub::new();
        let mut a = hub.open_channel(&room()).unwrap();
        let _b = hub.open_channel(&room()).unwrap();

        a.send("move", json!({}));
        assert!(a.try_recv().is_none());
    }

    #[test]
    fn test_rooms_are_isolated() {
        let hub = RelayHub::new();
        let a = hub.open_channel(&RoomCode::new("AAAAA")).unwrap();
        let mut b = hub.open_channel(&RoomCode::new("BBBBB")).unwrap();

        a.send("move", json!({}));
        assert!(b.try_recv().is_none());
    }

    #[test]
    fn test_send_without_peer_is_dropped() {
        let hub = RelayHub::new();
        let a = hub.open_channel(&room()).unwrap();
        a.send("move", json!({}));

        // A later joiner starts from its subscription point.
        let mut b = hub.open_channel(&room()).unwrap();
        assert!(b.try_recv().is_none());
    }

    #[test]
    fn test_lagged_receiver_recovers() {
        let hub = RelayHub::new();
        let a = hub.open_channel(&room()).unwrap();
        let mut b = hub.open_channel(&room()).unwrap();

        for n in 0..(ROOM_CAPACITY + 10) {
            a.send("move", json!({ "n": n }));
        }

        // The oldest messages are gone, the newest still arrive.
        let mut received = Vec::new();
        while let Some((_, payload)) = b.try_recv() {
            received.push(payload["n"].as_u64().unwrap());
        }
        assert!(!received.is_empty());
        assert_eq!(*received.last().unwrap(), (ROOM_CAPACITY + 9) as u64);
    }

    #[test]
    fn test_peer_count() {
        let hub = RelayHub::new();
        assert_eq!(hub.peer_count(&room()), 0);
        let _a = hub.open_channel(&room()).unwrap();
        let _b = hub.open_channel(&room()).unwrap();
        assert_eq!(hub.peer_count(&room()), 2);
    }
}
