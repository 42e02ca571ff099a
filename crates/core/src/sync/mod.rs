//! Synchronization protocol
//!
//! Two peers in a room exchange exactly one message kind, `"move"`. Every
//! message carries the complete resulting position rather than a diff, so
//! delivery may be lossy and out of order: applying a message is idempotent
//! and the latest one wins. The transport itself is opaque; anything that
//! can open a room-scoped channel and shuttle JSON payloads qualifies.

use std::fmt;

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shakmaty::Square;

use crate::error::Result;

/// The single message kind peers subscribe to.
pub const MOVE_KIND: &str = "move";

/// A committed move, self-sufficient for the receiving peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveMessage {
    #[serde(with = "square_notation")]
    pub from: Square,
    #[serde(with = "square_notation")]
    pub to: Square,
    pub description: String,
    pub resulting_position: String,
}

mod square_notation {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use shakmaty::Square;

    pub fn serialize<S: Serializer>(square: &Square, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(square)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Square, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(D::Error::custom)
    }
}

/// Short opaque code scoping a two-peer channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomCode(String);

impl RoomCode {
    pub const LEN: usize = 5;

    // No 0/O/1/I, the code is read out loud between players.
    const CHARSET: &'static [u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

    pub fn new(code: impl Into<String>) -> Self {
        RoomCode(code.into())
    }

    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code: String = (0..Self::LEN)
            .map(|_| *Self::CHARSET.choose(rng).unwrap() as char)
            .collect();
        RoomCode(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An open channel to the peer sharing the room.
///
/// `send` is fire-and-forget; `try_recv` is drained by the session on its
/// event loop. No ordering or delivery guarantees beyond what the transport
/// provides.
pub trait Channel {
    fn send(&self, kind: &str, payload: Value);
    fn try_recv(&mut self) -> Option<(String, Value)>;
}

/// Opens room-scoped channels. Absence of a transport means the online
/// feature is simply not offered.
pub trait Transport {
    fn open_channel(&self, room: &RoomCode) -> Result<Box<dyn Channel>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_move_message_wire_format() {
        let msg = MoveMessage {
            from: Square::E2,
            to: Square::E4,
            description: "e2e4".to_string(),
            resulting_position: "rnbqkbnr/pppppppp/8/8/4P3/8/PPPPPPPP/RNBQKBNR b KQkq - 0 1"
                .to_string(),
        };

        let wire = serde_json::to_value(&msg).unwrap();
        assert_eq!(wire["from"], "e2");
        assert_eq!(wire["to"], "e4");
        assert!(wire["resultingPosition"].is_string());

        let back: MoveMessage = serde_json::from_value(wire).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_bad_square_rejected() {
        let wire = serde_json::json!({
            "from": "z9",
            "to": "e4",
            "description": "",
            "resultingPosition": "",
        });
        assert!(serde_json::from_value::<MoveMessage>(wire).is_err());
    }

    #[test]
    fn test_room_code_generation() {
        let mut rng = StdRng::seed_from_u64(1);
        let code = RoomCode::generate(&mut rng);
        assert_eq!(code.as_str().len(), RoomCode::LEN);
        assert!(code
            .as_str()
            .bytes()
            .all(|b| RoomCode::CHARSET.contains(&b)));

        // Same seed, same code.
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(RoomCode::generate(&mut rng), code);
    }
}
