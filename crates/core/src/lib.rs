//! Chess Sandbox Core Library
//!
//! Build any chess position, legal or not, and play it out: validated by the
//! rule oracle or completely freeform, against the bot or against a peer in
//! a shared room.

use shakmaty::{Color, Position};

pub mod codec;
pub mod engine;
pub mod error;
pub mod oracle;
pub mod session;
pub mod sync;

pub use codec::{CastlingRights, EditorBoard};
pub use error::{Error, Result};
pub use oracle::{GameStatus, Oracle};
pub use session::{RuleMode, Session};
pub use sync::{Channel, MoveMessage, RoomCode, Transport, MOVE_KIND};

/// The standard starting position as an exchange string.
pub const STARTING_EXCHANGE: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Basic position information
#[derive(Debug)]
pub struct PositionSummary {
    pub piece_count: u32,
    pub legal_move_count: u32,
    pub side_to_move: Color,
    pub is_check: bool,
    pub status: GameStatus,
}

/// Summarizes an exchange string via the rule oracle.
pub fn summarize_position(exchange: &str) -> Result<PositionSummary> {
    let oracle = Oracle::load(exchange)?;
    let pos = oracle.position();

    Ok(PositionSummary {
        piece_count: pos.board().occupied().count() as u32,
        legal_move_count: oracle.legal_moves().len() as u32,
        side_to_move: oracle.turn(),
        is_check: pos.is_check(),
        status: oracle.status(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_starting_position() {
        let summary = summarize_position(STARTING_EXCHANGE).unwrap();
        assert_eq!(summary.piece_count, 32);
        assert_eq!(summary.legal_move_count, 20);
        assert_eq!(summary.side_to_move, Color::White);
        assert!(!summary.is_check);
        assert_eq!(summary.status, GameStatus::Ongoing);
    }

    #[test]
    fn test_starting_exchange_round_trips_through_codec() {
        let decoded = codec::decode(STARTING_EXCHANGE).unwrap();
        let encoded = codec::encode(&decoded.board, decoded.turn, decoded.castling).unwrap();
        assert_eq!(encoded, STARTING_EXCHANGE);
    }
}
