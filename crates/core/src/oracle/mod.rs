//! Rule oracle adapter
//!
//! Wraps the external rule engine (shakmaty) behind the narrow contract the
//! rest of the crate relies on: load a position string, list legal moves,
//! apply a move by its endpoints, read the resulting exchange string and the
//! termination status. Everything else in the crate treats legality as
//! opaque.

use shakmaty::{fen::Fen, CastlingMode, Chess, Color, File, Move, Position, Role, Square};

use crate::error::{Error, Result};

/// Game termination as reported by the rule engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Ongoing,
    Checkmate,
    Stalemate,
}

#[derive(Debug)]
pub struct Oracle {
    pos: Chess,
}

impl Oracle {
    /// Loads an exchange string into the rule engine.
    ///
    /// Malformed strings and positions the engine considers unplayable both
    /// surface as `OracleRejectedPosition`.
    pub fn load(exchange: &str) -> Result<Self> {
        let fen: Fen = exchange
            .parse()
            .map_err(|e| Error::OracleRejectedPosition(format!("{}", e)))?;
        let pos: Chess = fen
            .into_position(CastlingMode::Standard)
            .map_err(|e| Error::OracleRejectedPosition(format!("{}", e)))?;
        Ok(Self { pos })
    }

    pub fn position(&self) -> &Chess {
        &self.pos
    }

    pub fn turn(&self) -> Color {
        self.pos.turn()
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        self.pos.legal_moves().to_vec()
    }

    /// Finds the legal move matching the given endpoints, if any.
    ///
    /// A hintless promotion resolves to queen rather than being rejected;
    /// castling is addressed by the king's two-square hop.
    pub fn find_move(&self, from: Square, to: Square, promotion: Option<Role>) -> Option<Move> {
        let mut fallback = None;
        for m in self.pos.legal_moves() {
            let endpoints = match move_endpoints(&m) {
                Some(endpoints) => endpoints,
                None => continue,
            };
            if endpoints != (from, to) {
                continue;
            }
            let move_promotion = match m {
                Move::Normal { promotion, .. } => promotion,
                _ => None,
            };
            match (move_promotion, promotion) {
                (None, _) => return Some(m),
                (Some(role), Some(wanted)) if role == wanted => return Some(m),
                (Some(Role::Queen), None) => return Some(m),
                (Some(_), None) => fallback = fallback.or(Some(m)),
                _ => {}
            }
        }
        fallback
    }

    /// Applies a move by its endpoints, returning the move that was played.
    pub fn apply(&mut self, from: Square, to: Square, promotion: Option<Role>) -> Result<Move> {
        let m = self.find_move(from, to, promotion).ok_or_else(|| {
            Error::OracleRejectedMove(format!("no legal move from {} to {}", from, to))
        })?;
        self.pos = self
            .pos
            .clone()
            .play(m.clone())
            .map_err(|e| Error::OracleRejectedMove(format!("{}", e)))?;
        Ok(m)
    }

    pub fn exchange_string(&self) -> String {
        Fen::from_position(&self.pos, shakmaty::EnPassantMode::Legal).to_string()
    }

    pub fn status(&self) -> GameStatus {
        if self.pos.is_checkmate() {
            GameStatus::Checkmate
        } else if self.pos.is_stalemate() {
            GameStatus::Stalemate
        } else {
            GameStatus::Ongoing
        }
    }
}

/// The from/to squares a move presents to the user, `None` for drops.
///
/// Castling is reported as the king's hop to the g- or c-file, not the
/// engine-internal king-takes-rook encoding.
pub fn move_endpoints(m: &Move) -> Option<(Square, Square)> {
    match m {
        Move::Normal { from, to, .. } => Some((*from, *to)),
        Move::EnPassant { from, to, .. } => Some((*from, *to)),
        Move::Castle { king, rook } => {
            let file = if rook.file() > king.file() {
                File::G
            } else {
                File::C
            };
            Some((*king, Square::from_coords(file, king.rank())))
        }
        Move::Put { .. } => None,
    }
}

/// Plain text for a move, endpoint form with a promotion suffix ("e7e8q").
pub fn describe_move(m: &Move) -> String {
    let (from, to) = match move_endpoints(m) {
        Some(endpoints) => endpoints,
        None => return String::new(),
    };
    let promotion = match m {
        Move::Normal {
            promotion: Some(role),
            ..
        } => match role {
            Role::Queen => "q",
            Role::Rook => "r",
            Role::Bishop => "b",
            Role::Knight => "n",
            _ => "",
        },
        _ => "",
    };
    format!("{}{}{}", from, to, promotion)
}
