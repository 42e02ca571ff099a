//! Single-ply material-delta move selection
//!
//! The bot asks the oracle for every legal move, evaluates each one on a
//! clone of the position, and takes the move with the best immediate
//! material swing for its color. Ties are broken by shuffling the move list
//! before the scan, so equal candidates win uniformly at random while the
//! whole selection stays reproducible under a seeded generator.

use rand::seq::SliceRandom;
use rand::Rng;
use shakmaty::{Chess, Color, Move, Position, Role};

use crate::error::Result;
use crate::oracle::Oracle;

/// Centipawn value of a piece kind. The king carries no material value.
pub fn piece_value(role: Role) -> i32 {
    match role {
        Role::Pawn => 100,
        Role::Knight => 320,
        Role::Bishop => 330,
        Role::Rook => 500,
        Role::Queen => 900,
        Role::King => 0,
    }
}

/// Material balance of a position in centipawns, white positive.
pub fn material_score(pos: &Chess) -> i32 {
    let board = pos.board();
    let mut score = 0;
    for square in board.occupied() {
        if let Some(piece) = board.piece_at(square) {
            let value = piece_value(piece.role);
            score += match piece.color {
                Color::White => value,
                Color::Black => -value,
            };
        }
    }
    score
}

fn oriented(score: i32, color: Color) -> i32 {
    match color {
        Color::White => score,
        Color::Black => -score,
    }
}

/// Chooses a move for `color` in the given position, or `None` when the
/// game is over or it is not that color's turn.
///
/// Every candidate is evaluated on a clone; the caller's position and the
/// oracle state are never mutated. The returned move is for the caller to
/// apply exactly once.
pub fn select_move<R: Rng + ?Sized>(
    exchange: &str,
    color: Color,
    rng: &mut R,
) -> Result<Option<Move>> {
    let oracle = Oracle::load(exchange)?;
    if oracle.turn() != color {
        return Ok(None);
    }

    let mut moves = oracle.legal_moves();
    if moves.is_empty() {
        return Ok(None);
    }
    moves.shuffle(rng);

    let before = oriented(material_score(oracle.position()), color);
    let mut best: Option<(Move, i32)> = None;
    for m in moves {
        let child = match oracle.position().clone().play(m.clone()) {
            Ok(pos) => pos,
            Err(_) => continue,
        };
        let delta = oriented(material_score(&child), color) - before;
        match best {
            Some((_, best_delta)) if best_delta >= delta => {}
            _ => best = Some((m, delta)),
        }
    }

    Ok(best.map(|(m, _)| m))
}
