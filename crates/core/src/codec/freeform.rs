//! Freeform position strings
//!
//! When a position fails oracle validation (or the user opts out of rules),
//! it travels as a tagged string instead of an exchange string: the sentinel
//! word, the side to move, and a comma-separated list of `symbol:square`
//! pairs. No castling or en-passant data, and none of the codec invariants
//! apply — two kings, pawns on the back rank, anything goes.

use shakmaty::{Color, Square};

use super::{piece_from_symbol, piece_symbol, side_from_symbol, side_symbol, EditorBoard};
use crate::error::{Error, Result};

pub const SENTINEL: &str = "freeform";

/// Whether a position string is in the freeform (unchecked) format.
pub fn is_freeform(input: &str) -> bool {
    input == SENTINEL || input.starts_with("freeform ")
}

#[derive(Debug, Clone)]
pub struct DecodedFreeform {
    pub board: EditorBoard,
    pub turn: Color,
}

/// Serializes without validation. Pairs are sorted by square so the output
/// is deterministic for a given board.
pub fn encode(board: &EditorBoard, turn: Color) -> String {
    let mut entries: Vec<_> = board.iter().collect();
    entries.sort_by_key(|(square, _)| *square);

    let pairs = if entries.is_empty() {
        "-".to_string()
    } else {
        entries
            .iter()
            .map(|(square, piece)| format!("{}:{}", piece_symbol(*piece), square))
            .collect::<Vec<_>>()
            .join(",")
    };

    format!("{} {} {}", SENTINEL, side_symbol(turn), pairs)
}

pub fn decode(input: &str) -> Result<DecodedFreeform> {
    let fields: Vec<&str> = input.split_whitespace().collect();
    if fields.len() < 3 || fields[0] != SENTINEL {
        return Err(Error::MalformedExchangeString);
    }
    let turn = side_from_symbol(fields[1]).ok_or(Error::MalformedExchangeString)?;

    let mut board = EditorBoard::new();
    if fields[2] != "-" {
        for pair in fields[2].split(',') {
            let (symbol, square) = pair.split_once(':').ok_or(Error::MalformedExchangeString)?;
            let mut symbol_chars = symbol.chars();
            let symbol = symbol_chars.next().ok_or(Error::MalformedExchangeString)?;
            if symbol_chars.next().is_some() {
                return Err(Error::MalformedExchangeString);
            }
            let piece = piece_from_symbol(symbol).ok_or(Error::MalformedPlacement(symbol))?;
            let square: Square = square
                .parse()
                .map_err(|_| Error::MalformedExchangeString)?;
            board.place(square, piece);
        }
    }

    Ok(DecodedFreeform { board, turn })
}
