//! Move selection for the bot opponent

mod selection;

pub use selection::{material_score, piece_value, select_move};
