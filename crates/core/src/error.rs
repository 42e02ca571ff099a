//! Error types for chess-sandbox-core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("malformed position string")]
    MalformedExchangeString,

    #[error("unrecognized placement symbol '{0}'")]
    MalformedPlacement(char),

    #[error("pawn on back rank {0}")]
    PawnOnBackRank(u32),

    #[error("expected one king per side, found {white} white and {black} black")]
    InvalidKingCount { white: u32, black: u32 },

    #[error("move rejected: {0}")]
    OracleRejectedMove(String),

    #[error("position rejected: {0}")]
    OracleRejectedPosition(String),

    #[error("no synchronization transport is available")]
    ChannelUnavailable,
}

pub type Result<T> = std::result::Result<T, Error>;
