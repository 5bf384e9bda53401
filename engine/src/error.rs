//! Engine-layer error taxonomy.
//!
//! Every variant here is a validation or consistency failure produced while
//! mutating game state. The server crate wraps this in its own error enum
//! via `#[from]` and turns it into a single wire `error` frame.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum EngineError {
    #[error("it is not your turn")]
    NotYourTurn,

    #[error("no actions remaining this generation")]
    NoActionsRemaining,

    #[error("invalid tile selection")]
    InvalidSelection,

    #[error("tile not found at that position")]
    TileNotFound,

    #[error("tile already occupied")]
    TileAlreadyOccupied,

    #[error("wrong tile type for that position")]
    WrongTileType,

    #[error("placement violates adjacency rules")]
    AdjacencyViolation,

    #[error("global parameter already at maximum")]
    ParameterMaxed,

    #[error("card requirements not met")]
    RequirementsNotMet,

    #[error("cannot afford this action")]
    CannotAfford,

    #[error("unknown card: {0}")]
    UnknownCard(String),

    #[error("player not found")]
    PlayerNotFound,

    #[error("game is not active")]
    GameNotActive,

    #[error("effect loop detected, publish dropped")]
    EffectLoopDetected,
}
