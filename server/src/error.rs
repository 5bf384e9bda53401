//! Server-layer error taxonomy (C14): wraps the engine and protocol errors
//! and gives every failure a single `Display` that becomes the wire
//! `error` frame's `message` field.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Engine(#[from] engine::EngineError),

    #[error(transparent)]
    Protocol(#[from] protocol::ProtocolError),

    #[error("unknown game: {0}")]
    UnknownGame(String),

    #[error("unknown player: {0}")]
    UnknownPlayer(String),

    #[error("not connected to a game yet")]
    NotIdentified,

    #[error("unknown action type: {0}")]
    UnknownActionType(String),

    #[error("invalid hex")]
    InvalidHex,

    #[error("missing field: {0}")]
    MissingField(String),
}
