//! Core game-session logic: the hex board, the event bus, the game-state
//! aggregate, the tile-selection queue, effect subscription, and tile
//! placement. Transport, wire protocol, and connection management live in
//! the `server` crate; this crate has no knowledge of sockets or JSON.

pub mod board;
pub mod cards;
pub mod effects;
pub mod error;
pub mod event_bus;
pub mod game;
pub mod hex;
pub mod placement;
pub mod player;
pub mod tile_queue;
pub mod tiles;

pub use error::EngineError;
pub use event_bus::{EventBus, EventKind, GameEvent};
pub use game::{Game, GameId, GamePhase, GameSettings, GameStatus, GlobalParameters};
pub use hex::HexPosition;
pub use player::{Player, PlayerId};
