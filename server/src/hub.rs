//! Connection registry (C8): tracks, per game, which connection currently
//! owns which player seat, and relays outbound frames to them. A second
//! `register` for the same player evicts the previous connection, which is
//! how `playerReconnect` drops a stale tab without an explicit kick frame.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::mpsc::Sender;
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

use engine::game::GameId;
use engine::player::PlayerId;
use protocol::OutboundEnvelope;

/// Outbound frames per connection are queued this deep before the oldest
/// send starts getting dropped; a connection this far behind is already
/// broken and the next broadcast will re-converge it.
pub const OUTBOUND_QUEUE_DEPTH: usize = 256;

pub type ConnectionId = Uuid;

struct Seat {
    connection_id: ConnectionId,
    sender: Sender<OutboundEnvelope>,
}

#[derive(Default)]
pub struct Hub {
    games: Mutex<HashMap<GameId, HashMap<PlayerId, Seat>>>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `connection_id` as the live connection for `player_id` in
    /// `game_id`, evicting whatever connection held that seat before.
    pub fn register(
        &self,
        game_id: GameId,
        player_id: PlayerId,
        connection_id: ConnectionId,
        sender: Sender<OutboundEnvelope>,
    ) {
        let mut games = self.games.lock().unwrap();
        let seats = games.entry(game_id).or_default();
        seats.insert(
            player_id,
            Seat {
                connection_id,
                sender,
            },
        );
    }

    /// Removes the seat only if it is still held by `connection_id` — a
    /// newer reconnect must not be unregistered by the old connection's
    /// delayed teardown.
    pub fn unregister(&self, game_id: GameId, player_id: PlayerId, connection_id: ConnectionId) {
        let mut games = self.games.lock().unwrap();
        if let Some(seats) = games.get_mut(&game_id) {
            if seats.get(&player_id).is_some_and(|s| s.connection_id == connection_id) {
                seats.remove(&player_id);
            }
            if seats.is_empty() {
                games.remove(&game_id);
            }
        }
    }

    /// Non-blocking: a connection whose queue is full is already behind the
    /// authoritative state, so the frame is dropped and logged rather than
    /// stalling the broadcaster for every other player.
    pub fn send_to(&self, game_id: GameId, player_id: PlayerId, envelope: OutboundEnvelope) {
        let games = self.games.lock().unwrap();
        if let Some(seats) = games.get(&game_id) {
            if let Some(seat) = seats.get(&player_id) {
                if let Err(TrySendError::Full(_)) = seat.sender.try_send(envelope) {
                    tracing::warn!(%game_id, %player_id, "outbound queue full, dropping frame");
                }
            }
        }
    }

    pub fn connected_player_ids(&self, game_id: GameId) -> Vec<PlayerId> {
        let games = self.games.lock().unwrap();
        games
            .get(&game_id)
            .map(|seats| seats.keys().copied().collect())
            .unwrap_or_default()
    }
}
