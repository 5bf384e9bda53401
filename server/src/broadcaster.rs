//! Personalized broadcast (C9): pushes `gameUpdated` to every connected
//! player in a game, each with their own view of the game (see `dto.rs`).

use std::sync::Arc;

use engine::game::{Game, GameId};
use engine::player::PlayerId;
use protocol::{GameUpdatedPayload, OutboundMessage, PlayerDisconnectedPayload};

use crate::dto::personalized_game_dto;
use crate::hub::Hub;

/// Sends `gameUpdated` to every player the hub currently has a connection
/// for, each rendered from their own point of view.
pub fn broadcast_game_updated(hub: &Hub, game: &Arc<Game>) {
    let game_id = game.id;
    for player_id in hub.connected_player_ids(game_id) {
        send_game_updated_to(hub, game, player_id);
    }
}

pub fn send_game_updated_to(hub: &Hub, game: &Arc<Game>, viewer: PlayerId) {
    let dto = personalized_game_dto(game, viewer);
    let envelope = OutboundMessage::GameUpdated(GameUpdatedPayload { game: dto })
        .into_envelope(Some(game.id.to_string()));
    hub.send_to(game.id, viewer, envelope);
}

/// Broadcasts `playerDisconnected` to every remaining connected player.
pub fn broadcast_player_disconnected(
    hub: &Hub,
    game: &Arc<Game>,
    disconnected_player_id: PlayerId,
    disconnected_player_name: String,
) {
    let game_id = game.id;
    for viewer in hub.connected_player_ids(game_id) {
        let dto = personalized_game_dto(game, viewer);
        let envelope = OutboundMessage::PlayerDisconnected(PlayerDisconnectedPayload {
            player_id: disconnected_player_id.to_string(),
            player_name: disconnected_player_name.clone(),
            game: dto,
        })
        .into_envelope(Some(game_id.to_string()));
        hub.send_to(game_id, viewer, envelope);
    }
}
