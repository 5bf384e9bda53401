//! Message handlers (C10): the single entry point a connection task calls
//! into for every decoded inbound frame, plus the teardown hook a dropped
//! connection calls into. Dispatch for `playAction` itself lives in
//! `actions.rs`.

use std::sync::Arc;

use tokio::sync::mpsc::Sender;

use engine::effects::EffectRegistry;
use engine::game::{Game, GameId};
use engine::player::{Player, PlayerId, Resource};
use engine::hex::HexPosition;
use protocol::{
    ConfirmCardDrawPayload, InboundMessage, OutboundEnvelope, OutboundMessage,
    PlayActionPayload, PlayerConnectPayload, PlayerReconnectPayload,
    ProductionPhaseStartedPayload, SelectStartingCardsPayload, SelectTilePayload,
};

use crate::actions;
use crate::broadcaster;
use crate::dto::resources_dto;
use crate::error::HandlerError;
use crate::hub::ConnectionId;
use crate::state::{stable_id, AppState, ManagedGame};

async fn get_or_insert_game(state: &AppState, game_id: GameId, host_player_id: PlayerId) -> Arc<ManagedGame> {
    let mut games = state.games.lock().await;
    if let Some(existing) = games.get(&game_id) {
        return existing.clone();
    }
    let settings = state.config.read().await.default_game_settings();
    let managed = Arc::new(ManagedGame {
        game: Arc::new(Game::new(game_id, host_player_id, settings)),
        effects: EffectRegistry::new(),
    });
    games.insert(game_id, managed.clone());
    managed
}

async fn get_game(state: &AppState, game_id: GameId) -> Result<Arc<ManagedGame>, HandlerError> {
    state
        .games
        .lock()
        .await
        .get(&game_id)
        .cloned()
        .ok_or_else(|| HandlerError::UnknownGame(game_id.to_string()))
}

fn require_identity(identity: &Option<(GameId, PlayerId)>) -> Result<(GameId, PlayerId), HandlerError> {
    identity.ok_or(HandlerError::NotIdentified)
}

/// Routes one decoded frame to its handler. `identity` is populated by a
/// successful `playerConnect`/`playerReconnect` and carried for the rest of
/// the connection's lifetime.
pub async fn handle_message(
    state: &Arc<AppState>,
    identity: &mut Option<(GameId, PlayerId)>,
    connection_id: ConnectionId,
    outbound_tx: &Sender<OutboundEnvelope>,
    message: InboundMessage,
) -> Result<(), HandlerError> {
    match message {
        InboundMessage::PlayerConnect(payload) => {
            handle_player_connect(state, identity, connection_id, outbound_tx, payload).await
        }
        InboundMessage::PlayerReconnect(payload) => {
            handle_player_reconnect(state, identity, connection_id, outbound_tx, payload).await
        }
        InboundMessage::PlayAction(payload) => handle_play_action(state, identity, payload).await,
        InboundMessage::SelectStartingCards(payload) => {
            handle_select_starting_cards(state, identity, payload).await
        }
        InboundMessage::SelectTile(payload) => handle_select_tile(state, identity, payload).await,
        InboundMessage::ConfirmCardDraw(payload) => {
            handle_confirm_card_draw(state, identity, payload).await
        }
        InboundMessage::PassGeneration => handle_pass_generation(state, identity).await,
    }
}

async fn handle_player_connect(
    state: &Arc<AppState>,
    identity: &mut Option<(GameId, PlayerId)>,
    connection_id: ConnectionId,
    outbound_tx: &Sender<OutboundEnvelope>,
    payload: PlayerConnectPayload,
) -> Result<(), HandlerError> {
    let game_id = stable_id(&payload.game_id);
    let player_id = stable_id(&payload.player_id);
    let managed = get_or_insert_game(state, game_id, player_id).await;

    if managed.game.clone_player(player_id).is_none() {
        managed.game.add_player(Player::new(player_id, payload.player_name))?;
    } else {
        managed.game.set_connected(player_id, true)?;
    }

    // A lobby becomes active as soon as it has a player to run turns for;
    // start_game() is a no-op error once the game is already active, so
    // every subsequent connect just falls through.
    let _ = managed.game.start_game();

    state.hub.register(game_id, player_id, connection_id, outbound_tx.clone());
    *identity = Some((game_id, player_id));
    broadcaster::broadcast_game_updated(&state.hub, &managed.game);
    Ok(())
}

async fn handle_player_reconnect(
    state: &Arc<AppState>,
    identity: &mut Option<(GameId, PlayerId)>,
    connection_id: ConnectionId,
    outbound_tx: &Sender<OutboundEnvelope>,
    payload: PlayerReconnectPayload,
) -> Result<(), HandlerError> {
    let game_id = stable_id(&payload.game_id);
    let player_id = stable_id(&payload.player_id);
    let managed = get_game(state, game_id).await?;

    if managed.game.clone_player(player_id).is_none() {
        return Err(HandlerError::UnknownPlayer(payload.player_id));
    }
    managed.game.set_connected(player_id, true)?;

    // Registering here evicts whatever connection previously held this
    // seat — that stale connection's write_pump will see its channel
    // close and tear itself down.
    state.hub.register(game_id, player_id, connection_id, outbound_tx.clone());
    *identity = Some((game_id, player_id));
    broadcaster::broadcast_game_updated(&state.hub, &managed.game);
    Ok(())
}

async fn handle_play_action(
    state: &Arc<AppState>,
    identity: &mut Option<(GameId, PlayerId)>,
    payload: PlayActionPayload,
) -> Result<(), HandlerError> {
    let (game_id, player_id) = require_identity(identity)?;
    let managed = get_game(state, game_id).await?;
    managed.game.consume_turn_action(player_id)?;
    actions::dispatch(
        &managed,
        &state.catalog,
        player_id,
        &payload.action_type,
        &payload.action_payload,
    )?;
    broadcaster::broadcast_game_updated(&state.hub, &managed.game);
    Ok(())
}

async fn handle_select_starting_cards(
    state: &Arc<AppState>,
    identity: &mut Option<(GameId, PlayerId)>,
    payload: SelectStartingCardsPayload,
) -> Result<(), HandlerError> {
    let (game_id, player_id) = require_identity(identity)?;
    let managed = get_game(state, game_id).await?;
    managed.game.add_cards_to_hand(player_id, payload.card_ids)?;
    managed.game.set_corporation(player_id, payload.corp_id)?;
    managed
        .game
        .apply_resource_changes(player_id, &[(Resource::Credits, -payload.cost)])?;
    broadcaster::broadcast_game_updated(&state.hub, &managed.game);
    Ok(())
}

async fn handle_select_tile(
    state: &Arc<AppState>,
    identity: &mut Option<(GameId, PlayerId)>,
    payload: SelectTilePayload,
) -> Result<(), HandlerError> {
    let (game_id, player_id) = require_identity(identity)?;
    let managed = get_game(state, game_id).await?;
    managed.game.require_current_turn(player_id)?;
    let position = HexPosition::parse_key(&payload.coord).ok_or(HandlerError::InvalidHex)?;
    managed.game.place_tile(player_id, position)?;
    broadcaster::broadcast_game_updated(&state.hub, &managed.game);
    Ok(())
}

async fn handle_confirm_card_draw(
    state: &Arc<AppState>,
    identity: &mut Option<(GameId, PlayerId)>,
    payload: ConfirmCardDrawPayload,
) -> Result<(), HandlerError> {
    let (game_id, player_id) = require_identity(identity)?;
    let managed = get_game(state, game_id).await?;
    managed.game.add_cards_to_hand(player_id, payload.card_ids)?;
    broadcaster::broadcast_game_updated(&state.hub, &managed.game);
    Ok(())
}

async fn handle_pass_generation(
    state: &Arc<AppState>,
    identity: &mut Option<(GameId, PlayerId)>,
) -> Result<(), HandlerError> {
    let (game_id, _player_id) = require_identity(identity)?;
    let managed = get_game(state, game_id).await?;
    managed.game.advance_generation()?;

    let players_data: Vec<protocol::PlayerProductionDto> = managed
        .game
        .all_player_ids()
        .into_iter()
        .filter_map(|id| managed.game.clone_player(id))
        .map(|p| protocol::PlayerProductionDto {
            player_id: p.id.to_string(),
            production: resources_dto(&p.production),
        })
        .collect();

    for viewer in state.hub.connected_player_ids(game_id) {
        let envelope = OutboundMessage::ProductionPhaseStarted(ProductionPhaseStartedPayload {
            players_data: players_data.clone(),
        })
        .into_envelope(Some(game_id.to_string()));
        state.hub.send_to(game_id, viewer, envelope);
    }

    broadcaster::broadcast_game_updated(&state.hub, &managed.game);
    Ok(())
}

/// Called once a connection's tasks have both wound down. Marks the player
/// disconnected (if they ever identified) and lets everyone else know.
pub async fn handle_disconnect(
    state: &Arc<AppState>,
    identity: Option<(GameId, PlayerId)>,
    connection_id: ConnectionId,
) {
    let Some((game_id, player_id)) = identity else {
        return;
    };
    state.hub.unregister(game_id, player_id, connection_id);
    let Some(managed) = state.games.lock().await.get(&game_id).cloned() else {
        return;
    };
    let _ = managed.game.set_connected(player_id, false);
    let name = managed.game.clone_player(player_id).map(|p| p.name).unwrap_or_default();
    broadcaster::broadcast_player_disconnected(&state.hub, &managed.game, player_id, name);
}
