//! Game state aggregate (C3): the single source of truth for one game,
//! guarded by a write lock, with all mutators following the same shape —
//! mutate while holding the lock, then publish events after releasing it.

use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

use crate::board::Board;
use crate::error::EngineError;
use crate::event_bus::{EventBus, GameEvent};
use crate::hex::HexPosition;
use crate::placement::{self, PlacementResult};
use crate::player::{CardId, Player, PlayerId, Resource};
use crate::tile_queue::PendingTileSelection;
use crate::tiles::TileKind;

pub type GameId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Lobby,
    Active,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    WaitingForStart,
    StartingCardSelection,
    Action,
    ProductionAndCardDraw,
    Complete,
}

#[derive(Debug, Clone, Copy)]
pub struct GlobalParameters {
    pub temperature: i32,
    pub oxygen: u8,
    pub oceans: u8,
}

impl Default for GlobalParameters {
    fn default() -> Self {
        GlobalParameters {
            temperature: -30,
            oxygen: 0,
            oceans: 0,
        }
    }
}

pub const MAX_TEMPERATURE: i32 = 8;
pub const MIN_TEMPERATURE: i32 = -30;
pub const MAX_OXYGEN: u8 = 14;

#[derive(Debug, Clone)]
pub struct CurrentTurn {
    pub player_id: Option<PlayerId>,
    pub actions_remaining: u8,
}

#[derive(Debug, Clone, Copy)]
pub struct GameSettings {
    pub max_players: u8,
    pub corporate_era: bool,
    pub draft_variant: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        GameSettings {
            max_players: 5,
            corporate_era: true,
            draft_variant: false,
        }
    }
}

struct GameInner {
    status: GameStatus,
    phase: GamePhase,
    generation: u32,
    board: Board,
    players: HashMap<PlayerId, Player>,
    turn_order: Vec<PlayerId>,
    current_turn: CurrentTurn,
    global_params: GlobalParameters,
    updated_at: u64,
}

pub struct Game {
    pub id: GameId,
    pub host_player_id: PlayerId,
    pub settings: GameSettings,
    pub event_bus: EventBus,
    pub created_at: u64,
    inner: RwLock<GameInner>,
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl Game {
    pub fn new(id: GameId, host_player_id: PlayerId, settings: GameSettings) -> Self {
        let now = now_unix();
        Game {
            id,
            host_player_id,
            settings,
            event_bus: EventBus::default(),
            created_at: now,
            inner: RwLock::new(GameInner {
                status: GameStatus::Lobby,
                phase: GamePhase::WaitingForStart,
                generation: 1,
                board: Board::generate_standard(),
                players: HashMap::new(),
                turn_order: Vec::new(),
                current_turn: CurrentTurn {
                    player_id: None,
                    actions_remaining: 0,
                },
                global_params: GlobalParameters::default(),
                updated_at: now,
            }),
        }
    }

    pub fn status(&self) -> GameStatus {
        self.inner.read().unwrap().status
    }

    pub fn phase(&self) -> GamePhase {
        self.inner.read().unwrap().phase
    }

    pub fn generation(&self) -> u32 {
        self.inner.read().unwrap().generation
    }

    pub fn global_parameters(&self) -> GlobalParameters {
        self.inner.read().unwrap().global_params
    }

    pub fn player_count(&self) -> usize {
        self.inner.read().unwrap().players.len()
    }

    pub fn with_player<T>(&self, player_id: PlayerId, f: impl FnOnce(&Player) -> T) -> Option<T> {
        self.inner.read().unwrap().players.get(&player_id).map(f)
    }

    pub fn clone_player(&self, player_id: PlayerId) -> Option<Player> {
        self.inner.read().unwrap().players.get(&player_id).cloned()
    }

    pub fn all_player_ids(&self) -> Vec<PlayerId> {
        self.inner.read().unwrap().players.keys().copied().collect()
    }

    pub fn current_turn(&self) -> CurrentTurn {
        self.inner.read().unwrap().current_turn.clone()
    }

    pub fn with_board<T>(&self, f: impl FnOnce(&Board) -> T) -> T {
        f(&self.inner.read().unwrap().board)
    }

    /// Enforces "it's your turn and you have actions left," then spends one
    /// action. Must be called before any handler mutates state on behalf of
    /// `player_id`; does not itself publish, since failing this check must
    /// never be observable as a state change.
    pub fn consume_turn_action(&self, player_id: PlayerId) -> Result<(), EngineError> {
        let mut inner = self.inner.write().unwrap();
        if inner.current_turn.player_id != Some(player_id) {
            return Err(EngineError::NotYourTurn);
        }
        if inner.current_turn.actions_remaining == 0 {
            return Err(EngineError::NoActionsRemaining);
        }
        inner.current_turn.actions_remaining -= 1;
        Ok(())
    }

    /// Enforces "it's your turn" without spending an action — used by
    /// handlers that resolve a pending tile selection rather than open a
    /// new action (the budget was already spent by the `playAction` that
    /// queued the selection).
    pub fn require_current_turn(&self, player_id: PlayerId) -> Result<(), EngineError> {
        let inner = self.inner.read().unwrap();
        if inner.current_turn.player_id != Some(player_id) {
            return Err(EngineError::NotYourTurn);
        }
        Ok(())
    }

    pub fn add_player(&self, player: Player) -> Result<(), EngineError> {
        let player_id = player.id;
        {
            let mut inner = self.inner.write().unwrap();
            if inner.status != GameStatus::Lobby {
                return Err(EngineError::GameNotActive);
            }
            inner.turn_order.push(player_id);
            inner.players.insert(player_id, player);
            inner.updated_at = now_unix();
        }
        self.event_bus.publish(GameEvent::PlayerJoined { player_id });
        self.event_bus.publish(GameEvent::GameStateChanged);
        Ok(())
    }

    pub fn start_game(&self) -> Result<(), EngineError> {
        let (old_status, old_phase, first_player) = {
            let mut inner = self.inner.write().unwrap();
            if inner.status != GameStatus::Lobby {
                return Err(EngineError::GameNotActive);
            }
            let old_status = inner.status;
            let old_phase = inner.phase;
            inner.status = GameStatus::Active;
            inner.phase = GamePhase::Action;
            let first_player = inner.turn_order.first().copied();
            inner.current_turn = CurrentTurn {
                player_id: first_player,
                actions_remaining: 2,
            };
            inner.updated_at = now_unix();
            (old_status, old_phase, first_player)
        };
        self.event_bus.publish(GameEvent::GameStatusChanged {
            old: old_status,
            new: GameStatus::Active,
        });
        self.event_bus.publish(GameEvent::GamePhaseChanged {
            old: old_phase,
            new: GamePhase::Action,
        });
        if let Some(player_id) = first_player {
            let _ = player_id;
        }
        self.event_bus.publish(GameEvent::GameStateChanged);
        Ok(())
    }

    pub fn apply_resource_changes(
        &self,
        player_id: PlayerId,
        changes: &[(Resource, i32)],
    ) -> Result<(), EngineError> {
        {
            let mut inner = self.inner.write().unwrap();
            let player = inner
                .players
                .get_mut(&player_id)
                .ok_or(EngineError::PlayerNotFound)?;
            for (resource, amount) in changes {
                player.resources.add(*resource, *amount);
            }
            inner.updated_at = now_unix();
        }
        self.event_bus.publish(GameEvent::ResourcesChanged {
            player_id,
            changes: changes.to_vec(),
        });
        Ok(())
    }

    pub fn raise_terraform_rating(&self, player_id: PlayerId, steps: i32) -> Result<(), EngineError> {
        let (old, new) = {
            let mut inner = self.inner.write().unwrap();
            let player = inner
                .players
                .get_mut(&player_id)
                .ok_or(EngineError::PlayerNotFound)?;
            let old = player.terraform_rating;
            player.terraform_rating += steps;
            (old, player.terraform_rating)
        };
        self.event_bus.publish(GameEvent::TerraformRatingChanged {
            player_id,
            old,
            new,
        });
        Ok(())
    }

    pub fn raise_temperature(&self, actor: PlayerId, steps: i32) -> Result<(), EngineError> {
        let (old, new, applied_steps) = {
            let mut inner = self.inner.write().unwrap();
            if !inner.players.contains_key(&actor) {
                return Err(EngineError::PlayerNotFound);
            }
            let old = inner.global_params.temperature;
            if old >= MAX_TEMPERATURE {
                return Err(EngineError::ParameterMaxed);
            }
            let raw_new = old + steps * 2;
            let new = raw_new.min(MAX_TEMPERATURE);
            let applied_steps = (new - old) / 2;
            inner.global_params.temperature = new;
            inner.updated_at = now_unix();
            (old, new, applied_steps)
        };
        if new != old {
            self.event_bus
                .publish(GameEvent::TemperatureChanged { old, new });
            self.raise_terraform_rating(actor, applied_steps)?;
        }
        Ok(())
    }

    pub fn raise_oxygen(&self, actor: PlayerId, steps: i32) -> Result<(), EngineError> {
        let (old, new, applied_steps) = {
            let mut inner = self.inner.write().unwrap();
            if !inner.players.contains_key(&actor) {
                return Err(EngineError::PlayerNotFound);
            }
            let old = inner.global_params.oxygen;
            if old >= MAX_OXYGEN {
                return Err(EngineError::ParameterMaxed);
            }
            let raw_new = old as i32 + steps;
            let new = raw_new.min(MAX_OXYGEN as i32) as u8;
            let applied_steps = new as i32 - old as i32;
            inner.global_params.oxygen = new;
            inner.updated_at = now_unix();
            (old, new, applied_steps)
        };
        if new != old {
            self.event_bus.publish(GameEvent::OxygenChanged { old, new });
            self.raise_terraform_rating(actor, applied_steps)?;
        }
        Ok(())
    }

    /// Replaces a player's pending tile queue outright. Auto-advances into
    /// the first selection only on an empty-to-non-empty transition; a
    /// queue that is already active keeps its in-flight selection.
    pub fn set_pending_tile_queue(
        &self,
        player_id: PlayerId,
        items: Vec<TileKind>,
        source: CardId,
    ) -> Result<(), EngineError> {
        let was_empty = {
            let mut inner = self.inner.write().unwrap();
            let player = inner
                .players
                .get_mut(&player_id)
                .ok_or(EngineError::PlayerNotFound)?;
            let was_empty = player.pending_tile_queue.is_empty() && player.pending_tile_selection.is_none();
            player.pending_tile_queue =
                VecDeque::from_iter(items.into_iter().map(|kind| (kind, source.clone())));
            inner.updated_at = now_unix();
            was_empty
        };
        let queue_size = self
            .with_player(player_id, |p| p.pending_tile_queue.len())
            .unwrap_or(0);
        self.event_bus.publish(GameEvent::TileQueueCreated {
            player_id,
            queue_size,
            source,
        });
        if was_empty {
            self.process_next_tile(player_id)?;
        }
        Ok(())
    }

    /// Appends to a player's pending tile queue. Always allowed, even while
    /// a selection is already in progress; only triggers auto-advance on an
    /// empty-to-non-empty transition.
    pub fn append_pending_tile_queue(
        &self,
        player_id: PlayerId,
        items: Vec<TileKind>,
        source: CardId,
    ) -> Result<(), EngineError> {
        let was_empty = {
            let mut inner = self.inner.write().unwrap();
            let player = inner
                .players
                .get_mut(&player_id)
                .ok_or(EngineError::PlayerNotFound)?;
            let was_empty = player.pending_tile_queue.is_empty() && player.pending_tile_selection.is_none();
            player
                .pending_tile_queue
                .extend(items.into_iter().map(|kind| (kind, source.clone())));
            inner.updated_at = now_unix();
            was_empty
        };
        let queue_size = self
            .with_player(player_id, |p| p.pending_tile_queue.len())
            .unwrap_or(0);
        self.event_bus.publish(GameEvent::TileQueueCreated {
            player_id,
            queue_size,
            source,
        });
        if was_empty {
            self.process_next_tile(player_id)?;
        }
        Ok(())
    }

    /// Pops the next queued tile kind and computes its available hexes. If
    /// no legal hex exists for a kind, it is skipped (logged) rather than
    /// leaving the player stuck on an impossible selection.
    pub fn process_next_tile(&self, player_id: PlayerId) -> Result<(), EngineError> {
        loop {
            let next = {
                let mut inner = self.inner.write().unwrap();
                let player = inner
                    .players
                    .get_mut(&player_id)
                    .ok_or(EngineError::PlayerNotFound)?;
                player.pending_tile_queue.pop_front()
            };
            let Some((tile_kind, source)) = next else {
                let mut inner = self.inner.write().unwrap();
                if let Some(player) = inner.players.get_mut(&player_id) {
                    player.pending_tile_selection = None;
                }
                drop(inner);
                self.event_bus.publish(GameEvent::GameStateChanged);
                return Ok(());
            };
            let available_hexes = {
                let inner = self.inner.read().unwrap();
                placement::calculate_available_positions(&inner.board, tile_kind)
            };
            if available_hexes.is_empty() {
                tracing::warn!(?tile_kind, %player_id, "no legal hex for queued tile, skipping");
                continue;
            }
            {
                let mut inner = self.inner.write().unwrap();
                if let Some(player) = inner.players.get_mut(&player_id) {
                    player.pending_tile_selection = Some(PendingTileSelection {
                        tile_kind,
                        available_hexes,
                        source,
                    });
                }
            }
            self.event_bus.publish(GameEvent::GameStateChanged);
            return Ok(());
        }
    }

    /// Resolves the player's active tile selection against a chosen hex.
    pub fn place_tile(
        &self,
        player_id: PlayerId,
        position: HexPosition,
    ) -> Result<PlacementResult, EngineError> {
        let tile_kind = {
            let inner = self.inner.read().unwrap();
            let player = inner.players.get(&player_id).ok_or(EngineError::PlayerNotFound)?;
            let selection = player
                .pending_tile_selection
                .as_ref()
                .ok_or(EngineError::InvalidSelection)?;
            if !selection.available_hexes.contains(&position) {
                return Err(EngineError::InvalidSelection);
            }
            selection.tile_kind
        };

        let result = {
            let mut inner = self.inner.write().unwrap();
            let oceans = inner.global_params.oceans;
            let mut oceans_mut = oceans;
            let result = placement::process_tile_placement(
                &mut inner.board,
                &mut oceans_mut,
                position,
                tile_kind,
                player_id,
            )?;
            inner.global_params.oceans = oceans_mut;
            if let Some(player) = inner.players.get_mut(&player_id) {
                player.pending_tile_selection = None;
            }
            inner.updated_at = now_unix();
            result
        };

        // Publish only after the write guard above has dropped: a subscriber
        // reacting to `TilePlaced` may itself call back into a `Game` mutator
        // that takes the same write lock, and `std::sync::RwLock` isn't
        // reentrant.
        self.event_bus.publish(GameEvent::TilePlaced {
            tile_kind: result.tile_kind,
            position: result.position,
            owner: Some(result.owner),
        });
        if !result.bonuses.is_empty() {
            self.event_bus.publish(GameEvent::PlacementBonusGained {
                player_id: result.owner,
                resources: result.bonuses.clone(),
            });
            self.apply_resource_changes(player_id, &result.bonuses)?;
        }
        self.process_next_tile(player_id)?;
        Ok(result)
    }

    pub fn set_corporation(&self, player_id: PlayerId, corporation: CardId) -> Result<(), EngineError> {
        {
            let mut inner = self.inner.write().unwrap();
            let player = inner
                .players
                .get_mut(&player_id)
                .ok_or(EngineError::PlayerNotFound)?;
            player.corporation = Some(corporation);
            inner.updated_at = now_unix();
        }
        self.event_bus.publish(GameEvent::GameStateChanged);
        Ok(())
    }

    pub fn add_cards_to_hand(&self, player_id: PlayerId, card_ids: Vec<CardId>) -> Result<(), EngineError> {
        {
            let mut inner = self.inner.write().unwrap();
            let player = inner
                .players
                .get_mut(&player_id)
                .ok_or(EngineError::PlayerNotFound)?;
            player.hand.extend(card_ids.iter().cloned());
            inner.updated_at = now_unix();
        }
        self.event_bus
            .publish(GameEvent::CardHandUpdated { player_id });
        Ok(())
    }

    pub fn play_card(&self, player_id: PlayerId, card_id: CardId) -> Result<(), EngineError> {
        {
            let mut inner = self.inner.write().unwrap();
            let player = inner
                .players
                .get_mut(&player_id)
                .ok_or(EngineError::PlayerNotFound)?;
            let position = player
                .hand
                .iter()
                .position(|c| *c == card_id)
                .ok_or(EngineError::UnknownCard(card_id.clone()))?;
            player.hand.remove(position);
            player.played_cards.push(card_id.clone());
            inner.updated_at = now_unix();
        }
        self.event_bus.publish(GameEvent::CardPlayed {
            player_id,
            card_id,
        });
        self.event_bus
            .publish(GameEvent::CardHandUpdated { player_id });
        Ok(())
    }

    pub fn add_player_effect(&self, player_id: PlayerId, effect: crate::player::CardEffect) -> Result<(), EngineError> {
        {
            let mut inner = self.inner.write().unwrap();
            let player = inner
                .players
                .get_mut(&player_id)
                .ok_or(EngineError::PlayerNotFound)?;
            player.effects.push(effect);
        }
        self.event_bus
            .publish(GameEvent::PlayerEffectsChanged { player_id });
        Ok(())
    }

    pub fn set_requirement_modifiers(
        &self,
        player_id: PlayerId,
        modifiers: HashMap<CardId, crate::player::RequirementModifier>,
    ) -> Result<(), EngineError> {
        let mut inner = self.inner.write().unwrap();
        let player = inner
            .players
            .get_mut(&player_id)
            .ok_or(EngineError::PlayerNotFound)?;
        player.requirement_modifiers = modifiers;
        Ok(())
    }

    pub fn advance_generation(&self) -> Result<(), EngineError> {
        let (old, new) = {
            let mut inner = self.inner.write().unwrap();
            let old = inner.generation;
            inner.generation += 1;
            inner.current_turn.actions_remaining = 2;
            inner.updated_at = now_unix();
            (old, inner.generation)
        };
        self.event_bus
            .publish(GameEvent::GenerationAdvanced { old, new });
        Ok(())
    }

    pub fn set_connected(&self, player_id: PlayerId, connected: bool) -> Result<(), EngineError> {
        let mut inner = self.inner.write().unwrap();
        let player = inner
            .players
            .get_mut(&player_id)
            .ok_or(EngineError::PlayerNotFound)?;
        player.connected = connected;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::Player;
    use uuid::Uuid;

    fn new_game_with_players(n: usize) -> (Game, Vec<PlayerId>) {
        let game = Game::new(Uuid::new_v4(), Uuid::new_v4(), GameSettings::default());
        let mut ids = Vec::new();
        for i in 0..n {
            let id = Uuid::new_v4();
            game.add_player(Player::new(id, format!("player-{i}"))).unwrap();
            ids.push(id);
        }
        (game, ids)
    }

    #[test]
    fn starting_a_game_moves_it_out_of_the_lobby() {
        let (game, _ids) = new_game_with_players(2);
        assert_eq!(game.status(), GameStatus::Lobby);
        game.start_game().unwrap();
        assert_eq!(game.status(), GameStatus::Active);
        assert_eq!(game.phase(), GamePhase::Action);
    }

    #[test]
    fn setting_a_tile_queue_auto_advances_into_the_first_selection() {
        let (game, ids) = new_game_with_players(1);
        let player = ids[0];
        game.set_pending_tile_queue(player, vec![TileKind::Greenery], "test".into())
            .unwrap();
        let awaiting = game
            .with_player(player, |p| p.pending_tile_selection.is_some())
            .unwrap();
        assert!(awaiting);
    }

    #[test]
    fn appending_while_awaiting_hex_does_not_disturb_the_active_selection() {
        let (game, ids) = new_game_with_players(1);
        let player = ids[0];
        game.set_pending_tile_queue(player, vec![TileKind::Greenery, TileKind::Greenery], "test".into())
            .unwrap();
        let first_selection_kind = game
            .with_player(player, |p| p.pending_tile_selection.as_ref().unwrap().tile_kind)
            .unwrap();
        game.append_pending_tile_queue(player, vec![TileKind::Ocean], "test2".into())
            .unwrap();
        let still_same_kind = game
            .with_player(player, |p| p.pending_tile_selection.as_ref().unwrap().tile_kind)
            .unwrap();
        assert_eq!(first_selection_kind, still_same_kind);
    }

    #[test]
    fn placing_a_tile_drains_the_queue_one_at_a_time() {
        let (game, ids) = new_game_with_players(1);
        let player = ids[0];
        game.set_pending_tile_queue(player, vec![TileKind::Greenery, TileKind::Greenery], "test".into())
            .unwrap();
        let hex = game
            .with_player(player, |p| p.pending_tile_selection.as_ref().unwrap().available_hexes[0])
            .unwrap();
        game.place_tile(player, hex).unwrap();
        let still_awaiting = game
            .with_player(player, |p| p.pending_tile_selection.is_some())
            .unwrap();
        assert!(still_awaiting, "second queued tile should now be up for selection");
    }

    #[test]
    fn placing_outside_the_offered_hexes_is_rejected() {
        let (game, ids) = new_game_with_players(1);
        let player = ids[0];
        game.set_pending_tile_queue(player, vec![TileKind::Ocean], "test".into())
            .unwrap();
        let bogus = HexPosition::new(1000, 1000);
        let result = game.place_tile(player, bogus);
        assert_eq!(result.unwrap_err(), EngineError::InvalidSelection);
    }

    #[test]
    fn raising_temperature_caps_at_the_maximum_and_stops_awarding_tr() {
        let (game, ids) = new_game_with_players(1);
        let player = ids[0];
        for _ in 0..30 {
            let _ = game.raise_temperature(player, 1);
        }
        assert_eq!(game.global_parameters().temperature, MAX_TEMPERATURE);
    }
}
