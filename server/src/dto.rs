//! Personalized DTO mapping (part of C9): turns the authoritative `Game`
//! into the JSON shape a specific viewer is allowed to see. Opponent hands
//! are collapsed to a count; the viewer's own hand is left intact.

use engine::game::Game;
use engine::player::{Player, PlayerId};
use engine::tiles::TileBaseType;
use protocol::{GlobalParametersDto, PendingTileSelectionDto, PersonalizedGameDto, PlayerDto, ResourcesDto, TileDto};

pub(crate) fn resources_dto(resources: &engine::player::ResourcePool) -> ResourcesDto {
    ResourcesDto {
        credits: resources.credits,
        steel: resources.steel,
        titanium: resources.titanium,
        plants: resources.plants,
        energy: resources.energy,
        heat: resources.heat,
    }
}

fn player_dto(player: &Player, viewer: PlayerId) -> PlayerDto {
    let is_self = player.id == viewer;
    PlayerDto {
        id: player.id.to_string(),
        name: player.name.clone(),
        resources: resources_dto(&player.resources),
        production: resources_dto(&player.production),
        terraform_rating: player.terraform_rating,
        played_cards: player.played_cards.clone(),
        hand: if is_self { player.hand.clone() } else { Vec::new() },
        hand_count: player.hand.len(),
        connected: player.connected,
    }
}

/// Builds the DTO that game state should be rendered as for `viewer`.
pub fn personalized_game_dto(game: &Game, viewer: PlayerId) -> PersonalizedGameDto {
    let global_parameters = game.global_parameters();
    let board: Vec<TileDto> = game.with_board(|board| {
        board
            .positions()
            .map(|position| {
                let tile = board.get(&position).expect("position came from this board");
                TileDto {
                    position: position.key(),
                    tile_kind: tile.occupant.as_ref().map(|o| format!("{:?}", o.kind)),
                    owner_id: tile.occupant.as_ref().and_then(|o| o.owner).map(|id| id.to_string()),
                    ocean_reserved: tile.base_type == TileBaseType::OceanReserved,
                }
            })
            .collect()
    });

    let mut players: Vec<PlayerDto> = game
        .all_player_ids()
        .into_iter()
        .filter_map(|id| game.clone_player(id))
        .map(|player| player_dto(&player, viewer))
        .collect();
    players.sort_by(|a, b| a.id.cmp(&b.id));

    let pending_tile_selection = game
        .clone_player(viewer)
        .and_then(|p| p.pending_tile_selection)
        .map(|selection| PendingTileSelectionDto {
            tile_kind: format!("{:?}", selection.tile_kind),
            available_hexes: selection.available_hexes.iter().map(|h| h.key()).collect(),
        });

    PersonalizedGameDto {
        id: game.id.to_string(),
        status: format!("{:?}", game.status()),
        phase: format!("{:?}", game.phase()),
        generation: game.generation(),
        global_parameters: GlobalParametersDto {
            temperature: global_parameters.temperature,
            oxygen: global_parameters.oxygen,
            oceans: global_parameters.oceans,
        },
        board,
        players,
        current_turn_player_id: game.current_turn().player_id.map(|id| id.to_string()),
        pending_tile_selection,
    }
}
