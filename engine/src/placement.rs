//! Tile placement (C6): legal-position queries and the placement mutation
//! itself.
//!
//! This module only knows about the board and the ocean counter; it takes
//! no `Game` reference so `game.rs` can depend on it without a cycle. It
//! never touches the event bus — publishing `TilePlaced`/`PlacementBonusGained`
//! is `Game::place_tile`'s job, done after its write lock is released.

use crate::board::Board;
use crate::error::EngineError;
use crate::hex::HexPosition;
use crate::player::{PlayerId, Resource};
use crate::tiles::{Bonus, Occupant, TileBaseType, TileKind};

pub const MAX_OCEANS: u8 = 9;

#[derive(Debug)]
pub struct PlacementResult {
    pub position: HexPosition,
    pub tile_kind: TileKind,
    pub owner: PlayerId,
    pub bonuses: Vec<Bonus>,
}

/// Whether `tile_kind` is legal at `position`, given the board's current
/// occupancy. Does not check the global ocean cap (that's checked in
/// `process_tile_placement` against the live counter).
fn is_legal(board: &Board, position: &HexPosition, tile_kind: TileKind) -> bool {
    let Some(tile) = board.get(position) else {
        return false;
    };
    if tile.is_occupied() {
        return false;
    }
    match tile_kind {
        TileKind::Ocean => tile.base_type == TileBaseType::OceanReserved,
        TileKind::City => {
            tile.base_type == TileBaseType::Land
                && !position.neighbors().iter().any(|n| {
                    board
                        .get(n)
                        .and_then(|t| t.occupant.as_ref())
                        .is_some_and(|o| o.kind == TileKind::City)
                })
        }
        TileKind::Greenery | TileKind::SpecialRestricted => tile.base_type == TileBaseType::Land,
    }
}

/// All positions where `tile_kind` could legally be placed right now.
pub fn calculate_available_positions(board: &Board, tile_kind: TileKind) -> Vec<HexPosition> {
    board
        .positions()
        .filter(|p| is_legal(board, p, tile_kind))
        .collect()
}

/// Places `tile_kind` at `position` on behalf of `owner`. Mutates the board
/// only; the caller publishes `TilePlaced`/`PlacementBonusGained` from the
/// returned `PlacementResult` once it has released its own lock, so this
/// function never touches the event bus itself.
pub fn process_tile_placement(
    board: &mut Board,
    oceans: &mut u8,
    position: HexPosition,
    tile_kind: TileKind,
    owner: PlayerId,
) -> Result<PlacementResult, EngineError> {
    let tile = board.get(&position).ok_or(EngineError::TileNotFound)?;
    if tile.is_occupied() {
        return Err(EngineError::TileAlreadyOccupied);
    }
    match tile_kind {
        TileKind::Ocean if tile.base_type != TileBaseType::OceanReserved => {
            return Err(EngineError::WrongTileType);
        }
        TileKind::Ocean if *oceans >= MAX_OCEANS => {
            return Err(EngineError::ParameterMaxed);
        }
        TileKind::City
            if position.neighbors().iter().any(|n| {
                board
                    .get(n)
                    .and_then(|t| t.occupant.as_ref())
                    .is_some_and(|o| o.kind == TileKind::City)
            }) =>
        {
            return Err(EngineError::AdjacencyViolation);
        }
        TileKind::City | TileKind::Greenery | TileKind::SpecialRestricted
            if tile.base_type != TileBaseType::Land =>
        {
            return Err(EngineError::WrongTileType);
        }
        _ => {}
    }

    let bonuses = tile.bonuses.clone();
    let tile_mut = board.get_mut(&position).expect("checked above");
    tile_mut.occupant = Some(Occupant {
        kind: tile_kind,
        owner: Some(owner),
    });

    if tile_kind == TileKind::Ocean {
        *oceans += 1;
    }

    Ok(PlacementResult {
        position,
        tile_kind,
        owner,
        bonuses,
    })
}

pub fn resource_sum(bonuses: &[Bonus], resource: Resource) -> i32 {
    bonuses
        .iter()
        .filter(|(r, _)| *r == resource)
        .map(|(_, amount)| *amount)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn ocean_can_only_be_placed_on_reserved_tiles() {
        let board = Board::generate_standard();
        let ocean_positions = calculate_available_positions(&board, TileKind::Ocean);
        assert_eq!(ocean_positions.len(), 9);
        for position in ocean_positions {
            assert_eq!(
                board.get(&position).unwrap().base_type,
                TileBaseType::OceanReserved
            );
        }
    }

    #[test]
    fn city_adjacent_to_city_is_rejected() {
        let mut board = Board::generate_standard();
        let mut oceans = 0u8;
        let owner = Uuid::new_v4();
        let land_positions = calculate_available_positions(&board, TileKind::City);
        let first = land_positions[0];
        process_tile_placement(&mut board, &mut oceans, first, TileKind::City, owner).unwrap();
        let neighbor = first.neighbors()[0];
        if board.contains(&neighbor) {
            let result = process_tile_placement(&mut board, &mut oceans, neighbor, TileKind::City, owner);
            assert_eq!(result.unwrap_err(), EngineError::AdjacencyViolation);
        }
    }

    #[test]
    fn placing_an_ocean_increments_the_counter_and_caps_at_max() {
        let mut board = Board::generate_standard();
        let mut oceans = 0u8;
        let owner = Uuid::new_v4();
        let ocean_positions = calculate_available_positions(&board, TileKind::Ocean);
        for position in &ocean_positions {
            process_tile_placement(&mut board, &mut oceans, *position, TileKind::Ocean, owner).unwrap();
        }
        assert_eq!(oceans, MAX_OCEANS);
    }

    #[test]
    fn double_placement_on_the_same_tile_is_rejected() {
        let mut board = Board::generate_standard();
        let mut oceans = 0u8;
        let owner = Uuid::new_v4();
        let position = calculate_available_positions(&board, TileKind::Greenery)[0];
        process_tile_placement(&mut board, &mut oceans, position, TileKind::Greenery, owner).unwrap();
        let result =
            process_tile_placement(&mut board, &mut oceans, position, TileKind::Greenery, owner);
        assert_eq!(result.unwrap_err(), EngineError::TileAlreadyOccupied);
    }
}
