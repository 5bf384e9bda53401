//! The hex grid (C1): tile storage and standard-board generation.

use std::collections::HashMap;

use crate::hex::{standard_layout_with_reservations, HexPosition};
use crate::tiles::Tile;

#[derive(Debug, Clone)]
pub struct Board {
    tiles: HashMap<String, Tile>,
}

impl Board {
    /// Generates the standard board: every position from the standard
    /// layout, with ocean-reserved positions marked and all others land
    /// tiles with no starting bonuses.
    pub fn generate_standard() -> Self {
        let mut tiles = HashMap::new();
        for (position, is_ocean) in standard_layout_with_reservations() {
            let tile = if is_ocean {
                Tile::ocean_reserved()
            } else {
                Tile::land(Vec::new())
            };
            tiles.insert(position.key(), tile);
        }
        Board { tiles }
    }

    pub fn get(&self, position: &HexPosition) -> Option<&Tile> {
        self.tiles.get(&position.key())
    }

    pub fn get_mut(&mut self, position: &HexPosition) -> Option<&mut Tile> {
        self.tiles.get_mut(&position.key())
    }

    pub fn contains(&self, position: &HexPosition) -> bool {
        self.tiles.contains_key(&position.key())
    }

    pub fn positions(&self) -> impl Iterator<Item = HexPosition> + '_ {
        self.tiles.keys().filter_map(|k| HexPosition::parse_key(k))
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn ocean_reserved_count(&self) -> usize {
        self.tiles
            .values()
            .filter(|t| matches!(t.base_type, crate::tiles::TileBaseType::OceanReserved))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_board_has_the_expected_cardinality() {
        let board = Board::generate_standard();
        assert_eq!(board.len(), 61);
        assert_eq!(board.ocean_reserved_count(), 9);
    }

    #[test]
    fn every_generated_position_is_addressable() {
        let board = Board::generate_standard();
        for position in board.positions() {
            assert!(board.get(&position).is_some());
        }
    }
}
