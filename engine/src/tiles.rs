//! Tile kinds and the occupied/unoccupied state of a single board hex.

use serde::{Deserialize, Serialize};

use crate::player::{PlayerId, Resource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    City,
    Greenery,
    Ocean,
    SpecialRestricted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileBaseType {
    Land,
    OceanReserved,
}

/// Placement bonus carried on a tile, granted to whoever places there.
pub type Bonus = (Resource, i32);

#[derive(Debug, Clone)]
pub struct Tile {
    pub base_type: TileBaseType,
    pub bonuses: Vec<Bonus>,
    pub occupant: Option<Occupant>,
}

#[derive(Debug, Clone)]
pub struct Occupant {
    pub kind: TileKind,
    pub owner: Option<PlayerId>,
}

impl Tile {
    pub fn land(bonuses: Vec<Bonus>) -> Self {
        Tile {
            base_type: TileBaseType::Land,
            bonuses,
            occupant: None,
        }
    }

    pub fn ocean_reserved() -> Self {
        Tile {
            base_type: TileBaseType::OceanReserved,
            bonuses: Vec::new(),
            occupant: None,
        }
    }

    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }
}
