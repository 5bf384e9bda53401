//! Axial/cube hex coordinates and standard board generation.
//!
//! The row layout (5,6,7,8,9,8,7,6,5) and the per-row q/r/s formula are part
//! of the wire contract: clients render the board from the same derivation,
//! so this module has to stay pure and deterministic.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Row lengths of the standard board, top to bottom.
pub const ROW_LENGTHS: [usize; 9] = [5, 6, 7, 8, 9, 8, 7, 6, 5];

/// The six unit directions on a cube-coordinate hex grid.
const NEIGHBOR_DIRECTIONS: [(i32, i32, i32); 6] = [
    (1, 0, -1),
    (1, -1, 0),
    (0, -1, 1),
    (-1, 0, 1),
    (-1, 1, 0),
    (0, 1, -1),
];

/// A cube coordinate with the invariant `q + r + s == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HexPosition {
    pub q: i32,
    pub r: i32,
    pub s: i32,
}

impl HexPosition {
    pub fn new(q: i32, r: i32) -> Self {
        HexPosition { q, r, s: -(q + r) }
    }

    /// Stable string form used as a map key and on the wire (`"q,r,s"`).
    pub fn key(&self) -> String {
        format!("{},{},{}", self.q, self.r, self.s)
    }

    pub fn parse_key(key: &str) -> Option<HexPosition> {
        let mut parts = key.split(',');
        let q: i32 = parts.next()?.trim().parse().ok()?;
        let r: i32 = parts.next()?.trim().parse().ok()?;
        let s: i32 = parts.next()?.trim().parse().ok()?;
        if q + r + s != 0 {
            return None;
        }
        Some(HexPosition { q, r, s })
    }

    pub fn neighbors(&self) -> [HexPosition; 6] {
        NEIGHBOR_DIRECTIONS.map(|(dq, dr, ds)| HexPosition {
            q: self.q + dq,
            r: self.r + dr,
            s: self.s + ds,
        })
    }

    pub fn is_neighbor(&self, other: &HexPosition) -> bool {
        let dist =
            (self.q - other.q).abs() + (self.r - other.r).abs() + (self.s - other.s).abs();
        dist == 2
    }
}

impl fmt::Display for HexPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Floor division, used because `r` ranges over negative values and Rust's
/// `/` truncates toward zero.
fn div_floor(a: i32, b: i32) -> i32 {
    let d = a / b;
    let m = a % b;
    if (m != 0) && ((m < 0) != (b < 0)) { d - 1 } else { d }
}

/// Generates the ordered list of hex positions for the standard board, in
/// row-major order (top row first, left to right within a row).
pub fn standard_layout() -> Vec<HexPosition> {
    let mut positions = Vec::with_capacity(ROW_LENGTHS.iter().sum());
    for (row_index, &row_len) in ROW_LENGTHS.iter().enumerate() {
        let r = row_index as i32 - 4;
        let r_offset = if r < 0 { 1 } else { 0 };
        let half = (row_len / 2) as i32;
        for c in 0..row_len {
            let q = c as i32 - half - div_floor(r - r_offset, 2);
            positions.push(HexPosition::new(q, r));
        }
    }
    positions
}

/// `(row, col)` pairs reserved for ocean tiles on the standard board, fixed
/// to match the physical board clients render.
pub const OCEAN_RESERVED: [(usize, usize); 9] = [
    (0, 1),
    (1, 4),
    (2, 0),
    (2, 5),
    (4, 0),
    (4, 8),
    (6, 1),
    (7, 0),
    (7, 5),
];

/// Returns the standard layout paired with whether each position is ocean-reserved.
pub fn standard_layout_with_reservations() -> Vec<(HexPosition, bool)> {
    let mut result = Vec::new();
    let mut index = 0usize;
    for (row_index, &row_len) in ROW_LENGTHS.iter().enumerate() {
        for col in 0..row_len {
            let position = standard_layout()[index];
            let is_ocean = OCEAN_RESERVED.contains(&(row_index, col));
            result.push((position, is_ocean));
            index += 1;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_tile_satisfies_the_cube_coordinate_law() {
        for position in standard_layout() {
            assert_eq!(position.q + position.r + position.s, 0);
        }
    }

    #[test]
    fn neighbor_relation_matches_cube_distance_one() {
        let positions = standard_layout();
        for a in &positions {
            for b in &positions {
                if a == b {
                    continue;
                }
                let expected = (a.q - b.q).abs() + (a.r - b.r).abs() + (a.s - b.s).abs() == 2;
                assert_eq!(a.is_neighbor(b), expected, "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn get_neighbors_returns_the_six_unit_additions() {
        let origin = HexPosition::new(0, 0);
        let neighbors = origin.neighbors();
        assert_eq!(neighbors.len(), 6);
        for n in neighbors {
            assert!(origin.is_neighbor(&n));
            assert_eq!(n.q + n.r + n.s, 0);
        }
    }

    #[test]
    fn standard_layout_has_no_duplicate_positions() {
        let positions = standard_layout();
        let unique: HashSet<_> = positions.iter().map(|p| p.key()).collect();
        assert_eq!(unique.len(), positions.len());
    }

    #[test]
    fn standard_layout_count_matches_row_lengths() {
        let total: usize = ROW_LENGTHS.iter().sum();
        assert_eq!(standard_layout().len(), total);
    }

    #[test]
    fn ocean_reservations_are_in_bounds_for_every_row() {
        for (row, col) in OCEAN_RESERVED {
            assert!(col < ROW_LENGTHS[row], "row {row} col {col} out of bounds");
        }
    }

    #[test]
    fn key_round_trips_through_parse() {
        let position = HexPosition::new(2, -3);
        let parsed = HexPosition::parse_key(&position.key()).unwrap();
        assert_eq!(position, parsed);
    }
}
