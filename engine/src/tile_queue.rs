//! Tile-selection queue (C4): the per-player state machine that sits
//! between "a card said place N tiles" and the player actually clicking
//! hexes one at a time.

use std::collections::VecDeque;

use crate::hex::HexPosition;
use crate::player::CardId;
use crate::tiles::TileKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    Idle,
    Queued,
    AwaitingHex,
}

/// The tile kind currently up for selection, and the legal hexes for it
/// given the board at the moment it was computed.
#[derive(Debug, Clone)]
pub struct PendingTileSelection {
    pub tile_kind: TileKind,
    pub available_hexes: Vec<HexPosition>,
    pub source: CardId,
}

/// Classifies a player's current queue/selection state.
pub fn classify(
    pending_selection: &Option<PendingTileSelection>,
    queue: &VecDeque<TileKind>,
) -> QueueState {
    if pending_selection.is_some() {
        QueueState::AwaitingHex
    } else if !queue.is_empty() {
        QueueState::Queued
    } else {
        QueueState::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_queue_and_no_selection_is_idle() {
        assert_eq!(classify(&None, &VecDeque::new()), QueueState::Idle);
    }

    #[test]
    fn nonempty_queue_with_no_active_selection_is_queued() {
        let mut queue = VecDeque::new();
        queue.push_back(TileKind::Greenery);
        assert_eq!(classify(&None, &queue), QueueState::Queued);
    }

    #[test]
    fn active_selection_is_awaiting_hex_regardless_of_queue_contents() {
        let selection = PendingTileSelection {
            tile_kind: TileKind::Ocean,
            available_hexes: vec![],
            source: "ice_asteroid".into(),
        };
        assert_eq!(
            classify(&Some(selection), &VecDeque::new()),
            QueueState::AwaitingHex
        );
    }
}
