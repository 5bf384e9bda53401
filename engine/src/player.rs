//! Player-scoped state: resources, production, terraform rating, hand,
//! and the passive effects/requirement modifiers attached by played cards.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type PlayerId = Uuid;

/// A catalog card identifier, e.g. `"vegetated_hills"`.
pub type CardId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resource {
    Credits,
    Steel,
    Titanium,
    Plants,
    Energy,
    Heat,
}

pub const ALL_RESOURCES: [Resource; 6] = [
    Resource::Credits,
    Resource::Steel,
    Resource::Titanium,
    Resource::Plants,
    Resource::Energy,
    Resource::Heat,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourcePool {
    pub credits: i32,
    pub steel: i32,
    pub titanium: i32,
    pub plants: i32,
    pub energy: i32,
    pub heat: i32,
}

impl ResourcePool {
    pub fn get(&self, resource: Resource) -> i32 {
        match resource {
            Resource::Credits => self.credits,
            Resource::Steel => self.steel,
            Resource::Titanium => self.titanium,
            Resource::Plants => self.plants,
            Resource::Energy => self.energy,
            Resource::Heat => self.heat,
        }
    }

    pub fn add(&mut self, resource: Resource, amount: i32) {
        let slot = match resource {
            Resource::Credits => &mut self.credits,
            Resource::Steel => &mut self.steel,
            Resource::Titanium => &mut self.titanium,
            Resource::Plants => &mut self.plants,
            Resource::Energy => &mut self.energy,
            Resource::Heat => &mut self.heat,
        };
        *slot += amount;
    }
}

/// A card filter used by discounts, value modifiers, and global-parameter
/// leniences to decide which hand cards they apply to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardFilter {
    pub tags: Vec<String>,
    pub card_types: Vec<crate::cards::CardType>,
    pub requires_global_parameter_requirement: bool,
}

impl CardFilter {
    pub fn matches(&self, card: &crate::cards::Card) -> bool {
        let tags_ok = self.tags.is_empty() || self.tags.iter().any(|t| card.tags.contains(t));
        let types_ok = self.card_types.is_empty() || self.card_types.contains(&card.card_type);
        let global_param_ok = !self.requires_global_parameter_requirement
            || card
                .requirements
                .iter()
                .any(|r| r.is_global_parameter());
        tags_ok && types_ok && global_param_ok
    }
}

/// A passive modifier attached to a player by a played card.
#[derive(Debug, Clone)]
pub enum PlayerEffect {
    Discount { amount: i32, filter: CardFilter },
    ValueModifier { amount: i32, filter: CardFilter },
    PaymentSubstitute { resource: Resource, rate: f32 },
    OceanAdjacencyBonus { resource: Resource, amount: i32 },
    Defense { amount: i32 },
    GlobalParameterLenience { amount: i32, affected_resources: Vec<Resource> },
}

#[derive(Debug, Clone)]
pub struct CardEffect {
    pub source_card: CardId,
    pub effect: PlayerEffect,
}

/// A per-card-target discount or lenience computed from the player's hand,
/// recomputed whenever the hand or the player's effects change.
#[derive(Debug, Clone, Default)]
pub struct RequirementModifier {
    pub discount: i32,
    pub lenient_resources: Vec<Resource>,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub corporation: Option<CardId>,
    pub terraform_rating: i32,
    pub resources: ResourcePool,
    pub production: ResourcePool,
    pub hand: Vec<CardId>,
    pub played_cards: Vec<CardId>,
    pub effects: Vec<CardEffect>,
    pub requirement_modifiers: HashMap<CardId, RequirementModifier>,
    pub pending_tile_selection: Option<crate::tile_queue::PendingTileSelection>,
    pub pending_tile_queue: std::collections::VecDeque<(crate::tiles::TileKind, CardId)>,
    pub connected: bool,
}

impl Player {
    pub fn new(id: PlayerId, name: String) -> Self {
        Player {
            id,
            name,
            corporation: None,
            terraform_rating: 20,
            resources: ResourcePool::default(),
            production: ResourcePool::default(),
            hand: Vec::new(),
            played_cards: Vec::new(),
            effects: Vec::new(),
            requirement_modifiers: HashMap::new(),
            pending_tile_selection: None,
            pending_tile_queue: std::collections::VecDeque::new(),
            connected: true,
        }
    }

    pub fn is_awaiting_hex(&self) -> bool {
        self.pending_tile_selection.is_some()
    }

    pub fn is_queued(&self) -> bool {
        !self.is_awaiting_hex() && !self.pending_tile_queue.is_empty()
    }
}
