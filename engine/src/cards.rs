//! Card catalog (C11, ambient supplement) and the card-behavior model that
//! `effects.rs` (C5) classifies and subscribes.

use std::collections::HashMap;

use crate::player::{CardFilter, CardId, Resource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardType {
    Automated,
    Active,
    Event,
    Corporation,
    Prelude,
}

#[derive(Debug, Clone)]
pub enum Requirement {
    MinTemperature(i32),
    MaxTemperature(i32),
    MinOxygen(u8),
    MaxOxygen(u8),
    MinOceans(u8),
    TagCount { tag: String, count: u32 },
}

impl Requirement {
    pub fn is_global_parameter(&self) -> bool {
        matches!(
            self,
            Requirement::MinTemperature(_)
                | Requirement::MaxTemperature(_)
                | Requirement::MinOxygen(_)
                | Requirement::MaxOxygen(_)
                | Requirement::MinOceans(_)
        )
    }
}

/// What causes a card's behavior to fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Only runs when the owning player explicitly invokes it; no subscription.
    Manual,
    /// Runs once, immediately, when the card enters play.
    AutoImmediate,
    /// Registers a standing passive modifier; no direct event firing.
    AutoPassiveModifier,
    /// Subscribes to a specific event kind and fires conditionally.
    AutoConditional(ConditionTrigger),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionTrigger {
    TemperatureRaised,
    OxygenRaised,
    OceanPlaced,
    CityPlaced,
    GreeneryPlaced,
    AnyCardPlayed,
}

#[derive(Debug, Clone)]
pub enum Output {
    Resource { resource: Resource, amount: i32 },
    Production { resource: Resource, amount: i32 },
    GlobalParameterStep { parameter: GlobalParamKind, steps: i32 },
    Discount { amount: i32, filter: CardFilter },
    ValueModifier { amount: i32, filter: CardFilter },
    PaymentSubstitute { resource: Resource, rate: f32 },
    OceanAdjacencyBonus { resource: Resource, amount: i32 },
    Defense { amount: i32 },
    GlobalParameterLenience { amount: i32, affected_resources: Vec<Resource> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalParamKind {
    Temperature,
    Oxygen,
    Oceans,
}

impl Output {
    /// Outputs that mutate state once, the instant the behavior fires.
    pub fn is_immediate(&self) -> bool {
        matches!(
            self,
            Output::Resource { .. } | Output::Production { .. } | Output::GlobalParameterStep { .. }
        )
    }

    /// Outputs that become standing modifiers on the owning player.
    pub fn is_passive_modifier(&self) -> bool {
        !self.is_immediate()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    SelfPlayer,
    AnyPlayer,
}

#[derive(Debug, Clone)]
pub struct CardBehavior {
    pub trigger: Trigger,
    pub outputs: Vec<Output>,
    pub target: Target,
}

#[derive(Debug, Clone)]
pub struct Card {
    pub id: CardId,
    pub name: String,
    pub tags: Vec<String>,
    pub card_type: CardType,
    pub cost: i32,
    pub requirements: Vec<Requirement>,
    pub behaviors: Vec<CardBehavior>,
}

pub trait CardCatalog: Send + Sync {
    fn get_card(&self, id: &CardId) -> Option<&Card>;
}

#[derive(Debug, Default)]
pub struct InMemoryCardCatalog {
    cards: HashMap<CardId, Card>,
}

impl InMemoryCardCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, card: Card) {
        self.cards.insert(card.id.clone(), card);
    }

    /// A small bundled dataset exercising each `CardBehavior` shape:
    /// manual, immediate, passive-modifier, and conditional-triggered.
    pub fn bundled() -> Self {
        let mut catalog = Self::new();

        catalog.insert(Card {
            id: "mausoleum".into(),
            name: "Mausoleum".into(),
            tags: vec!["building".into()],
            card_type: CardType::Automated,
            cost: 8,
            requirements: vec![],
            behaviors: vec![CardBehavior {
                trigger: Trigger::AutoImmediate,
                outputs: vec![Output::Resource {
                    resource: Resource::Credits,
                    amount: -1,
                }],
                target: Target::SelfPlayer,
            }],
        });

        catalog.insert(Card {
            id: "vegetated_hills".into(),
            name: "Vegetated Hills".into(),
            tags: vec!["plant".into()],
            card_type: CardType::Automated,
            cost: 16,
            requirements: vec![Requirement::MinOxygen(4)],
            behaviors: vec![CardBehavior {
                trigger: Trigger::AutoImmediate,
                outputs: vec![Output::Production {
                    resource: Resource::Plants,
                    amount: 1,
                }],
                target: Target::SelfPlayer,
            }],
        });

        catalog.insert(Card {
            id: "mars_university".into(),
            name: "Mars University".into(),
            tags: vec!["science".into(), "building".into()],
            card_type: CardType::Automated,
            cost: 8,
            requirements: vec![],
            behaviors: vec![CardBehavior {
                trigger: Trigger::AutoPassiveModifier,
                outputs: vec![Output::Discount {
                    amount: 1,
                    filter: CardFilter {
                        tags: vec!["science".into()],
                        card_types: vec![],
                        requires_global_parameter_requirement: false,
                    },
                }],
                target: Target::SelfPlayer,
            }],
        });

        catalog.insert(Card {
            id: "ecological_zone".into(),
            name: "Ecological Zone".into(),
            tags: vec!["animal".into(), "plant".into()],
            card_type: CardType::Automated,
            cost: 12,
            requirements: vec![],
            behaviors: vec![CardBehavior {
                trigger: Trigger::AutoConditional(ConditionTrigger::GreeneryPlaced),
                outputs: vec![Output::Resource {
                    resource: Resource::Credits,
                    amount: 2,
                }],
                target: Target::SelfPlayer,
            }],
        });

        catalog.insert(Card {
            id: "ice_asteroid".into(),
            name: "Ice Asteroid".into(),
            tags: vec!["space".into(), "event".into()],
            card_type: CardType::Event,
            cost: 23,
            requirements: vec![],
            behaviors: vec![CardBehavior {
                trigger: Trigger::AutoImmediate,
                outputs: vec![Output::GlobalParameterStep {
                    parameter: GlobalParamKind::Oceans,
                    steps: 2,
                }],
                target: Target::SelfPlayer,
            }],
        });

        catalog.insert(Card {
            id: "ai_central".into(),
            name: "A.I. Central".into(),
            tags: vec!["science".into(), "building".into()],
            card_type: CardType::Active,
            cost: 21,
            requirements: vec![],
            behaviors: vec![CardBehavior {
                trigger: Trigger::Manual,
                outputs: vec![Output::Resource {
                    resource: Resource::Credits,
                    amount: 0,
                }],
                target: Target::SelfPlayer,
            }],
        });

        catalog.insert(Card {
            id: "asteroid_mining".into(),
            name: "Asteroid Mining".into(),
            tags: vec!["space".into()],
            card_type: CardType::Active,
            cost: 30,
            requirements: vec![],
            behaviors: vec![CardBehavior {
                trigger: Trigger::Manual,
                outputs: vec![Output::Resource {
                    resource: Resource::Titanium,
                    amount: 2,
                }],
                target: Target::SelfPlayer,
            }],
        });

        catalog
    }
}

impl CardCatalog for InMemoryCardCatalog {
    fn get_card(&self, id: &CardId) -> Option<&Card> {
        self.cards.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_catalog_exercises_every_trigger_shape() {
        let catalog = InMemoryCardCatalog::bundled();
        let triggers: Vec<_> = ["mausoleum", "mars_university", "ecological_zone", "asteroid_mining"]
            .iter()
            .map(|id| catalog.get_card(&id.to_string()).unwrap().behaviors[0].trigger)
            .collect();
        assert!(matches!(triggers[0], Trigger::AutoImmediate));
        assert!(matches!(triggers[1], Trigger::AutoPassiveModifier));
        assert!(matches!(triggers[2], Trigger::AutoConditional(_)));
        assert!(matches!(triggers[3], Trigger::Manual));
    }
}
