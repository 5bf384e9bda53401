//! Action registry: `playAction`'s inner dispatch keyed by `actionType`.
//! Each entry is a small, self-contained rules fragment — the parts of the
//! ruleset that aren't already owned by a dedicated engine mutator.

use std::sync::Arc;

use serde_json::Map;
use serde_json::Value;

use engine::cards::{Card, CardCatalog, Requirement};
use engine::error::EngineError;
use engine::player::{PlayerId, Resource};
use engine::tiles::TileKind;

use crate::error::HandlerError;
use crate::state::ManagedGame;

/// Fails with `CannotAfford` if `player_id` doesn't currently hold at least
/// `amount` of `resource`. Call this before any `apply_resource_changes`
/// that would spend it — `ResourcePool::add` itself has no floor and will
/// happily drive a balance negative.
fn require_affordable(managed: &ManagedGame, player_id: PlayerId, resource: Resource, amount: i32) -> Result<(), HandlerError> {
    let balance = managed
        .game
        .with_player(player_id, |p| p.resources.get(resource))
        .ok_or(EngineError::PlayerNotFound)?;
    if balance < amount {
        return Err(EngineError::CannotAfford.into());
    }
    Ok(())
}

/// Fails with `RequirementsNotMet` if any of `card`'s requirements aren't
/// currently satisfied. Global-parameter requirements check the live
/// `GlobalParameters`; tag-count requirements walk the player's played
/// cards through the catalog.
fn check_requirements(managed: &ManagedGame, catalog: &Arc<dyn CardCatalog>, player_id: PlayerId, card: &Card) -> Result<(), HandlerError> {
    let globals = managed.game.global_parameters();
    let played_cards = managed
        .game
        .with_player(player_id, |p| p.played_cards.clone())
        .ok_or(EngineError::PlayerNotFound)?;

    for requirement in &card.requirements {
        let met = match requirement {
            Requirement::MinTemperature(min) => globals.temperature >= *min,
            Requirement::MaxTemperature(max) => globals.temperature <= *max,
            Requirement::MinOxygen(min) => globals.oxygen >= *min,
            Requirement::MaxOxygen(max) => globals.oxygen <= *max,
            Requirement::MinOceans(min) => globals.oceans >= *min,
            Requirement::TagCount { tag, count } => {
                let owned = played_cards
                    .iter()
                    .filter_map(|id| catalog.get_card(id))
                    .filter(|c| c.tags.iter().any(|t| t == tag))
                    .count() as u32;
                owned >= *count
            }
        };
        if !met {
            return Err(EngineError::RequirementsNotMet.into());
        }
    }
    Ok(())
}

pub fn dispatch(
    managed: &ManagedGame,
    catalog: &Arc<dyn CardCatalog>,
    player_id: PlayerId,
    action_type: &str,
    payload: &Map<String, Value>,
) -> Result<(), HandlerError> {
    match action_type {
        "playCard" => play_card(managed, catalog, player_id, payload),
        "standardProject" => standard_project(managed, player_id, payload),
        "convertPlants" => convert_plants(managed, player_id),
        "convertHeat" => convert_heat(managed, player_id),
        "claimMilestone" => claim_milestone(managed, player_id, payload),
        "fundAward" => fund_award(managed, player_id, payload),
        other => Err(HandlerError::UnknownActionType(other.to_string())),
    }
}

fn field<'a>(payload: &'a Map<String, Value>, name: &str) -> Result<&'a str, HandlerError> {
    payload
        .get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| HandlerError::MissingField(name.to_string()))
}

fn play_card(
    managed: &ManagedGame,
    catalog: &Arc<dyn CardCatalog>,
    player_id: PlayerId,
    payload: &Map<String, Value>,
) -> Result<(), HandlerError> {
    let card_id = field(payload, "cardID")?.to_string();
    let card = catalog
        .get_card(&card_id)
        .ok_or_else(|| HandlerError::UnknownActionType(format!("unknown card: {card_id}")))?
        .clone();

    let discount = managed
        .game
        .with_player(player_id, |p| {
            p.requirement_modifiers.get(&card_id).map(|m| m.discount).unwrap_or(0)
        })
        .unwrap_or(0);
    let cost = (card.cost - discount).max(0);

    check_requirements(managed, catalog, player_id, &card)?;
    require_affordable(managed, player_id, Resource::Credits, cost)?;
    managed.game.apply_resource_changes(player_id, &[(Resource::Credits, -cost)])?;
    managed.game.play_card(player_id, card_id)?;
    managed
        .effects
        .subscribe_card_effects(&managed.game, catalog.clone(), player_id, &card)?;
    Ok(())
}

/// The standard projects' fixed megacredit costs.
fn standard_project(managed: &ManagedGame, player_id: PlayerId, payload: &Map<String, Value>) -> Result<(), HandlerError> {
    let project = field(payload, "project")?;
    let game = &managed.game;
    let cost = match project {
        "powerPlant" => 11,
        "asteroid" => 14,
        "aquifer" => 18,
        "greenery" => 23,
        "city" => 25,
        other => return Err(HandlerError::UnknownActionType(format!("standardProject:{other}"))),
    };
    require_affordable(managed, player_id, Resource::Credits, cost)?;
    game.apply_resource_changes(player_id, &[(Resource::Credits, -cost)])?;
    match project {
        "asteroid" => {
            game.raise_temperature(player_id, 1)?;
        }
        "aquifer" => {
            game.set_pending_tile_queue(player_id, vec![TileKind::Ocean], "standard_project_aquifer".into())?;
        }
        "greenery" => {
            game.set_pending_tile_queue(player_id, vec![TileKind::Greenery], "standard_project_greenery".into())?;
        }
        "city" => {
            game.set_pending_tile_queue(player_id, vec![TileKind::City], "standard_project_city".into())?;
        }
        _ => {}
    }
    Ok(())
}

fn convert_plants(managed: &ManagedGame, player_id: PlayerId) -> Result<(), HandlerError> {
    require_affordable(managed, player_id, Resource::Plants, 8)?;
    managed.game.apply_resource_changes(player_id, &[(Resource::Plants, -8)])?;
    managed
        .game
        .set_pending_tile_queue(player_id, vec![TileKind::Greenery], "convert_plants".into())?;
    Ok(())
}

fn convert_heat(managed: &ManagedGame, player_id: PlayerId) -> Result<(), HandlerError> {
    require_affordable(managed, player_id, Resource::Heat, 8)?;
    managed.game.apply_resource_changes(player_id, &[(Resource::Heat, -8)])?;
    managed.game.raise_temperature(player_id, 1)?;
    Ok(())
}

/// Milestones aren't tracked as first-class state yet — claiming one is
/// just the fixed credit cost, same as the real rules charge regardless of
/// which milestone is named.
fn claim_milestone(managed: &ManagedGame, player_id: PlayerId, payload: &Map<String, Value>) -> Result<(), HandlerError> {
    let _milestone = field(payload, "milestone")?;
    require_affordable(managed, player_id, Resource::Credits, 8)?;
    managed.game.apply_resource_changes(player_id, &[(Resource::Credits, -8)])?;
    Ok(())
}

/// Same simplification as `claim_milestone`: awards cost a flat fee with no
/// standings tracked yet.
fn fund_award(managed: &ManagedGame, player_id: PlayerId, payload: &Map<String, Value>) -> Result<(), HandlerError> {
    let _award = field(payload, "award")?;
    require_affordable(managed, player_id, Resource::Credits, 8)?;
    managed.game.apply_resource_changes(player_id, &[(Resource::Credits, -8)])?;
    Ok(())
}
