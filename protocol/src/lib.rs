//! The wire protocol spoken over the `/ws` endpoint. Every frame is JSON
//! with the envelope `{type, gameID?, payload}`; this crate owns both
//! directions so the server and any Rust client stay in lock-step.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The maximum frame size the server will accept, in bytes.
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Ping interval the server holds the connection to.
pub const PING_INTERVAL_SECS: u64 = 54;

/// How long a client has to answer a ping before the connection is closed.
pub const PONG_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("unknown message type: {0}")]
    UnknownMessageType(String),
    #[error("malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },
}

/// The raw shape every inbound frame is decoded into before being routed
/// to a specific payload type by `kind`.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "gameID", default)]
    pub game_id: Option<String>,
    #[serde(default)]
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayerConnectPayload {
    #[serde(rename = "gameID")]
    pub game_id: String,
    #[serde(rename = "playerID")]
    pub player_id: String,
    #[serde(rename = "playerName")]
    pub player_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayerReconnectPayload {
    #[serde(rename = "gameID")]
    pub game_id: String,
    #[serde(rename = "playerID")]
    pub player_id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayActionPayload {
    #[serde(rename = "actionType")]
    pub action_type: String,
    /// Everything else in the payload besides `actionType`, handed to the
    /// `ActionRegistry` entry that `action_type` selects.
    #[serde(flatten)]
    pub action_payload: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SelectStartingCardsPayload {
    #[serde(rename = "cardIDs")]
    pub card_ids: Vec<String>,
    #[serde(rename = "corpID")]
    pub corp_id: String,
    pub cost: i32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SelectTilePayload {
    pub coord: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConfirmCardDrawPayload {
    #[serde(rename = "cardIDs")]
    pub card_ids: Vec<String>,
}

/// A decoded inbound frame, dispatched to the `MessageHandlers` by variant.
#[derive(Debug, Clone)]
pub enum InboundMessage {
    PlayerConnect(PlayerConnectPayload),
    PlayerReconnect(PlayerReconnectPayload),
    PlayAction(PlayActionPayload),
    SelectStartingCards(SelectStartingCardsPayload),
    SelectTile(SelectTilePayload),
    ConfirmCardDraw(ConfirmCardDrawPayload),
    PassGeneration,
}

impl InboundMessage {
    pub fn parse(envelope: InboundEnvelope) -> Result<InboundMessage, ProtocolError> {
        match envelope.kind.as_str() {
            "playerConnect" => Ok(InboundMessage::PlayerConnect(serde_json::from_value(
                envelope.payload,
            )?)),
            "playerReconnect" => Ok(InboundMessage::PlayerReconnect(serde_json::from_value(
                envelope.payload,
            )?)),
            "playAction" => Ok(InboundMessage::PlayAction(serde_json::from_value(
                envelope.payload,
            )?)),
            "selectStartingCards" => Ok(InboundMessage::SelectStartingCards(
                serde_json::from_value(envelope.payload)?,
            )),
            "selectTile" => Ok(InboundMessage::SelectTile(serde_json::from_value(
                envelope.payload,
            )?)),
            "confirmCardDraw" => Ok(InboundMessage::ConfirmCardDraw(serde_json::from_value(
                envelope.payload,
            )?)),
            "passGeneration" => Ok(InboundMessage::PassGeneration),
            other => Err(ProtocolError::UnknownMessageType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcesDto {
    pub credits: i32,
    pub steel: i32,
    pub titanium: i32,
    pub plants: i32,
    pub energy: i32,
    pub heat: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDto {
    pub id: String,
    pub name: String,
    pub resources: ResourcesDto,
    pub production: ResourcesDto,
    pub terraform_rating: i32,
    pub played_cards: Vec<String>,
    /// Full hand for the viewing player; empty for every opponent.
    pub hand: Vec<String>,
    pub hand_count: usize,
    pub connected: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalParametersDto {
    pub temperature: i32,
    pub oxygen: u8,
    pub oceans: u8,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TileDto {
    pub position: String,
    pub tile_kind: Option<String>,
    pub owner_id: Option<String>,
    pub ocean_reserved: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingTileSelectionDto {
    pub tile_kind: String,
    pub available_hexes: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalizedGameDto {
    pub id: String,
    pub status: String,
    pub phase: String,
    pub generation: u32,
    pub global_parameters: GlobalParametersDto,
    pub board: Vec<TileDto>,
    pub players: Vec<PlayerDto>,
    pub current_turn_player_id: Option<String>,
    /// Only populated for the viewing player's own pending selection.
    pub pending_tile_selection: Option<PendingTileSelectionDto>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDto {
    pub id: String,
    pub name: String,
    pub tags: Vec<String>,
    pub cost: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProductionDto {
    pub player_id: String,
    pub production: ResourcesDto,
}

#[derive(Debug, Clone, Serialize)]
pub struct GameUpdatedPayload {
    pub game: PersonalizedGameDto,
}

#[derive(Debug, Clone, Serialize)]
pub struct AvailableCardsPayload {
    pub cards: Vec<CardDto>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDisconnectedPayload {
    #[serde(rename = "playerID")]
    pub player_id: String,
    pub player_name: String,
    pub game: PersonalizedGameDto,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionPhaseStartedPayload {
    pub players_data: Vec<PlayerProductionDto>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub message: String,
}

/// An outbound frame ready to be serialized through `into_envelope`.
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    GameUpdated(GameUpdatedPayload),
    AvailableCards(AvailableCardsPayload),
    PlayerDisconnected(PlayerDisconnectedPayload),
    ProductionPhaseStarted(ProductionPhaseStartedPayload),
    Error(ErrorPayload),
}

#[derive(Debug, Clone, Serialize)]
pub struct OutboundEnvelope {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(rename = "gameID", skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
    pub payload: serde_json::Value,
}

impl OutboundMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundMessage::GameUpdated(_) => "gameUpdated",
            OutboundMessage::AvailableCards(_) => "availableCards",
            OutboundMessage::PlayerDisconnected(_) => "playerDisconnected",
            OutboundMessage::ProductionPhaseStarted(_) => "productionPhaseStarted",
            OutboundMessage::Error(_) => "error",
        }
    }

    pub fn into_envelope(self, game_id: Option<String>) -> OutboundEnvelope {
        let kind = self.kind();
        let payload = match self {
            OutboundMessage::GameUpdated(p) => serde_json::to_value(p),
            OutboundMessage::AvailableCards(p) => serde_json::to_value(p),
            OutboundMessage::PlayerDisconnected(p) => serde_json::to_value(p),
            OutboundMessage::ProductionPhaseStarted(p) => serde_json::to_value(p),
            OutboundMessage::Error(p) => serde_json::to_value(p),
        }
        .unwrap_or(serde_json::Value::Null);
        OutboundEnvelope {
            kind,
            game_id,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_tile_round_trips_through_the_envelope() {
        let raw = serde_json::json!({
            "type": "selectTile",
            "gameID": "g1",
            "payload": { "coord": "1,-1,0" }
        });
        let envelope: InboundEnvelope = serde_json::from_value(raw).unwrap();
        assert_eq!(envelope.game_id.as_deref(), Some("g1"));
        let message = InboundMessage::parse(envelope).unwrap();
        match message {
            InboundMessage::SelectTile(payload) => assert_eq!(payload.coord, "1,-1,0"),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn pass_generation_has_no_payload_requirements() {
        let raw = serde_json::json!({ "type": "passGeneration" });
        let envelope: InboundEnvelope = serde_json::from_value(raw).unwrap();
        assert!(matches!(
            InboundMessage::parse(envelope).unwrap(),
            InboundMessage::PassGeneration
        ));
    }

    #[test]
    fn unknown_message_type_is_rejected() {
        let raw = serde_json::json!({ "type": "doSomethingWeird", "payload": {} });
        let envelope: InboundEnvelope = serde_json::from_value(raw).unwrap();
        assert!(matches!(
            InboundMessage::parse(envelope),
            Err(ProtocolError::UnknownMessageType(_))
        ));
    }

    #[test]
    fn play_action_keeps_extra_fields_alongside_action_type() {
        let raw = serde_json::json!({
            "type": "playAction",
            "payload": { "actionType": "playCard", "cardID": "mausoleum" }
        });
        let envelope: InboundEnvelope = serde_json::from_value(raw).unwrap();
        match InboundMessage::parse(envelope).unwrap() {
            InboundMessage::PlayAction(payload) => {
                assert_eq!(payload.action_type, "playCard");
                assert_eq!(
                    payload.action_payload.get("cardID").and_then(|v| v.as_str()),
                    Some("mausoleum")
                );
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn error_message_serializes_under_the_error_type() {
        let envelope = OutboundMessage::Error(ErrorPayload {
            message: "invalid hex".into(),
        })
        .into_envelope(None);
        assert_eq!(envelope.kind, "error");
        assert_eq!(envelope.payload["message"], "invalid hex");
    }
}
