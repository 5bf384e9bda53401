//! Connection manager (C7): owns one WebSocket's lifetime end to end. Splits
//! the socket, spawns a `write_pump` and a `read_pump`, races them with
//! `tokio::select!`, and aborts whichever loses — the teacher's
//! `message_relay.rs` paired-task idiom, adapted from a relay pass-through
//! to a connection that actually decodes and dispatches game messages.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use protocol::{InboundEnvelope, OutboundEnvelope, PING_INTERVAL_SECS, PONG_TIMEOUT_SECS};

use crate::handlers;
use crate::hub::OUTBOUND_QUEUE_DEPTH;
use crate::state::AppState;

pub async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = uuid::Uuid::new_v4();
    let (sink, stream) = socket.split();
    let (outbound_tx, outbound_rx) = mpsc::channel::<OutboundEnvelope>(OUTBOUND_QUEUE_DEPTH);

    let mut write_task = tokio::spawn(write_pump(sink, outbound_rx));
    let identity_slot = Arc::new(tokio::sync::Mutex::new(None));
    let mut read_task = tokio::spawn(read_pump(
        stream,
        state.clone(),
        connection_id,
        outbound_tx.clone(),
        identity_slot.clone(),
    ));

    tokio::select! {
        _ = &mut write_task => { read_task.abort(); }
        _ = &mut read_task => { write_task.abort(); }
    }

    let identity = *identity_slot.lock().await;
    handlers::handle_disconnect(&state, identity, connection_id).await;
}

/// Drains outbound frames to the socket and keeps the connection alive with
/// periodic pings; gives up once the client misses a pong for too long.
async fn write_pump(
    mut sink: futures_util::stream::SplitSink<WebSocket, Message>,
    mut outbound_rx: mpsc::Receiver<OutboundEnvelope>,
) {
    let mut ping_interval = tokio::time::interval(Duration::from_secs(PING_INTERVAL_SECS));
    ping_interval.tick().await; // first tick fires immediately; skip it

    loop {
        tokio::select! {
            frame = outbound_rx.recv() => {
                let Some(envelope) = frame else { return; };
                let Ok(text) = serde_json::to_string(&envelope) else { continue; };
                if sink.send(Message::Text(text.into())).await.is_err() {
                    return;
                }
            }
            _ = ping_interval.tick() => {
                if sink.send(Message::Ping(Vec::new().into())).await.is_err() {
                    return;
                }
            }
        }
    }
}

/// Decodes inbound frames and dispatches them to `handlers::handle_message`,
/// tracking the connection's identity once `playerConnect`/`playerReconnect`
/// establishes it. Also enforces the pong timeout: the client has
/// `PONG_TIMEOUT_SECS` to answer before the connection is considered dead.
async fn read_pump(
    mut stream: futures_util::stream::SplitStream<WebSocket>,
    state: Arc<AppState>,
    connection_id: uuid::Uuid,
    outbound_tx: mpsc::Sender<OutboundEnvelope>,
    identity_slot: Arc<tokio::sync::Mutex<Option<(engine::game::GameId, engine::player::PlayerId)>>>,
) {
    loop {
        let next = tokio::time::timeout(Duration::from_secs(PONG_TIMEOUT_SECS), stream.next()).await;
        let Ok(Some(message)) = next else {
            return;
        };
        let Ok(message) = message else {
            return;
        };
        match message {
            Message::Text(text) => {
                let mut identity = *identity_slot.lock().await;
                if let Err(err) = dispatch_text(&state, &mut identity, connection_id, &outbound_tx, &text).await {
                    let envelope = protocol::OutboundMessage::Error(protocol::ErrorPayload {
                        message: err.to_string(),
                    })
                    .into_envelope(None);
                    if let Err(TrySendError::Full(_)) = outbound_tx.try_send(envelope) {
                        tracing::warn!(%connection_id, "outbound queue full, dropping error frame");
                    }
                }
                *identity_slot.lock().await = identity;
            }
            Message::Close(_) => return,
            _ => {}
        }
    }
}

async fn dispatch_text(
    state: &Arc<AppState>,
    identity: &mut Option<(engine::game::GameId, engine::player::PlayerId)>,
    connection_id: uuid::Uuid,
    outbound_tx: &mpsc::Sender<OutboundEnvelope>,
    text: &str,
) -> Result<(), crate::error::HandlerError> {
    if text.len() > protocol::MAX_FRAME_SIZE {
        return Err(protocol::ProtocolError::FrameTooLarge {
            size: text.len(),
            max: protocol::MAX_FRAME_SIZE,
        }
        .into());
    }
    let envelope: InboundEnvelope = serde_json::from_str(text).map_err(protocol::ProtocolError::from)?;
    let message = protocol::InboundMessage::parse(envelope)?;
    handlers::handle_message(state, identity, connection_id, outbound_tx, message).await
}
