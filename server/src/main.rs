mod actions;
mod broadcaster;
mod config;
mod connection;
mod dto;
mod error;
mod handlers;
mod hub;
mod state;

use std::sync::Arc;

use axum::Router;
use axum::extract::ws::WebSocket;
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use engine::cards::InMemoryCardCatalog;

use crate::config::reload_config;
use crate::state::AppState;

#[tokio::main]
/// Activates error tracing, spawns a watchdog task that prunes games with no
/// connected players, then sets up the routing for the websocket endpoint
/// and config reload. The server listens on the address from `ServerConfig`.
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=trace", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(true)
                .with_line_number(true)
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true),
        )
        .init();

    let catalog = Arc::new(InMemoryCardCatalog::bundled());
    let app_state = Arc::new(AppState::new(catalog));

    if let Err(message) = reload_config(&app_state.config).await {
        tracing::error!(message, "Initial config load error.");
    }

    let watchdog_state = app_state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(1200)); // 20 min
        loop {
            interval.tick().await;
            cleanup_dead_games(&watchdog_state).await;
        }
    });

    let bind_addr = app_state.config.read().await.bind_addr.clone();

    let app = Router::new()
        .route("/reload", get(reload_handler))
        .route("/healthz", get(healthz_handler))
        .route("/ws", get(websocket_handler))
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await.unwrap();
    tracing::info!(%bind_addr, "listening");
    axum::serve(listener, app).await.unwrap();
}

/// Removes games that currently have no connected players — the counterpart
/// of the teacher's dead-room sweep, adapted to games instead of relay rooms.
async fn cleanup_dead_games(state: &Arc<AppState>) {
    let mut games = state.games.lock().await;
    games.retain(|game_id, _managed| {
        let alive = !state.hub.connected_player_ids(*game_id).is_empty();
        if !alive {
            tracing::info!(%game_id, "removing game with no connected players");
        }
        alive
    });
}

async fn healthz_handler() -> &'static str {
    "ok"
}

/// Forces a reload of `ServerConfig.json` without restarting the process.
async fn reload_handler(State(state): State<Arc<AppState>>) -> String {
    match reload_config(&state.config).await {
        Ok(()) => {
            let config = state.config.read().await;
            format!("reloaded: bind_addr={} max_players_default={}", config.bind_addr, config.max_players_default)
        }
        Err(e) => format!("config reload failed: {e}"),
    }
}

async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.max_message_size(protocol::MAX_FRAME_SIZE)
        .on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    connection::handle_socket(socket, state).await;
}
