//! Process-wide shared state: the live games, the connection hub, the
//! card catalog, and the hot-reloadable config — the server-crate
//! counterpart of the teacher's `lobby::AppState`.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use engine::cards::CardCatalog;
use engine::effects::EffectRegistry;
use engine::game::{Game, GameId};

use crate::config::ServerConfig;
use crate::hub::Hub;

/// A game plus the bookkeeping the server layer needs alongside it: which
/// subscriptions back which played card.
pub struct ManagedGame {
    pub game: Arc<Game>,
    pub effects: EffectRegistry,
}

pub struct AppState {
    pub games: Mutex<HashMap<GameId, Arc<ManagedGame>>>,
    pub config: Arc<RwLock<ServerConfig>>,
    pub hub: Hub,
    pub catalog: Arc<dyn CardCatalog>,
}

impl AppState {
    pub fn new(catalog: Arc<dyn CardCatalog>) -> Self {
        AppState {
            games: Mutex::new(HashMap::new()),
            config: Arc::new(RwLock::new(ServerConfig::default())),
            hub: Hub::new(),
            catalog,
        }
    }
}

/// Maps an arbitrary client-supplied id string to a stable internal uuid,
/// so `gameID`/`playerID` on the wire don't have to already be uuids.
pub fn stable_id(namespace: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, namespace.as_bytes())
}
