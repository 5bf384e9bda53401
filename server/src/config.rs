//! Server configuration (C12, ambient supplement), hot-reloadable the same
//! way the teacher's lobby reloads its game list: read the file, parse it,
//! swap the whole thing behind a lock.

use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::RwLock;

use engine::game::GameSettings;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    pub bind_addr: String,
    pub max_players_default: u8,
    pub corporate_era_default: bool,
    pub draft_variant_default: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: "127.0.0.1:8080".to_string(),
            max_players_default: 5,
            corporate_era_default: true,
            draft_variant_default: false,
        }
    }
}

impl ServerConfig {
    pub fn default_game_settings(&self) -> GameSettings {
        GameSettings {
            max_players: self.max_players_default,
            corporate_era: self.corporate_era_default,
            draft_variant: self.draft_variant_default,
        }
    }
}

/// Re-reads `ServerConfig.json` from the working directory and swaps it
/// into `slot`. Missing file is not an error: the default config stands.
pub async fn reload_config(slot: &Arc<RwLock<ServerConfig>>) -> Result<(), String> {
    let contents = match tokio::fs::read_to_string("ServerConfig.json").await {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("ServerConfig.json not found, keeping defaults");
            return Ok(());
        }
        Err(err) => return Err(err.to_string()),
    };
    let parsed: ServerConfig = serde_json::from_str(&contents).map_err(|e| e.to_string())?;
    *slot.write().await = parsed;
    Ok(())
}
