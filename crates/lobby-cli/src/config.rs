//! Lobby CLI configuration
//!
//! Loaded from a TOML file given with `--config`; every section and field is
//! optional and falls back to its default.

use std::path::Path;

use anyhow::Context;
use lobby_core::{LobbyConfig, UniqueNetId};
use serde::{Deserialize, Serialize};

use crate::error::{CliError, Result};

/// Complete configuration for the lobby CLI
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Runtime configuration shared by every player the CLI starts
    pub lobby: LobbyConfig,
    /// The local player, who hosts in `demo` and browses in `browse`
    pub player: PlayerConfig,
    pub demo: DemoConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub id: String,
    pub display_name: String,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            id: "host-1".to_string(),
            display_name: "Host".to_string(),
        }
    }
}

impl PlayerConfig {
    pub fn user_id(&self) -> UniqueNetId {
        UniqueNetId::new(self.id.as_str())
    }
}

/// A friend of the local player on the loopback network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendConfig {
    pub id: String,
    pub display_name: String,
}

impl FriendConfig {
    fn new(id: &str, display_name: &str) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
        }
    }
}

/// Scenario parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub session_name: String,
    pub is_lan: bool,
    pub max_players: u32,
    /// How long to wait for any one event before giving up
    pub wait_ms: u64,
    pub friends: Vec<FriendConfig>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            session_name: "Game".to_string(),
            is_lan: true,
            max_players: 4,
            wait_ms: 2000,
            friends: vec![
                FriendConfig::new("friend-1", "Walrus"),
                FriendConfig::new("friend-2", "Pingu42"),
                FriendConfig::new("friend-3", "Puffin"),
            ],
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = Self::from_toml(&contents)?;
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.lobby.validate()?;
        if !self.player.user_id().is_valid() {
            return Err(CliError::Config("player.id must not be blank".to_string()));
        }
        if self.demo.max_players == 0 {
            return Err(CliError::Config(
                "demo.max_players must be greater than 0".to_string(),
            ));
        }
        if let Some(friend) = self
            .demo
            .friends
            .iter()
            .find(|friend| friend.id.trim().is_empty() || friend.id == self.player.id)
        {
            return Err(CliError::Config(format!(
                "Invalid friend id {:?}",
                friend.id
            )));
        }
        Ok(())
    }
}
