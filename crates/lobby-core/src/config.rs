//! Centralized Configuration Management
//!
//! All configuration structures used by the lobby crates. Defaults describe
//! the example game: one map, one marker for auto-invites.

use serde::{Deserialize, Serialize};

use crate::errors::{LobbyError, LobbyResult};

// ----------------------------------------------------------------------------
// Session Policy
// ----------------------------------------------------------------------------

/// Fixed policy values applied to every host, find and invite pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionPolicy {
    /// Maximum number of results requested per search
    pub max_search_results: usize,
    /// Ping bucket size for search result grouping
    pub ping_bucket_size: u32,
    /// Map advertised by hosted sessions and opened once they start
    pub map_name: String,
    /// Map returned to after a session is destroyed
    pub entry_map: String,
    /// Local name given to sessions joined from search results or invites
    pub join_session_name: String,
    /// Friends list read after a session starts
    pub friends_list_name: String,
    /// Friends whose display name contains this marker are auto-invited
    pub invite_marker: String,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            max_search_results: 20,
            ping_bucket_size: 50,
            map_name: "FirstPersonExampleMap".to_string(),
            entry_map: "EntryMap".to_string(),
            join_session_name: "GameSession".to_string(),
            friends_list_name: "default".to_string(),
            invite_marker: "Pingu".to_string(),
        }
    }
}

impl SessionPolicy {
    pub fn validate(&self) -> LobbyResult<()> {
        if self.max_search_results == 0 {
            return Err(LobbyError::config_error(
                "max_search_results must be greater than zero",
            ));
        }
        if self.map_name.trim().is_empty() || self.entry_map.trim().is_empty() {
            return Err(LobbyError::config_error("map names must not be empty"));
        }
        if self.join_session_name.trim().is_empty() {
            return Err(LobbyError::config_error(
                "join_session_name must not be empty",
            ));
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Channel Configuration
// ----------------------------------------------------------------------------

/// Configuration for channel buffer sizes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Buffer size for the command channel (UI → Session Logic)
    pub command_buffer_size: usize,
    /// Buffer size for the completion channel (Backend → Session Logic)
    pub completion_buffer_size: usize,
    /// Buffer size for the effect broadcast (Session Logic → presentation)
    pub effect_buffer_size: usize,
    /// Buffer size for the app event channel (Session Logic → UI)
    pub app_event_buffer_size: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            command_buffer_size: 32,     // UI commands are infrequent
            completion_buffer_size: 64,  // Invite notifications can be bursty
            effect_buffer_size: 16,      // Level changes are rare
            app_event_buffer_size: 128,  // Every completion produces diagnostics
        }
    }
}

impl ChannelConfig {
    /// Create configuration optimized for testing
    pub fn testing() -> Self {
        Self {
            command_buffer_size: 100,
            completion_buffer_size: 100,
            effect_buffer_size: 100,
            app_event_buffer_size: 256,
        }
    }

    pub fn validate(&self) -> LobbyResult<()> {
        let sizes = [
            self.command_buffer_size,
            self.completion_buffer_size,
            self.effect_buffer_size,
            self.app_event_buffer_size,
        ];
        if sizes.contains(&0) {
            return Err(LobbyError::config_error(
                "channel buffer sizes must be greater than zero",
            ));
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Lobby Configuration
// ----------------------------------------------------------------------------

/// Complete configuration for a lobby runtime
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LobbyConfig {
    pub session: SessionPolicy,
    pub channels: ChannelConfig,
}

impl LobbyConfig {
    /// Configuration with roomy channels for tests
    pub fn testing() -> Self {
        Self {
            session: SessionPolicy::default(),
            channels: ChannelConfig::testing(),
        }
    }

    pub fn validate(&self) -> LobbyResult<()> {
        self.session.validate()?;
        self.channels.validate()
    }
}
