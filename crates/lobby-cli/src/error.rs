//! Error handling for the lobby CLI

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Lobby error: {0}")]
    Lobby(#[from] lobby_core::LobbyError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Scenario failed: {0}")]
    Scenario(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("TOML writing error: {0}")]
    TomlWriting(#[from] toml::ser::Error),
}

impl CliError {
    pub fn scenario(message: impl Into<String>) -> Self {
        CliError::Scenario(message.into())
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::Config(format!("{:#}", err))
    }
}
