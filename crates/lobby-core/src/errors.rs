//! Error types for session orchestration
//!
//! This module contains the request (precondition) errors, subscription
//! bookkeeping errors and the main LobbyError type that unifies them.

use crate::backend::{SubscriptionKind, SubscriptionToken};
use crate::session::SessionPhase;
use crate::types::SessionName;

// ----------------------------------------------------------------------------
// Specific Error Types
// ----------------------------------------------------------------------------

/// Reasons a session request is refused before any backend work starts
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("No online backend is available")]
    NoBackend,
    #[error("No valid local player identity")]
    NoLocalPlayer,
    #[error("Invalid friend id: {raw:?}")]
    InvalidFriendId { raw: String },
    #[error("No active session")]
    NoActiveSession,
    #[error("Session {name} still exists and must be destroyed first")]
    SessionExists { name: SessionName },
    #[error("Session phase invalid: expected {expected}, got {actual}")]
    InvalidPhase {
        expected: SessionPhase,
        actual: SessionPhase,
    },
    #[error("No joinable session in the last search results")]
    NoJoinableSession,
    #[error("Backend rejected {operation} request")]
    Rejected { operation: String },
}

/// Subscription bookkeeping errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubscriptionError {
    #[error("{kind} subscription already outstanding (token {token})")]
    AlreadyRegistered {
        kind: SubscriptionKind,
        token: SubscriptionToken,
    },
}

/// Core error type for the lobby crates
#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    #[error("Request error: {0}")]
    Request(#[from] RequestError),

    #[error("Subscription error: {0}")]
    Subscription(#[from] SubscriptionError),

    /// Channel communication error (internal to the task architecture)
    #[error("Channel error: {message}")]
    Channel { message: String },

    /// Configuration error
    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

// ----------------------------------------------------------------------------
// Convenience Error Constructors
// ----------------------------------------------------------------------------

impl LobbyError {
    /// Create a channel error with a message
    pub fn channel_error<T: Into<String>>(message: T) -> Self {
        LobbyError::Channel {
            message: message.into(),
        }
    }

    /// Create a configuration error with a reason
    pub fn config_error<T: Into<String>>(reason: T) -> Self {
        LobbyError::Configuration {
            reason: reason.into(),
        }
    }

    /// Create a rejected-request error for the named operation
    pub fn rejected<T: Into<String>>(operation: T) -> Self {
        LobbyError::Request(RequestError::Rejected {
            operation: operation.into(),
        })
    }

    /// Errors after which the logic task cannot keep running
    pub fn is_unrecoverable(&self) -> bool {
        matches!(
            self,
            LobbyError::Channel { .. } | LobbyError::Configuration { .. }
        )
    }
}

/// Result type for lobby operations
pub type LobbyResult<T> = core::result::Result<T, LobbyError>;
