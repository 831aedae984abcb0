//! Core identity types for session orchestration
//!
//! Newtypes keep user identities, session names and friend records apart
//! so that a raw string never flows into a backend call unchecked.

use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::errors::RequestError;

// ----------------------------------------------------------------------------
// Unique Net Id
// ----------------------------------------------------------------------------

/// Backend-assigned identity of a user (local player, friend or session owner)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UniqueNetId(String);

impl UniqueNetId {
    /// Create an id from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// An id is valid when it carries at least one non-whitespace character
    pub fn is_valid(&self) -> bool {
        !self.0.trim().is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UniqueNetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UniqueNetId {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = Self(s.trim().to_string());
        if id.is_valid() {
            Ok(id)
        } else {
            Err(RequestError::InvalidFriendId { raw: s.to_string() })
        }
    }
}

// ----------------------------------------------------------------------------
// Session Name
// ----------------------------------------------------------------------------

/// Name token identifying a session on the local side
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionName(String);

impl SessionName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for SessionName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

// ----------------------------------------------------------------------------
// Local Player
// ----------------------------------------------------------------------------

/// The first local player: its identity and controller slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalPlayer {
    pub user_id: UniqueNetId,
    /// Local user number used by friends and invite calls
    pub controller_slot: u32,
}

impl LocalPlayer {
    pub fn new(user_id: UniqueNetId, controller_slot: u32) -> Self {
        Self {
            user_id,
            controller_slot,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.user_id.is_valid()
    }
}

// ----------------------------------------------------------------------------
// Friend Record
// ----------------------------------------------------------------------------

/// A friend as reported by the backend's friends list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendRecord {
    pub user_id: UniqueNetId,
    pub display_name: String,
}

impl FriendRecord {
    pub fn new(user_id: UniqueNetId, display_name: impl Into<String>) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
