//! Session data model: settings, search state, search results and phases

use core::fmt;
use serde::{Deserialize, Serialize};

use crate::config::SessionPolicy;
use crate::types::UniqueNetId;

// ----------------------------------------------------------------------------
// Session Settings
// ----------------------------------------------------------------------------

/// Settings submitted to the backend when creating a session.
///
/// Built fresh for every host request and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    pub is_lan_match: bool,
    pub uses_presence: bool,
    pub num_public_connections: u32,
    pub num_private_connections: u32,
    pub allow_invites: bool,
    pub allow_join_in_progress: bool,
    pub should_advertise: bool,
    pub allow_join_via_presence: bool,
    pub allow_join_via_presence_friends_only: bool,
    /// Map name advertised through the online service
    pub map_name: String,
}

impl SessionSettings {
    /// Settings for a freshly hosted session under the fixed flag policy
    pub fn for_host(is_lan: bool, is_presence: bool, max_players: u32, map_name: &str) -> Self {
        Self {
            is_lan_match: is_lan,
            uses_presence: is_presence,
            num_public_connections: max_players,
            num_private_connections: 0,
            allow_invites: true,
            allow_join_in_progress: true,
            should_advertise: true,
            allow_join_via_presence: true,
            allow_join_via_presence_friends_only: false,
            map_name: map_name.to_string(),
        }
    }
}

// ----------------------------------------------------------------------------
// Search Results
// ----------------------------------------------------------------------------

/// Opaque descriptor of a joinable session, passed through untouched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Backend-specific session identifier
    pub session_id: String,
    pub owning_user_id: UniqueNetId,
    pub owning_user_name: String,
    pub ping_ms: u32,
    pub open_public_connections: u32,
    pub settings: SessionSettings,
}

impl SearchResult {
    pub fn is_valid(&self) -> bool {
        !self.session_id.is_empty() && self.owning_user_id.is_valid()
    }
}

/// Search parameters plus the results the backend reported for them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSearch {
    pub is_lan_query: bool,
    pub max_search_results: usize,
    pub ping_bucket_size: u32,
    /// Presence-equality filter, only present for presence searches
    pub presence_filter: Option<bool>,
    pub results: Vec<SearchResult>,
}

impl SessionSearch {
    pub fn new(policy: &SessionPolicy, is_lan: bool, is_presence: bool) -> Self {
        Self {
            is_lan_query: is_lan,
            max_search_results: policy.max_search_results,
            ping_bucket_size: policy.ping_bucket_size,
            presence_filter: is_presence.then_some(true),
            results: Vec::new(),
        }
    }

    /// Whether a session with the given settings passes this search's filters
    pub fn matches(&self, settings: &SessionSettings) -> bool {
        if settings.is_lan_match != self.is_lan_query {
            return false;
        }
        match self.presence_filter {
            Some(presence) => settings.uses_presence == presence,
            None => true,
        }
    }

    /// First result not owned by `local`, in stored order
    pub fn first_joinable(&self, local: &UniqueNetId) -> Option<&SearchResult> {
        self.results.iter().find(|result| &result.owning_user_id != local)
    }
}

// ----------------------------------------------------------------------------
// Join Result
// ----------------------------------------------------------------------------

/// Outcome reported by a join completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinResult {
    Success,
    SessionIsFull,
    SessionDoesNotExist,
    CouldNotRetrieveAddress,
    AlreadyInSession,
    UnknownError,
}

impl JoinResult {
    pub fn is_success(self) -> bool {
        matches!(self, JoinResult::Success)
    }
}

impl fmt::Display for JoinResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            JoinResult::Success => "success",
            JoinResult::SessionIsFull => "session is full",
            JoinResult::SessionDoesNotExist => "session does not exist",
            JoinResult::CouldNotRetrieveAddress => "could not retrieve address",
            JoinResult::AlreadyInSession => "already in session",
            JoinResult::UnknownError => "unknown error",
        };
        f.write_str(text)
    }
}

// ----------------------------------------------------------------------------
// Session Phase
// ----------------------------------------------------------------------------

/// Lifecycle phase of the locally hosted session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SessionPhase {
    #[default]
    Idle,
    Creating,
    Starting,
    Active,
    Destroying,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Idle => write!(f, "Idle"),
            SessionPhase::Creating => write!(f, "Creating"),
            SessionPhase::Starting => write!(f, "Starting"),
            SessionPhase::Active => write!(f, "Active"),
            SessionPhase::Destroying => write!(f, "Destroying"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(owner: &str, lan: bool, presence: bool) -> SearchResult {
        SearchResult {
            session_id: format!("{owner}-session"),
            owning_user_id: UniqueNetId::new(owner),
            owning_user_name: owner.to_string(),
            ping_ms: 20,
            open_public_connections: 3,
            settings: SessionSettings::for_host(lan, presence, 4, "FirstPersonExampleMap"),
        }
    }

    #[test]
    fn test_host_settings_flag_policy() {
        let settings = SessionSettings::for_host(true, false, 8, "Arena");
        assert!(settings.is_lan_match);
        assert!(!settings.uses_presence);
        assert_eq!(settings.num_public_connections, 8);
        assert_eq!(settings.num_private_connections, 0);
        assert!(settings.allow_invites && settings.allow_join_in_progress);
        assert!(settings.should_advertise && settings.allow_join_via_presence);
        assert!(!settings.allow_join_via_presence_friends_only);
        assert_eq!(settings.map_name, "Arena");
    }

    #[test]
    fn test_presence_filter_only_for_presence_searches() {
        let policy = SessionPolicy::default();
        let plain = SessionSearch::new(&policy, false, false);
        assert_eq!(plain.presence_filter, None);
        assert_eq!(plain.max_search_results, 20);
        assert_eq!(plain.ping_bucket_size, 50);

        let presence = SessionSearch::new(&policy, false, true);
        assert_eq!(presence.presence_filter, Some(true));
        assert!(presence.matches(&result("a", false, true).settings));
        assert!(!presence.matches(&result("b", false, false).settings));
        assert!(!presence.matches(&result("c", true, true).settings));
    }

    #[test]
    fn test_first_joinable_skips_own_sessions() {
        let mut search = SessionSearch::new(&SessionPolicy::default(), false, false);
        search.results = vec![result("me", false, false), result("other", false, false)];

        let picked = search.first_joinable(&UniqueNetId::new("me")).unwrap();
        assert_eq!(picked.owning_user_id.as_str(), "other");

        search.results = vec![result("me", false, false)];
        assert!(search.first_joinable(&UniqueNetId::new("me")).is_none());
    }
}
