//! Friends and invite coordination
//!
//! After a hosted session starts, the friends list is read and every friend
//! picked by the invite filter gets an invite to the session.

use lobby_core::{FriendRecord, OnlineBackend, SessionName, SessionPolicy};
use tracing::{debug, warn};

// ----------------------------------------------------------------------------
// Invite Filter
// ----------------------------------------------------------------------------

/// Predicate choosing which friends are invited automatically
pub trait InviteFilter: Send {
    fn selects(&self, friend: &FriendRecord) -> bool;
}

/// Selects friends whose display name contains a fixed marker
#[derive(Debug, Clone)]
pub struct MarkerFilter {
    marker: String,
}

impl MarkerFilter {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }
}

impl InviteFilter for MarkerFilter {
    fn selects(&self, friend: &FriendRecord) -> bool {
        !self.marker.is_empty() && friend.display_name.contains(&self.marker)
    }
}

// ----------------------------------------------------------------------------
// Invite Coordinator
// ----------------------------------------------------------------------------

/// Result of one invite pass over a friends list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvitePass {
    /// Friends the backend accepted an invite for
    pub invited: Vec<FriendRecord>,
    /// Selected friends whose invite the backend refused
    pub refused: Vec<FriendRecord>,
}

pub struct InviteCoordinator {
    filter: Box<dyn InviteFilter>,
}

impl InviteCoordinator {
    pub fn new(filter: Box<dyn InviteFilter>) -> Self {
        Self { filter }
    }

    pub fn from_policy(policy: &SessionPolicy) -> Self {
        Self::new(Box::new(MarkerFilter::new(policy.invite_marker.clone())))
    }

    /// Friends the filter picks, in list order
    pub fn select<'a>(&self, friends: &'a [FriendRecord]) -> Vec<&'a FriendRecord> {
        friends
            .iter()
            .filter(|friend| self.filter.selects(friend))
            .collect()
    }

    /// Invite every selected friend to `session`
    pub fn invite_selected(
        &self,
        backend: &mut dyn OnlineBackend,
        controller_slot: u32,
        session: &SessionName,
        friends: &[FriendRecord],
    ) -> InvitePass {
        let mut pass = InvitePass::default();

        for friend in self.select(friends) {
            if backend.send_session_invite(controller_slot, session, &friend.user_id) {
                debug!("Invited {} to {}", friend.display_name, session);
                pass.invited.push(friend.clone());
            } else {
                warn!("Backend refused invite for {}", friend.display_name);
                pass.refused.push(friend.clone());
            }
        }

        pass
    }
}

impl std::fmt::Debug for InviteCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InviteCoordinator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lobby_core::UniqueNetId;

    fn friends() -> Vec<FriendRecord> {
        vec![
            FriendRecord::new(UniqueNetId::new("1"), "Alice"),
            FriendRecord::new(UniqueNetId::new("2"), "Pingu99"),
            FriendRecord::new(UniqueNetId::new("3"), "Bob"),
        ]
    }

    #[test]
    fn test_marker_filter_selects_only_marked_friends() {
        let coordinator = InviteCoordinator::from_policy(&SessionPolicy::default());
        let list = friends();
        let selected = coordinator.select(&list);

        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].display_name, "Pingu99");
    }

    #[test]
    fn test_marker_is_case_sensitive_and_empty_marker_selects_nobody() {
        let list = vec![FriendRecord::new(UniqueNetId::new("4"), "pingu")];
        assert!(InviteCoordinator::from_policy(&SessionPolicy::default())
            .select(&list)
            .is_empty());

        let coordinator = InviteCoordinator::new(Box::new(MarkerFilter::new("")));
        assert!(coordinator.select(&friends()).is_empty());
    }
}
