//! Loopback network
//!
//! Shared in-process state standing in for an online service: users and
//! their friends, advertised sessions, pending invites and, per user, the
//! completion channel and live subscriptions of the backend acting for them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lobby_core::{
    channel::{ChannelError, NonBlockingSend},
    Completion, CompletionSender, FriendRecord, LobbyError, LobbyResult, SearchResult,
    SessionName, SessionSettings, SubscriptionKind, SubscriptionToken, UniqueNetId,
};
use tracing::{debug, info, warn};

use crate::backend::LoopbackBackend;

/// A session advertised on the loopback network
#[derive(Debug, Clone)]
pub(crate) struct HostedSession {
    pub session_id: String,
    pub owner: UniqueNetId,
    pub settings: SessionSettings,
    pub started: bool,
    pub members: Vec<UniqueNetId>,
}

impl HostedSession {
    pub fn open_connections(&self) -> u32 {
        let taken = u32::try_from(self.members.len()).unwrap_or(u32::MAX);
        self.settings.num_public_connections.saturating_sub(taken)
    }
}

/// A user's local handle on a session, hosted or joined
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LocalSession {
    pub session_id: String,
    pub hosted: bool,
}

/// An invite waiting for the invitee to accept it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingInvite {
    pub inviter: UniqueNetId,
    pub session: SearchResult,
}

#[derive(Debug, Default)]
pub(crate) struct UserEntry {
    pub display_name: String,
    pub friends: Vec<UniqueNetId>,
    pub sender: Option<CompletionSender>,
    pub live: HashMap<SubscriptionKind, SubscriptionToken>,
    pub sessions: HashMap<SessionName, LocalSession>,
    pub invites: Vec<PendingInvite>,
}

#[derive(Debug, Default)]
pub(crate) struct NetworkState {
    pub users: HashMap<UniqueNetId, UserEntry>,
    pub sessions: HashMap<String, HostedSession>,
}

impl NetworkState {
    /// Deliver `completion` to `user` if they listen for its kind
    pub fn deliver(&self, user: &UniqueNetId, completion: Completion) -> bool {
        let kind = completion.kind();
        let Some(entry) = self.users.get(user) else {
            warn!("Completion for unknown loopback user {}", user);
            return false;
        };
        if !entry.live.contains_key(&kind) {
            debug!("{} has no live {} subscription", user, kind);
            return false;
        }
        let Some(sender) = entry.sender.as_ref() else {
            return false;
        };
        match sender.try_send_non_blocking(completion) {
            Ok(()) => true,
            Err(ChannelError::ChannelFull) => {
                warn!("Completion channel of {} full, {} dropped", user, kind);
                false
            }
            Err(ChannelError::ChannelClosed) => false,
        }
    }

    pub fn search_result(&self, session: &HostedSession) -> SearchResult {
        let owning_user_name = self
            .users
            .get(&session.owner)
            .map(|entry| entry.display_name.clone())
            .unwrap_or_else(|| session.owner.to_string());
        SearchResult {
            session_id: session.session_id.clone(),
            owning_user_id: session.owner.clone(),
            owning_user_name,
            ping_ms: 1,
            open_public_connections: session.open_connections(),
            settings: session.settings.clone(),
        }
    }

    pub fn display_name(&self, user: &UniqueNetId) -> String {
        self.users
            .get(user)
            .map(|entry| entry.display_name.clone())
            .unwrap_or_else(|| user.to_string())
    }
}

// ----------------------------------------------------------------------------
// Loopback Network
// ----------------------------------------------------------------------------

/// Shared handle to one loopback network
#[derive(Debug, Clone, Default)]
pub struct LoopbackNetwork {
    state: Arc<Mutex<NetworkState>>,
}

impl LoopbackNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, NetworkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a user; an existing user only has their display name updated
    pub fn add_user(&self, user: UniqueNetId, display_name: impl Into<String>) {
        let display_name = display_name.into();
        debug!("Loopback user {} ({})", user, display_name);
        self.lock().users.entry(user).or_default().display_name = display_name;
    }

    /// Make two users friends of each other
    pub fn befriend(&self, a: &UniqueNetId, b: &UniqueNetId) -> LobbyResult<()> {
        let mut state = self.lock();
        for (user, friend) in [(a, b), (b, a)] {
            let entry = state
                .users
                .get_mut(user)
                .ok_or_else(|| LobbyError::config_error(format!("Unknown loopback user {}", user)))?;
            if !entry.friends.contains(friend) {
                entry.friends.push(friend.clone());
            }
        }
        Ok(())
    }

    /// Backend acting for `user`
    pub fn backend_for(&self, user: &UniqueNetId) -> LobbyResult<LoopbackBackend> {
        if !self.lock().users.contains_key(user) {
            return Err(LobbyError::config_error(format!(
                "Unknown loopback user {}",
                user
            )));
        }
        Ok(LoopbackBackend::new(self.clone(), user.clone()))
    }

    /// Advertise an already started session owned by `owner`
    pub fn advertise(&self, owner: &UniqueNetId, settings: SessionSettings) -> LobbyResult<String> {
        let mut state = self.lock();
        if !state.users.contains_key(owner) {
            return Err(LobbyError::config_error(format!(
                "Unknown loopback user {}",
                owner
            )));
        }
        let session_id = uuid::Uuid::new_v4().to_string();
        state.sessions.insert(
            session_id.clone(),
            HostedSession {
                session_id: session_id.clone(),
                owner: owner.clone(),
                settings,
                started: true,
                members: Vec::new(),
            },
        );
        Ok(session_id)
    }

    /// Every advertised session, started or not
    pub fn sessions(&self) -> Vec<SearchResult> {
        let state = self.lock();
        state
            .sessions
            .values()
            .map(|session| state.search_result(session))
            .collect()
    }

    /// Members of an advertised session, owner excluded
    pub fn members(&self, session_id: &str) -> Vec<UniqueNetId> {
        self.lock()
            .sessions
            .get(session_id)
            .map(|session| session.members.clone())
            .unwrap_or_default()
    }

    pub fn pending_invites(&self, user: &UniqueNetId) -> Vec<PendingInvite> {
        self.lock()
            .users
            .get(user)
            .map(|entry| entry.invites.clone())
            .unwrap_or_default()
    }

    /// Accept a pending invite the way the platform overlay would
    ///
    /// Returns whether the `InviteAccepted` notification reached a listener.
    pub fn accept_invite(&self, user: &UniqueNetId, session_id: &str) -> bool {
        let mut state = self.lock();
        let Some(entry) = state.users.get_mut(user) else {
            return false;
        };
        let Some(index) = entry
            .invites
            .iter()
            .position(|invite| invite.session.session_id == session_id)
        else {
            warn!("{} has no invite to {}", user, session_id);
            return false;
        };
        let invite = entry.invites.remove(index);

        info!("{} accepted invite from {}", user, invite.inviter);
        state.deliver(
            user,
            Completion::InviteAccepted {
                success: true,
                controller_slot: 0,
                user_id: Some(user.clone()),
                search_result: Some(invite.session),
            },
        )
    }

    pub(crate) fn friends_of(&self, user: &UniqueNetId) -> Vec<FriendRecord> {
        let state = self.lock();
        state
            .users
            .get(user)
            .map(|entry| {
                entry
                    .friends
                    .iter()
                    .map(|friend| FriendRecord::new(friend.clone(), state.display_name(friend)))
                    .collect()
            })
            .unwrap_or_default()
    }
}
