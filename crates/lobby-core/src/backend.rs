//! Online Backend Trait Definition
//!
//! Defines the capability interface an online service must provide. Concrete
//! adapters live in their own crates (`lobby-loopback`) or in the test
//! harness (`lobby-harness`).

use core::fmt;
use serde::{Deserialize, Serialize};

use crate::channel::CompletionSender;
use crate::session::{SearchResult, SessionSearch, SessionSettings};
use crate::types::{FriendRecord, SessionName, UniqueNetId};
use crate::LobbyResult;

// ----------------------------------------------------------------------------
// Subscriptions
// ----------------------------------------------------------------------------

/// Kinds of completion the backend can be subscribed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SubscriptionKind {
    CreateSession,
    StartSession,
    FindSessions,
    JoinSession,
    DestroySession,
    ReadFriendsList,
    InviteAccepted,
    InviteReceived,
}

impl SubscriptionKind {
    /// Kinds that fire once per request and are released by their completion
    pub const ONE_SHOT: [SubscriptionKind; 6] = [
        SubscriptionKind::CreateSession,
        SubscriptionKind::StartSession,
        SubscriptionKind::FindSessions,
        SubscriptionKind::JoinSession,
        SubscriptionKind::DestroySession,
        SubscriptionKind::ReadFriendsList,
    ];

    /// Listener kinds stay registered across many notifications
    pub fn is_one_shot(self) -> bool {
        !matches!(
            self,
            SubscriptionKind::InviteAccepted | SubscriptionKind::InviteReceived
        )
    }
}

impl fmt::Display for SubscriptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubscriptionKind::CreateSession => "CreateSession",
            SubscriptionKind::StartSession => "StartSession",
            SubscriptionKind::FindSessions => "FindSessions",
            SubscriptionKind::JoinSession => "JoinSession",
            SubscriptionKind::DestroySession => "DestroySession",
            SubscriptionKind::ReadFriendsList => "ReadFriendsList",
            SubscriptionKind::InviteAccepted => "InviteAccepted",
            SubscriptionKind::InviteReceived => "InviteReceived",
        };
        f.write_str(name)
    }
}

/// Opaque handle identifying one registration with the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionToken(u64);

impl SubscriptionToken {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ----------------------------------------------------------------------------
// Online Backend Trait
// ----------------------------------------------------------------------------

/// Capability provider for online sessions and friends
///
/// Every asynchronous operation returns the backend's synchronous
/// accept/reject. An accepted operation later pushes exactly one
/// [`Completion`](crate::channel::Completion) of the matching kind into the
/// attached completion channel, and only while a subscription for that kind
/// is registered. A rejected operation never completes.
///
/// Calls are made from the session logic task only, so implementations need
/// no internal synchronisation for their own state.
pub trait OnlineBackend: Send {
    /// Human-readable backend name for diagnostics
    fn name(&self) -> &str;

    /// Attach the channel through which completions are delivered
    ///
    /// Called once by the runtime before any request is issued.
    fn attach_completions(&mut self, sender: CompletionSender) -> LobbyResult<()>;

    /// Register interest in completions of `kind`
    fn register(&mut self, kind: SubscriptionKind) -> SubscriptionToken;

    /// Release a registration previously returned by [`register`](Self::register)
    fn release(&mut self, kind: SubscriptionKind, token: SubscriptionToken);

    fn create_session(
        &mut self,
        local: &UniqueNetId,
        name: &SessionName,
        settings: &SessionSettings,
    ) -> bool;

    fn start_session(&mut self, name: &SessionName) -> bool;

    /// Start a search; results arrive with the find completion
    fn find_sessions(&mut self, local: &UniqueNetId, search: &SessionSearch) -> bool;

    fn join_session(&mut self, local: &UniqueNetId, name: &SessionName, result: &SearchResult)
        -> bool;

    fn destroy_session(&mut self, name: &SessionName) -> bool;

    fn send_session_invite(
        &mut self,
        controller_slot: u32,
        name: &SessionName,
        friend: &UniqueNetId,
    ) -> bool;

    fn read_friends_list(&mut self, controller_slot: u32, list_name: &str) -> bool;

    /// Friends cached by the last successful read of `list_name`
    fn friends_list(&self, controller_slot: u32, list_name: &str) -> Vec<FriendRecord>;

    /// Backend-specific address the transport layer uses to reach a joined session
    fn resolved_connect_string(&self, name: &SessionName) -> Option<String>;
}
