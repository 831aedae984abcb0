//! Channel Communication Protocol Types
//!
//! This module defines the typed communication protocol.
//! All traffic in and out of the session logic task flows through these types.

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::backend::SubscriptionKind;
use crate::session::{JoinResult, SearchResult, SessionPhase};
use crate::types::{LocalPlayer, SessionName, UniqueNetId};

// ----------------------------------------------------------------------------
// Command: UI/External → Session Logic
// ----------------------------------------------------------------------------

/// Requests issued to the session logic task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Create, then automatically start, a session
    HostSession {
        session_name: SessionName,
        is_lan: bool,
        is_presence: bool,
        max_players: u32,
    },
    /// Search for joinable sessions
    FindSessions { is_lan: bool, is_presence: bool },
    /// Join the first non-self session of the last search
    JoinSession,
    /// Destroy the hosted session, or leave the joined one
    DestroySession,
    /// Invite a friend, by raw id, to the hosted session
    SendInviteToFriend { friend_id: String },
    /// Replace the local player identity (`None` signs the player out)
    SetLocalPlayer { player: Option<LocalPlayer> },
    /// Request a status report
    GetStatus,
    /// Stop the logic task
    Shutdown,
}

impl Command {
    /// Operation name used in diagnostics
    pub fn operation(&self) -> &'static str {
        match self {
            Command::HostSession { .. } => "host session",
            Command::FindSessions { .. } => "find sessions",
            Command::JoinSession => "join session",
            Command::DestroySession => "destroy session",
            Command::SendInviteToFriend { .. } => "send invite",
            Command::SetLocalPlayer { .. } => "set local player",
            Command::GetStatus => "get status",
            Command::Shutdown => "shutdown",
        }
    }
}

/// A command plus the channel the synchronous accept/reject goes back on
#[derive(Debug)]
pub struct CommandRequest {
    pub command: Command,
    pub reply: Option<oneshot::Sender<bool>>,
}

impl CommandRequest {
    /// Fire-and-forget request without a reply channel
    pub fn new(command: Command) -> Self {
        Self {
            command,
            reply: None,
        }
    }

    /// Request plus the receiver for its accept/reject reply
    pub fn with_reply(command: Command) -> (Self, oneshot::Receiver<bool>) {
        let (sender, receiver) = oneshot::channel();
        (
            Self {
                command,
                reply: Some(sender),
            },
            receiver,
        )
    }
}

// ----------------------------------------------------------------------------
// Completion: Backend → Session Logic
// ----------------------------------------------------------------------------

/// Completion notifications pushed by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Completion {
    CreateSession {
        session_name: SessionName,
        success: bool,
    },
    StartSession {
        session_name: SessionName,
        success: bool,
    },
    FindSessions {
        success: bool,
        results: Vec<SearchResult>,
    },
    JoinSession {
        session_name: SessionName,
        result: JoinResult,
    },
    DestroySession {
        session_name: SessionName,
        success: bool,
    },
    ReadFriendsList {
        controller_slot: u32,
        success: bool,
        list_name: String,
        error: String,
    },
    /// The local user accepted an invite through the platform
    InviteAccepted {
        success: bool,
        controller_slot: u32,
        user_id: Option<UniqueNetId>,
        search_result: Option<SearchResult>,
    },
    /// Someone invited the local user
    InviteReceived {
        invited: UniqueNetId,
        inviter: UniqueNetId,
        app_id: String,
        search_result: SearchResult,
    },
}

impl Completion {
    /// Subscription kind this completion belongs to
    pub fn kind(&self) -> SubscriptionKind {
        match self {
            Completion::CreateSession { .. } => SubscriptionKind::CreateSession,
            Completion::StartSession { .. } => SubscriptionKind::StartSession,
            Completion::FindSessions { .. } => SubscriptionKind::FindSessions,
            Completion::JoinSession { .. } => SubscriptionKind::JoinSession,
            Completion::DestroySession { .. } => SubscriptionKind::DestroySession,
            Completion::ReadFriendsList { .. } => SubscriptionKind::ReadFriendsList,
            Completion::InviteAccepted { .. } => SubscriptionKind::InviteAccepted,
            Completion::InviteReceived { .. } => SubscriptionKind::InviteReceived,
        }
    }
}

// ----------------------------------------------------------------------------
// Effect: Session Logic → Presentation / Transport
// ----------------------------------------------------------------------------

/// Side effects for the presentation and connection layers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// Load a map; `listen` opens it as a listen server
    OpenLevel { map_name: String, listen: bool },
    /// Connect the local client to a joined session
    ClientTravel { connect_string: String },
}

// ----------------------------------------------------------------------------
// AppEvent: Session Logic → UI (Diagnostics)
// ----------------------------------------------------------------------------

/// One entry of a search summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSummary {
    pub index: usize,
    pub session_id: String,
    pub owning_user_name: String,
    pub ping_ms: u32,
}

impl SearchSummary {
    pub fn from_results(results: &[SearchResult]) -> Vec<Self> {
        results
            .iter()
            .enumerate()
            .map(|(index, result)| Self {
                index: index + 1,
                session_id: result.session_id.clone(),
                owning_user_name: result.owning_user_name.clone(),
                ping_ms: result.ping_ms,
            })
            .collect()
    }
}

/// Diagnostic events for the UI or operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppEvent {
    PhaseChanged {
        from: SessionPhase,
        to: SessionPhase,
    },
    SessionCreated {
        session_name: SessionName,
        success: bool,
    },
    SessionStarted {
        session_name: SessionName,
        success: bool,
    },
    SearchCompleted {
        success: bool,
        results: Vec<SearchSummary>,
    },
    JoinCompleted {
        session_name: SessionName,
        result: JoinResult,
    },
    SessionDestroyed {
        session_name: SessionName,
        success: bool,
    },
    FriendsListRead {
        success: bool,
        friend_count: usize,
        error: Option<String>,
    },
    FriendInvited {
        friend: UniqueNetId,
        display_name: String,
    },
    InviteReceived {
        inviter: UniqueNetId,
        session_id: String,
    },
    InviteAccepted {
        success: bool,
        session_id: Option<String>,
    },
    /// A request was refused before or by the backend
    RequestFailed {
        operation: String,
        reason: String,
    },
    StatusReport {
        phase: SessionPhase,
        session_name: Option<SessionName>,
        joined_session: Option<SessionName>,
        outstanding: Vec<SubscriptionKind>,
        search_results: usize,
        commands_processed: u64,
        completions_processed: u64,
        stale_completions: u64,
    },
    SystemError {
        error: String,
    },
}
