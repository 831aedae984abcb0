//! Session Logic State Management
//!
//! Contains the controller state, its statistics and the handler outcome type.

use lobby_core::{
    AppEvent, Effect, LocalPlayer, LobbyError, RequestError, SessionName, SessionPhase,
    SessionPolicy, SessionSearch, SessionSettings,
};
use std::time::Instant;

use crate::managers::{InviteCoordinator, SubscriptionManager};

// ----------------------------------------------------------------------------
// Core Logic State
// ----------------------------------------------------------------------------

/// State owned by the session logic task
#[derive(Debug)]
pub struct CoreState {
    /// First local player, if one is signed in
    pub local_player: Option<LocalPlayer>,
    /// Phase of the locally hosted session
    pub phase: SessionPhase,
    /// Identity of the hosted session, set once creation succeeded
    pub session_name: Option<SessionName>,
    /// Name requested by the host call currently being created
    pub pending_session_name: Option<SessionName>,
    /// Settings submitted with the last host request
    pub settings: Option<SessionSettings>,
    /// Most recent search and its results
    pub search: Option<SessionSearch>,
    /// Session joined as a client
    pub joined_session: Option<SessionName>,
    pub subscriptions: SubscriptionManager,
    pub invites: InviteCoordinator,
    pub policy: SessionPolicy,
    pub start_time: Instant,
    pub stats: CoreStats,
}

impl CoreState {
    pub fn new(local_player: Option<LocalPlayer>, policy: SessionPolicy) -> Self {
        Self {
            local_player,
            phase: SessionPhase::Idle,
            session_name: None,
            pending_session_name: None,
            settings: None,
            search: None,
            joined_session: None,
            subscriptions: SubscriptionManager::new(),
            invites: InviteCoordinator::from_policy(&policy),
            policy,
            start_time: Instant::now(),
            stats: CoreStats::default(),
        }
    }

    /// The local player, provided its identity is valid
    pub fn valid_local_player(&self) -> Result<&LocalPlayer, RequestError> {
        self.local_player
            .as_ref()
            .filter(|player| player.is_valid())
            .ok_or(RequestError::NoLocalPlayer)
    }

    /// Move to `to`, recording the transition
    pub fn transition(&mut self, to: SessionPhase, outcome: &mut Outcome) {
        if self.phase == to {
            return;
        }
        let from = self.phase;
        self.phase = to;
        self.stats.state_transitions += 1;
        outcome.app_events.push(AppEvent::PhaseChanged { from, to });
    }

    pub fn is_hosting(&self) -> bool {
        self.phase == SessionPhase::Active && self.session_name.is_some()
    }
}

/// Statistics for the session logic task
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreStats {
    pub commands_processed: u64,
    pub completions_processed: u64,
    /// Completions that arrived without a live subscription
    pub stale_completions: u64,
    pub requests_failed: u64,
    pub state_transitions: u64,
    pub invites_sent: u64,
}

// ----------------------------------------------------------------------------
// Handler Outcome
// ----------------------------------------------------------------------------

/// What a command or completion produced
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Synchronous accept/reject returned to the caller
    pub accepted: bool,
    pub effects: Vec<Effect>,
    pub app_events: Vec<AppEvent>,
}

impl Outcome {
    pub fn accepted(accepted: bool) -> Self {
        Self {
            accepted,
            ..Self::default()
        }
    }

    pub fn with_app_event(mut self, event: AppEvent) -> Self {
        self.app_events.push(event);
        self
    }

    /// Append another outcome's effects and events, keeping this verdict
    pub fn absorb(&mut self, other: Outcome) {
        self.effects.extend(other.effects);
        self.app_events.extend(other.app_events);
    }

    /// Outcome reporting a failed request
    pub fn failed(operation: &str, error: &LobbyError) -> Self {
        Self::accepted(false).with_app_event(AppEvent::RequestFailed {
            operation: operation.to_string(),
            reason: error.to_string(),
        })
    }
}
