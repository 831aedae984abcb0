//! Session Command Handlers
//!
//! The controller operations: host, find, join, destroy and invite. Each one
//! checks its preconditions, registers the completion subscription it needs
//! and issues the backend request. Precondition failures are returned as
//! errors before the backend is touched.

use lobby_core::{
    AppEvent, LobbyError, LobbyResult, LocalPlayer, OnlineBackend, RequestError, SearchResult,
    SessionName, SessionPhase, SessionSearch, SessionSettings, SubscriptionKind, UniqueNetId,
};
use tracing::{debug, info};

use super::completions::CompletionHandlers;
use super::state::{CoreState, Outcome};

/// Command handlers for the session logic task
pub struct CommandHandlers;

impl CommandHandlers {
    /// Handle host session command
    pub fn handle_host_session(
        state: &mut CoreState,
        backend: Option<&mut dyn OnlineBackend>,
        session_name: SessionName,
        is_lan: bool,
        is_presence: bool,
        max_players: u32,
    ) -> LobbyResult<Outcome> {
        let user_id = state.valid_local_player()?.user_id.clone();
        let backend = backend.ok_or(RequestError::NoBackend)?;

        if state.phase != SessionPhase::Idle {
            return Err(RequestError::InvalidPhase {
                expected: SessionPhase::Idle,
                actual: state.phase,
            }
            .into());
        }
        if let Some(name) = &state.session_name {
            return Err(RequestError::SessionExists { name: name.clone() }.into());
        }

        let settings =
            SessionSettings::for_host(is_lan, is_presence, max_players, &state.policy.map_name);

        state
            .subscriptions
            .register(backend, SubscriptionKind::CreateSession)?;

        if !backend.create_session(&user_id, &session_name, &settings) {
            state
                .subscriptions
                .release(backend, SubscriptionKind::CreateSession);
            return Err(LobbyError::rejected("create session"));
        }

        info!("Creating session {} for {}", session_name, user_id);
        let mut outcome = Outcome::accepted(true);
        state.settings = Some(settings);
        state.pending_session_name = Some(session_name);
        state.transition(SessionPhase::Creating, &mut outcome);
        Ok(outcome)
    }

    /// Handle find sessions command
    ///
    /// Without a backend the find completion runs immediately with failure,
    /// so callers always observe a completion.
    pub fn handle_find_sessions(
        state: &mut CoreState,
        backend: Option<&mut dyn OnlineBackend>,
        is_lan: bool,
        is_presence: bool,
    ) -> LobbyResult<Outcome> {
        let user_id = state.valid_local_player()?.user_id.clone();

        let Some(backend) = backend else {
            debug!("No backend available, completing search with failure");
            state.search = Some(SessionSearch::new(&state.policy, is_lan, is_presence));
            let mut outcome = CompletionHandlers::find_sessions_complete(state, false, Vec::new());
            outcome.accepted = false;
            return Ok(outcome);
        };

        state
            .subscriptions
            .register(backend, SubscriptionKind::FindSessions)?;

        let search = SessionSearch::new(&state.policy, is_lan, is_presence);
        let accepted = backend.find_sessions(&user_id, &search);
        state.search = Some(search);

        if !accepted {
            state
                .subscriptions
                .release(backend, SubscriptionKind::FindSessions);
            return Err(LobbyError::rejected("find sessions"));
        }

        debug!("Searching for sessions (lan: {}, presence: {})", is_lan, is_presence);
        Ok(Outcome::accepted(true))
    }

    /// Handle join session command: join the first session we do not own
    pub fn handle_join_session(
        state: &mut CoreState,
        backend: Option<&mut dyn OnlineBackend>,
    ) -> LobbyResult<Outcome> {
        let user_id = state.valid_local_player()?.user_id.clone();
        let backend = backend.ok_or(RequestError::NoBackend)?;

        let result = state
            .search
            .as_ref()
            .and_then(|search| search.first_joinable(&user_id))
            .cloned()
            .ok_or(RequestError::NoJoinableSession)?;

        Self::join_search_result(state, backend, &user_id, &result)
    }

    /// Join a specific search result under the policy's join session name
    pub fn join_search_result(
        state: &mut CoreState,
        backend: &mut dyn OnlineBackend,
        user_id: &UniqueNetId,
        result: &SearchResult,
    ) -> LobbyResult<Outcome> {
        let name = SessionName::new(state.policy.join_session_name.clone());

        state
            .subscriptions
            .register(backend, SubscriptionKind::JoinSession)?;

        if !backend.join_session(user_id, &name, result) {
            state
                .subscriptions
                .release(backend, SubscriptionKind::JoinSession);
            return Err(LobbyError::rejected("join session"));
        }

        info!(
            "Joining session {} hosted by {}",
            result.session_id, result.owning_user_name
        );
        Ok(Outcome::accepted(true))
    }

    /// Handle destroy session command
    ///
    /// Destroys the hosted session when one exists, including one that was
    /// created but never started, otherwise leaves the joined session.
    /// Silently does nothing without a backend.
    pub fn handle_destroy_session(
        state: &mut CoreState,
        backend: Option<&mut dyn OnlineBackend>,
    ) -> LobbyResult<Outcome> {
        let Some(backend) = backend else {
            debug!("No backend available, ignoring destroy");
            return Ok(Outcome::accepted(false));
        };

        let name = match state.phase {
            SessionPhase::Active => state.session_name.clone(),
            SessionPhase::Idle => state
                .session_name
                .clone()
                .or_else(|| state.joined_session.clone()),
            actual => {
                return Err(RequestError::InvalidPhase {
                    expected: SessionPhase::Active,
                    actual,
                }
                .into())
            }
        }
        .ok_or(RequestError::NoActiveSession)?;

        state
            .subscriptions
            .register(backend, SubscriptionKind::DestroySession)?;

        if !backend.destroy_session(&name) {
            state
                .subscriptions
                .release(backend, SubscriptionKind::DestroySession);
            return Err(LobbyError::rejected("destroy session"));
        }

        info!("Destroying session {}", name);
        let mut outcome = Outcome::accepted(true);
        if state.phase == SessionPhase::Active {
            state.transition(SessionPhase::Destroying, &mut outcome);
        }
        Ok(outcome)
    }

    /// Handle send invite command for a raw friend id
    pub fn handle_send_invite(
        state: &mut CoreState,
        backend: Option<&mut dyn OnlineBackend>,
        friend_id: &str,
    ) -> LobbyResult<Outcome> {
        let controller_slot = state.valid_local_player()?.controller_slot;
        let backend = backend.ok_or(RequestError::NoBackend)?;
        let friend: UniqueNetId = friend_id.parse()?;
        let session = state
            .session_name
            .clone()
            .filter(|_| state.is_hosting())
            .ok_or(RequestError::NoActiveSession)?;

        if !backend.send_session_invite(controller_slot, &session, &friend) {
            return Err(LobbyError::rejected("send invite"));
        }

        state.stats.invites_sent += 1;
        Ok(Outcome::accepted(true).with_app_event(AppEvent::FriendInvited {
            display_name: friend.to_string(),
            friend,
        }))
    }

    /// Handle set local player command
    pub fn handle_set_local_player(
        state: &mut CoreState,
        player: Option<LocalPlayer>,
    ) -> LobbyResult<Outcome> {
        let valid = player.as_ref().map(LocalPlayer::is_valid).unwrap_or(false);
        match &player {
            Some(player) => info!("Local player set to {}", player.user_id),
            None => info!("Local player signed out"),
        }
        state.local_player = player;
        Ok(Outcome::accepted(valid))
    }
}
