//! Backend Completion Handlers
//!
//! Every completion first releases its own subscription, then advances the
//! session state. Completions whose subscription is no longer live are stale
//! and dropped without touching state.

use lobby_core::{
    AppEvent, Completion, Effect, JoinResult, LobbyError, OnlineBackend, SearchResult,
    SearchSummary, SessionName, SessionPhase, SubscriptionKind, UniqueNetId,
};
use tracing::{debug, info, warn};

use super::handlers::CommandHandlers;
use super::state::{CoreState, Outcome};

/// Completion handlers for the session logic task
pub struct CompletionHandlers;

impl CompletionHandlers {
    /// Route a completion to its handler
    pub fn handle(
        state: &mut CoreState,
        backend: &mut dyn OnlineBackend,
        completion: Completion,
    ) -> Outcome {
        state.stats.completions_processed += 1;
        let kind = completion.kind();

        let live = if kind.is_one_shot() {
            state.subscriptions.release(backend, kind).is_some()
        } else {
            state.subscriptions.is_registered(kind)
        };
        if !live {
            state.stats.stale_completions += 1;
            warn!("Dropping {} completion without a live subscription", kind);
            return Outcome::default();
        }

        match completion {
            Completion::CreateSession {
                session_name,
                success,
            } => Self::create_session_complete(state, backend, session_name, success),
            Completion::StartSession {
                session_name,
                success,
            } => Self::start_session_complete(state, backend, session_name, success),
            Completion::FindSessions { success, results } => {
                Self::find_sessions_complete(state, success, results)
            }
            Completion::JoinSession {
                session_name,
                result,
            } => Self::join_session_complete(state, backend, session_name, result),
            Completion::DestroySession {
                session_name,
                success,
            } => Self::destroy_session_complete(state, session_name, success),
            Completion::ReadFriendsList {
                controller_slot,
                success,
                list_name,
                error,
            } => Self::read_friends_list_complete(
                state,
                backend,
                controller_slot,
                success,
                &list_name,
                error,
            ),
            Completion::InviteAccepted {
                success,
                search_result,
                ..
            } => Self::invite_accepted(state, backend, success, search_result),
            Completion::InviteReceived {
                inviter,
                search_result,
                ..
            } => Self::invite_received(inviter, search_result),
        }
    }

    fn create_session_complete(
        state: &mut CoreState,
        backend: &mut dyn OnlineBackend,
        session_name: SessionName,
        success: bool,
    ) -> Outcome {
        let mut outcome = Outcome::accepted(success).with_app_event(AppEvent::SessionCreated {
            session_name: session_name.clone(),
            success,
        });

        if let Some(pending) = state.pending_session_name.take() {
            if pending != session_name {
                warn!("Created session {} but requested {}", session_name, pending);
            }
        }

        if !success {
            warn!("Session {} could not be created", session_name);
            state.settings = None;
            state.transition(SessionPhase::Idle, &mut outcome);
            return outcome;
        }

        state.session_name = Some(session_name.clone());

        let started = match state
            .subscriptions
            .register(backend, SubscriptionKind::StartSession)
        {
            Ok(_) => {
                if backend.start_session(&session_name) {
                    true
                } else {
                    state
                        .subscriptions
                        .release(backend, SubscriptionKind::StartSession);
                    outcome.absorb(Outcome::failed(
                        "start session",
                        &LobbyError::rejected("start session"),
                    ));
                    false
                }
            }
            Err(e) => {
                outcome.absorb(Outcome::failed("start session", &e));
                false
            }
        };

        if started {
            debug!("Starting session {}", session_name);
            state.transition(SessionPhase::Starting, &mut outcome);
        } else {
            // Created but not started; the identity stays so it can be destroyed
            state.transition(SessionPhase::Idle, &mut outcome);
        }
        outcome
    }

    fn start_session_complete(
        state: &mut CoreState,
        backend: &mut dyn OnlineBackend,
        session_name: SessionName,
        success: bool,
    ) -> Outcome {
        let mut outcome = Outcome::accepted(success).with_app_event(AppEvent::SessionStarted {
            session_name: session_name.clone(),
            success,
        });

        if !success {
            warn!("Session {} created but could not be started", session_name);
            state.transition(SessionPhase::Idle, &mut outcome);
            return outcome;
        }

        info!("Session {} started", session_name);
        outcome.effects.push(Effect::OpenLevel {
            map_name: state.policy.map_name.clone(),
            listen: true,
        });
        state.transition(SessionPhase::Active, &mut outcome);
        state
            .subscriptions
            .ensure(backend, SubscriptionKind::InviteAccepted);

        let controller_slot = match state.valid_local_player() {
            Ok(player) => player.controller_slot,
            Err(e) => {
                outcome.absorb(Outcome::failed("read friends list", &e.into()));
                return outcome;
            }
        };

        match state
            .subscriptions
            .register(backend, SubscriptionKind::ReadFriendsList)
        {
            Ok(_) => {
                if !backend.read_friends_list(controller_slot, &state.policy.friends_list_name) {
                    state
                        .subscriptions
                        .release(backend, SubscriptionKind::ReadFriendsList);
                    outcome.absorb(Outcome::failed(
                        "read friends list",
                        &LobbyError::rejected("read friends list"),
                    ));
                }
            }
            Err(e) => outcome.absorb(Outcome::failed("read friends list", &e)),
        }
        outcome
    }

    /// Store the results of a search and summarise them
    pub fn find_sessions_complete(
        state: &mut CoreState,
        success: bool,
        mut results: Vec<SearchResult>,
    ) -> Outcome {
        let summary = match state.search.as_mut() {
            Some(search) => {
                if success {
                    results.truncate(search.max_search_results);
                    search.results = results;
                } else {
                    search.results.clear();
                }
                SearchSummary::from_results(&search.results)
            }
            None => {
                warn!("Search completed with no search in progress");
                Vec::new()
            }
        };

        info!("Session search finished (success: {}, found: {})", success, summary.len());
        Outcome::accepted(success).with_app_event(AppEvent::SearchCompleted {
            success,
            results: summary,
        })
    }

    fn join_session_complete(
        state: &mut CoreState,
        backend: &mut dyn OnlineBackend,
        session_name: SessionName,
        result: JoinResult,
    ) -> Outcome {
        let mut outcome =
            Outcome::accepted(result.is_success()).with_app_event(AppEvent::JoinCompleted {
                session_name: session_name.clone(),
                result,
            });

        if !result.is_success() {
            warn!("Joining {} failed: {}", session_name, result);
            return outcome;
        }

        match backend.resolved_connect_string(&session_name) {
            Some(connect_string) => {
                info!("Travelling to {}", connect_string);
                state.joined_session = Some(session_name);
                outcome
                    .effects
                    .push(Effect::ClientTravel { connect_string });
            }
            None => {
                outcome.app_events.push(AppEvent::SystemError {
                    error: format!("Could not resolve connect string for {}", session_name),
                });
            }
        }
        outcome
    }

    fn destroy_session_complete(
        state: &mut CoreState,
        session_name: SessionName,
        success: bool,
    ) -> Outcome {
        let mut outcome =
            Outcome::accepted(success).with_app_event(AppEvent::SessionDestroyed {
                session_name: session_name.clone(),
                success,
            });
        let hosted = state.phase == SessionPhase::Destroying
            || state.session_name.as_ref() == Some(&session_name);

        if !success {
            warn!("Session {} could not be destroyed", session_name);
            if state.phase == SessionPhase::Destroying {
                state.transition(SessionPhase::Active, &mut outcome);
            }
            return outcome;
        }

        info!("Session {} destroyed", session_name);
        if hosted {
            state.session_name = None;
            state.settings = None;
            state.transition(SessionPhase::Idle, &mut outcome);
        } else if state.joined_session.as_ref() == Some(&session_name) {
            state.joined_session = None;
        }
        outcome.effects.push(Effect::OpenLevel {
            map_name: state.policy.entry_map.clone(),
            listen: false,
        });
        outcome
    }

    fn read_friends_list_complete(
        state: &mut CoreState,
        backend: &mut dyn OnlineBackend,
        controller_slot: u32,
        success: bool,
        list_name: &str,
        error: String,
    ) -> Outcome {
        if !success {
            warn!("Reading friends list {} failed: {}", list_name, error);
            return Outcome::accepted(false).with_app_event(AppEvent::FriendsListRead {
                success: false,
                friend_count: 0,
                error: Some(error),
            });
        }

        let friends = backend.friends_list(controller_slot, list_name);
        let mut outcome = Outcome::accepted(true).with_app_event(AppEvent::FriendsListRead {
            success: true,
            friend_count: friends.len(),
            error: None,
        });

        if friends.is_empty() {
            info!("Friends list {} is empty", list_name);
            return outcome;
        }

        let Some(session) = state.session_name.clone() else {
            warn!("Friends list read with no hosted session to invite to");
            return outcome;
        };

        let pass = state
            .invites
            .invite_selected(backend, controller_slot, &session, &friends);
        state.stats.invites_sent += pass.invited.len() as u64;

        for friend in pass.invited {
            outcome.app_events.push(AppEvent::FriendInvited {
                friend: friend.user_id,
                display_name: friend.display_name,
            });
        }
        for friend in pass.refused {
            outcome.app_events.push(AppEvent::RequestFailed {
                operation: "send invite".to_string(),
                reason: format!("Backend refused invite for {}", friend.display_name),
            });
        }
        outcome
    }

    fn invite_accepted(
        state: &mut CoreState,
        backend: &mut dyn OnlineBackend,
        success: bool,
        search_result: Option<SearchResult>,
    ) -> Outcome {
        let mut outcome = Outcome::accepted(success).with_app_event(AppEvent::InviteAccepted {
            success,
            session_id: search_result.as_ref().map(|r| r.session_id.clone()),
        });

        if !success {
            return outcome;
        }
        let Some(result) = search_result.filter(SearchResult::is_valid) else {
            warn!("Accepted invite carried no valid session");
            return outcome;
        };

        let user_id: UniqueNetId = match state.valid_local_player() {
            Ok(player) => player.user_id.clone(),
            Err(e) => {
                outcome.absorb(Outcome::failed("join session", &e.into()));
                return outcome;
            }
        };

        match CommandHandlers::join_search_result(state, backend, &user_id, &result) {
            Ok(joined) => outcome.absorb(joined),
            Err(e) => outcome.absorb(Outcome::failed("join session", &e)),
        }
        outcome
    }

    fn invite_received(inviter: UniqueNetId, search_result: SearchResult) -> Outcome {
        info!("Invite from {} to {}", inviter, search_result.session_id);
        Outcome::accepted(true).with_app_event(AppEvent::InviteReceived {
            inviter,
            session_id: search_result.session_id,
        })
    }
}
