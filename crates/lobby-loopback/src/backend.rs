//! Loopback backend
//!
//! [`OnlineBackend`] adapter acting for one user of a [`LoopbackNetwork`].
//! Requests are served immediately; their completions are pushed onto the
//! attached channel only while the user holds a live subscription for the
//! completion's kind.

use lobby_core::{
    Completion, CompletionSender, FriendRecord, JoinResult, LobbyError, LobbyResult,
    OnlineBackend, SearchResult, SessionName, SessionSearch, SessionSettings, SubscriptionKind,
    SubscriptionToken, UniqueNetId,
};
use tracing::{debug, info, warn};

use crate::network::{HostedSession, LocalSession, LoopbackNetwork, PendingInvite};

/// Backend acting for one loopback user
#[derive(Debug)]
pub struct LoopbackBackend {
    network: LoopbackNetwork,
    user: UniqueNetId,
    next_token: u64,
}

impl LoopbackBackend {
    pub(crate) fn new(network: LoopbackNetwork, user: UniqueNetId) -> Self {
        Self {
            network,
            user,
            next_token: 0,
        }
    }

    pub fn user(&self) -> &UniqueNetId {
        &self.user
    }

    fn deliver(&self, completion: Completion) -> bool {
        self.network.lock().deliver(&self.user, completion)
    }
}

impl OnlineBackend for LoopbackBackend {
    fn name(&self) -> &str {
        "loopback"
    }

    fn attach_completions(&mut self, sender: CompletionSender) -> LobbyResult<()> {
        let mut state = self.network.lock();
        let entry = state.users.get_mut(&self.user).ok_or_else(|| {
            LobbyError::config_error(format!("Unknown loopback user {}", self.user))
        })?;
        entry.sender = Some(sender);
        Ok(())
    }

    fn register(&mut self, kind: SubscriptionKind) -> SubscriptionToken {
        self.next_token += 1;
        let token = SubscriptionToken::new(self.next_token);
        if let Some(entry) = self.network.lock().users.get_mut(&self.user) {
            entry.live.insert(kind, token);
        }
        token
    }

    fn release(&mut self, kind: SubscriptionKind, token: SubscriptionToken) {
        if let Some(entry) = self.network.lock().users.get_mut(&self.user) {
            if entry.live.get(&kind) == Some(&token) {
                entry.live.remove(&kind);
            } else {
                warn!("Release of stale {} token {}", kind, token);
            }
        }
    }

    fn create_session(
        &mut self,
        user_id: &UniqueNetId,
        session_name: &SessionName,
        settings: &SessionSettings,
    ) -> bool {
        {
            let mut state = self.network.lock();
            let Some(entry) = state.users.get_mut(user_id) else {
                return false;
            };
            if entry.sessions.contains_key(session_name) {
                debug!("{} already has a session named {}", user_id, session_name);
                return false;
            }
            let session_id = uuid::Uuid::new_v4().to_string();
            entry.sessions.insert(
                session_name.clone(),
                LocalSession {
                    session_id: session_id.clone(),
                    hosted: true,
                },
            );
            state.sessions.insert(
                session_id.clone(),
                HostedSession {
                    session_id,
                    owner: user_id.clone(),
                    settings: settings.clone(),
                    started: false,
                    members: Vec::new(),
                },
            );
        }

        info!("Loopback session {} created for {}", session_name, user_id);
        self.deliver(Completion::CreateSession {
            session_name: session_name.clone(),
            success: true,
        });
        true
    }

    fn start_session(&mut self, session_name: &SessionName) -> bool {
        {
            let mut state = self.network.lock();
            let session_id = match state
                .users
                .get(&self.user)
                .and_then(|entry| entry.sessions.get(session_name))
            {
                Some(local) if local.hosted => local.session_id.clone(),
                _ => return false,
            };
            match state.sessions.get_mut(&session_id) {
                Some(session) => session.started = true,
                None => return false,
            }
        }

        self.deliver(Completion::StartSession {
            session_name: session_name.clone(),
            success: true,
        });
        true
    }

    fn find_sessions(&mut self, user_id: &UniqueNetId, search: &SessionSearch) -> bool {
        let results: Vec<SearchResult> = {
            let state = self.network.lock();
            let mut sessions: Vec<&HostedSession> = state
                .sessions
                .values()
                .filter(|session| {
                    session.started
                        && session.settings.should_advertise
                        && session.open_connections() > 0
                        && search.matches(&session.settings)
                })
                .collect();
            sessions.sort_by(|a, b| a.session_id.cmp(&b.session_id));
            sessions
                .into_iter()
                .take(search.max_search_results)
                .map(|session| state.search_result(session))
                .collect()
        };

        debug!("{} found {} loopback sessions", user_id, results.len());
        self.deliver(Completion::FindSessions {
            success: true,
            results,
        });
        true
    }

    fn join_session(
        &mut self,
        user_id: &UniqueNetId,
        session_name: &SessionName,
        result: &SearchResult,
    ) -> bool {
        let outcome = {
            let mut guard = self.network.lock();
            let state = &mut *guard;
            let already = state
                .users
                .get(user_id)
                .is_some_and(|entry| entry.sessions.contains_key(session_name));

            if already {
                JoinResult::AlreadyInSession
            } else {
                match state.sessions.get_mut(&result.session_id) {
                    None => JoinResult::SessionDoesNotExist,
                    Some(session) if session.open_connections() == 0 => JoinResult::SessionIsFull,
                    Some(session) => {
                        session.members.push(user_id.clone());
                        if let Some(entry) = state.users.get_mut(user_id) {
                            entry.sessions.insert(
                                session_name.clone(),
                                LocalSession {
                                    session_id: result.session_id.clone(),
                                    hosted: false,
                                },
                            );
                        }
                        JoinResult::Success
                    }
                }
            }
        };

        info!("{} joining {}: {}", user_id, result.session_id, outcome);
        self.deliver(Completion::JoinSession {
            session_name: session_name.clone(),
            result: outcome,
        });
        true
    }

    fn destroy_session(&mut self, session_name: &SessionName) -> bool {
        {
            let mut state = self.network.lock();
            let Some(local) = state
                .users
                .get_mut(&self.user)
                .and_then(|entry| entry.sessions.remove(session_name))
            else {
                return false;
            };

            if local.hosted {
                state.sessions.remove(&local.session_id);
            } else if let Some(session) = state.sessions.get_mut(&local.session_id) {
                session.members.retain(|member| member != &self.user);
            }
        }

        self.deliver(Completion::DestroySession {
            session_name: session_name.clone(),
            success: true,
        });
        true
    }

    fn send_session_invite(
        &mut self,
        _controller_slot: u32,
        session_name: &SessionName,
        friend: &UniqueNetId,
    ) -> bool {
        let mut state = self.network.lock();
        let session = state
            .users
            .get(&self.user)
            .and_then(|entry| entry.sessions.get(session_name))
            .and_then(|local| state.sessions.get(&local.session_id))
            .map(|session| state.search_result(session));
        let Some(session) = session else {
            return false;
        };
        let Some(entry) = state.users.get_mut(friend) else {
            return false;
        };

        entry.invites.push(PendingInvite {
            inviter: self.user.clone(),
            session: session.clone(),
        });
        info!("{} invited {} to {}", self.user, friend, session.session_id);
        state.deliver(
            friend,
            Completion::InviteReceived {
                invited: friend.clone(),
                inviter: self.user.clone(),
                app_id: "loopback".to_string(),
                search_result: session,
            },
        );
        true
    }

    fn read_friends_list(&mut self, controller_slot: u32, list_name: &str) -> bool {
        self.deliver(Completion::ReadFriendsList {
            controller_slot,
            success: true,
            list_name: list_name.to_string(),
            error: String::new(),
        });
        true
    }

    fn friends_list(&self, _controller_slot: u32, _list_name: &str) -> Vec<FriendRecord> {
        self.network.friends_of(&self.user)
    }

    fn resolved_connect_string(&self, session_name: &SessionName) -> Option<String> {
        let state = self.network.lock();
        let local = state.users.get(&self.user)?.sessions.get(session_name)?;
        let session = state.sessions.get(&local.session_id)?;
        Some(format!("loopback://{}/{}", session.owner, session.session_id))
    }
}
