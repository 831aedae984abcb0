//! Mock Online Backend for Testing
//!
//! A deterministic [`OnlineBackend`] whose accept/reject verdicts and
//! completion outcomes are scripted through [`MockBackendConfig`]. Every call
//! lands in a shared [`CallJournal`].
//!
//! With `auto_complete` set, an accepted request immediately pushes its
//! completion onto the attached channel, but only while the matching kind is
//! registered, the way a platform only calls live delegates.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use lobby_core::{
    channel::{ChannelError, NonBlockingSend},
    Completion, CompletionSender, FriendRecord, JoinResult, LobbyResult, OnlineBackend,
    SearchResult, SessionName, SessionSearch, SessionSettings, SubscriptionKind,
    SubscriptionToken, UniqueNetId,
};
use tracing::{debug, warn};

use crate::journal::{BackendCall, CallJournal};

// ----------------------------------------------------------------------------
// Mock Backend Configuration
// ----------------------------------------------------------------------------

/// Scripted behaviour of the mock backend
#[derive(Debug, Clone)]
pub struct MockBackendConfig {
    /// Synchronous verdict for each request kind
    pub accept_create: bool,
    pub accept_start: bool,
    pub accept_find: bool,
    pub accept_join: bool,
    pub accept_destroy: bool,
    pub accept_invite: bool,
    pub accept_read_friends: bool,
    /// Push completions as soon as a request is accepted
    pub auto_complete: bool,
    /// Outcomes reported by auto completions
    pub create_succeeds: bool,
    pub start_succeeds: bool,
    pub find_succeeds: bool,
    pub destroy_succeeds: bool,
    pub read_friends_succeeds: bool,
    pub join_result: JoinResult,
    /// Sessions visible to searches
    pub search_results: Vec<SearchResult>,
    pub friends: Vec<FriendRecord>,
    /// Connect string resolved for joined sessions
    pub connect_string: Option<String>,
}

impl Default for MockBackendConfig {
    fn default() -> Self {
        Self {
            accept_create: true,
            accept_start: true,
            accept_find: true,
            accept_join: true,
            accept_destroy: true,
            accept_invite: true,
            accept_read_friends: true,
            auto_complete: false,
            create_succeeds: true,
            start_succeeds: true,
            find_succeeds: true,
            destroy_succeeds: true,
            read_friends_succeeds: true,
            join_result: JoinResult::Success,
            search_results: Vec::new(),
            friends: Vec::new(),
            connect_string: Some("127.0.0.1:7777".to_string()),
        }
    }
}

impl MockBackendConfig {
    /// Accept everything and complete immediately with success
    pub fn auto() -> Self {
        Self {
            auto_complete: true,
            ..Self::default()
        }
    }

    /// Reject every request synchronously
    pub fn rejecting() -> Self {
        Self {
            accept_create: false,
            accept_start: false,
            accept_find: false,
            accept_join: false,
            accept_destroy: false,
            accept_invite: false,
            accept_read_friends: false,
            ..Self::default()
        }
    }

    pub fn with_search_results(mut self, results: Vec<SearchResult>) -> Self {
        self.search_results = results;
        self
    }

    pub fn with_friends(mut self, friends: Vec<FriendRecord>) -> Self {
        self.friends = friends;
        self
    }
}

// ----------------------------------------------------------------------------
// Mock Backend Implementation
// ----------------------------------------------------------------------------

#[derive(Debug, Default)]
struct SharedState {
    sender: Option<CompletionSender>,
    live: HashMap<SubscriptionKind, SubscriptionToken>,
}

/// Mock backend for deterministic testing
#[derive(Debug)]
pub struct MockBackend {
    config: MockBackendConfig,
    journal: CallJournal,
    shared: Arc<Mutex<SharedState>>,
    next_token: u64,
}

/// Test-side handle that outlives the backend being moved into a runtime
#[derive(Debug, Clone)]
pub struct MockHandle {
    journal: CallJournal,
    shared: Arc<Mutex<SharedState>>,
}

impl MockBackend {
    pub fn new(config: MockBackendConfig) -> Self {
        Self {
            config,
            journal: CallJournal::new(),
            shared: Arc::new(Mutex::new(SharedState::default())),
            next_token: 0,
        }
    }

    pub fn config_mut(&mut self) -> &mut MockBackendConfig {
        &mut self.config
    }

    pub fn journal(&self) -> &CallJournal {
        &self.journal
    }

    pub fn handle(&self) -> MockHandle {
        MockHandle {
            journal: self.journal.clone(),
            shared: Arc::clone(&self.shared),
        }
    }

    /// Whether `kind` currently has a live registration
    pub fn is_registered(&self, kind: SubscriptionKind) -> bool {
        self.lock().live.contains_key(&kind)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SharedState> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Push `completion` if auto completion is on and its kind is live
    fn complete(&self, completion: Completion) {
        if !self.config.auto_complete {
            return;
        }
        deliver(&self.shared, completion);
    }
}

/// Send a completion through the attached channel if its kind is registered
fn deliver(shared: &Arc<Mutex<SharedState>>, completion: Completion) -> bool {
    let shared = shared.lock().unwrap_or_else(PoisonError::into_inner);
    let kind = completion.kind();
    if !shared.live.contains_key(&kind) {
        debug!("No live {} registration, completion not delivered", kind);
        return false;
    }
    let Some(sender) = shared.sender.as_ref() else {
        warn!("Completion channel not attached");
        return false;
    };
    match sender.try_send_non_blocking(completion) {
        Ok(()) => true,
        Err(ChannelError::ChannelFull) => {
            warn!("Completion channel full, {} completion dropped", kind);
            false
        }
        Err(ChannelError::ChannelClosed) => false,
    }
}

impl MockHandle {
    pub fn journal(&self) -> &CallJournal {
        &self.journal
    }

    /// Deliver a completion as the platform would; false if nobody listens
    pub fn push_completion(&self, completion: Completion) -> bool {
        deliver(&self.shared, completion)
    }

    /// Deliver a completion even without a live registration
    pub fn force_completion(&self, completion: Completion) -> bool {
        let shared = self.shared.lock().unwrap_or_else(PoisonError::into_inner);
        shared
            .sender
            .as_ref()
            .is_some_and(|sender| sender.try_send_non_blocking(completion).is_ok())
    }

    pub fn is_registered(&self, kind: SubscriptionKind) -> bool {
        self.shared
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .live
            .contains_key(&kind)
    }
}

impl OnlineBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn attach_completions(&mut self, sender: CompletionSender) -> LobbyResult<()> {
        self.lock().sender = Some(sender);
        Ok(())
    }

    fn register(&mut self, kind: SubscriptionKind) -> SubscriptionToken {
        self.next_token += 1;
        let token = SubscriptionToken::new(self.next_token);
        self.lock().live.insert(kind, token);
        self.journal.record(BackendCall::Register { kind, token });
        token
    }

    fn release(&mut self, kind: SubscriptionKind, token: SubscriptionToken) {
        {
            let mut shared = self.lock();
            if shared.live.get(&kind) == Some(&token) {
                shared.live.remove(&kind);
            } else {
                warn!("Release of unknown {} token {}", kind, token);
            }
        }
        self.journal.record(BackendCall::Release { kind, token });
    }

    fn create_session(
        &mut self,
        user_id: &UniqueNetId,
        session_name: &SessionName,
        settings: &SessionSettings,
    ) -> bool {
        self.journal.record(BackendCall::CreateSession {
            user_id: user_id.clone(),
            session_name: session_name.clone(),
            settings: settings.clone(),
        });
        if !self.config.accept_create {
            return false;
        }
        self.complete(Completion::CreateSession {
            session_name: session_name.clone(),
            success: self.config.create_succeeds,
        });
        true
    }

    fn start_session(&mut self, session_name: &SessionName) -> bool {
        self.journal.record(BackendCall::StartSession {
            session_name: session_name.clone(),
        });
        if !self.config.accept_start {
            return false;
        }
        self.complete(Completion::StartSession {
            session_name: session_name.clone(),
            success: self.config.start_succeeds,
        });
        true
    }

    fn find_sessions(&mut self, user_id: &UniqueNetId, search: &SessionSearch) -> bool {
        self.journal.record(BackendCall::FindSessions {
            user_id: user_id.clone(),
            search: search.clone(),
        });
        if !self.config.accept_find {
            return false;
        }
        let results = if self.config.find_succeeds {
            self.config
                .search_results
                .iter()
                .filter(|result| search.matches(&result.settings))
                .cloned()
                .collect()
        } else {
            Vec::new()
        };
        self.complete(Completion::FindSessions {
            success: self.config.find_succeeds,
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
        self.journal.record(BackendCall::JoinSession {
            user_id: user_id.clone(),
            session_name: session_name.clone(),
            session_id: result.session_id.clone(),
        });
        if !self.config.accept_join {
            return false;
        }
        self.complete(Completion::JoinSession {
            session_name: session_name.clone(),
            result: self.config.join_result,
        });
        true
    }

    fn destroy_session(&mut self, session_name: &SessionName) -> bool {
        self.journal.record(BackendCall::DestroySession {
            session_name: session_name.clone(),
        });
        if !self.config.accept_destroy {
            return false;
        }
        self.complete(Completion::DestroySession {
            session_name: session_name.clone(),
            success: self.config.destroy_succeeds,
        });
        true
    }

    fn send_session_invite(
        &mut self,
        controller_slot: u32,
        session_name: &SessionName,
        friend: &UniqueNetId,
    ) -> bool {
        self.journal.record(BackendCall::SendInvite {
            controller_slot,
            session_name: session_name.clone(),
            friend: friend.clone(),
        });
        self.config.accept_invite
    }

    fn read_friends_list(&mut self, controller_slot: u32, list_name: &str) -> bool {
        self.journal.record(BackendCall::ReadFriendsList {
            controller_slot,
            list_name: list_name.to_string(),
        });
        if !self.config.accept_read_friends {
            return false;
        }
        let success = self.config.read_friends_succeeds;
        self.complete(Completion::ReadFriendsList {
            controller_slot,
            success,
            list_name: list_name.to_string(),
            error: if success {
                String::new()
            } else {
                "friends service unavailable".to_string()
            },
        });
        true
    }

    fn friends_list(&self, _controller_slot: u32, _list_name: &str) -> Vec<FriendRecord> {
        self.config.friends.clone()
    }

    fn resolved_connect_string(&self, _session_name: &SessionName) -> Option<String> {
        self.config.connect_string.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lobby_core::{channel::create_completion_channel, ChannelConfig};

    fn session() -> SessionName {
        SessionName::new("Game")
    }

    #[test]
    fn test_rejecting_config_refuses_requests() {
        let mut backend = MockBackend::new(MockBackendConfig::rejecting());
        assert!(!backend.start_session(&session()));
        assert!(!backend.destroy_session(&session()));
        assert_eq!(backend.journal().request_count(), 2);
    }

    #[tokio::test]
    async fn test_auto_completion_requires_live_registration() {
        let (sender, mut receiver) = create_completion_channel(&ChannelConfig::testing());
        let mut backend = MockBackend::new(MockBackendConfig::auto());
        backend.attach_completions(sender).unwrap();

        assert!(backend.start_session(&session()));
        assert!(receiver.try_recv().is_err());

        let token = backend.register(SubscriptionKind::StartSession);
        assert!(backend.start_session(&session()));
        assert_eq!(
            receiver.recv().await,
            Some(Completion::StartSession {
                session_name: session(),
                success: true,
            })
        );

        backend.release(SubscriptionKind::StartSession, token);
        assert!(!backend.is_registered(SubscriptionKind::StartSession));
        assert!(backend.journal().releases_are_paired());
    }

    #[tokio::test]
    async fn test_handle_pushes_listener_completions() {
        let (sender, mut receiver) = create_completion_channel(&ChannelConfig::testing());
        let mut backend = MockBackend::new(MockBackendConfig::default());
        backend.attach_completions(sender).unwrap();
        let handle = backend.handle();

        let accepted = Completion::InviteAccepted {
            success: false,
            controller_slot: 0,
            user_id: None,
            search_result: None,
        };
        assert!(!handle.push_completion(accepted.clone()));

        backend.register(SubscriptionKind::InviteAccepted);
        assert!(handle.push_completion(accepted.clone()));
        assert_eq!(receiver.recv().await, Some(accepted));
    }
}
