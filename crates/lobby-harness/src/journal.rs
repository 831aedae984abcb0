//! Call journal
//!
//! Every call a mock backend receives is appended here so tests can assert
//! on request counts and subscription discipline after the fact.

use std::sync::{Arc, Mutex, PoisonError};

use lobby_core::{
    SessionName, SessionSearch, SessionSettings, SubscriptionKind, SubscriptionToken, UniqueNetId,
};

/// One call made against the mock backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Register {
        kind: SubscriptionKind,
        token: SubscriptionToken,
    },
    Release {
        kind: SubscriptionKind,
        token: SubscriptionToken,
    },
    CreateSession {
        user_id: UniqueNetId,
        session_name: SessionName,
        settings: SessionSettings,
    },
    StartSession {
        session_name: SessionName,
    },
    FindSessions {
        user_id: UniqueNetId,
        search: SessionSearch,
    },
    JoinSession {
        user_id: UniqueNetId,
        session_name: SessionName,
        session_id: String,
    },
    DestroySession {
        session_name: SessionName,
    },
    SendInvite {
        controller_slot: u32,
        session_name: SessionName,
        friend: UniqueNetId,
    },
    ReadFriendsList {
        controller_slot: u32,
        list_name: String,
    },
}

impl BackendCall {
    /// Whether this call is a session request rather than bookkeeping
    pub fn is_request(&self) -> bool {
        !matches!(
            self,
            BackendCall::Register { .. } | BackendCall::Release { .. }
        )
    }
}

/// Shared, append-only record of backend calls
#[derive(Debug, Clone, Default)]
pub struct CallJournal {
    calls: Arc<Mutex<Vec<BackendCall>>>,
}

impl CallJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, call: BackendCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    /// Snapshot of every call so far
    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self, predicate: impl Fn(&BackendCall) -> bool) -> usize {
        self.calls().iter().filter(|&call| predicate(call)).count()
    }

    /// Number of session requests, ignoring registrations and releases
    pub fn request_count(&self) -> usize {
        self.count(BackendCall::is_request)
    }

    pub fn registrations(&self, kind: SubscriptionKind) -> usize {
        self.count(|call| matches!(call, BackendCall::Register { kind: k, .. } if *k == kind))
    }

    pub fn releases(&self, kind: SubscriptionKind) -> usize {
        self.count(|call| matches!(call, BackendCall::Release { kind: k, .. } if *k == kind))
    }

    /// Registrations of `kind` not yet released
    pub fn live(&self, kind: SubscriptionKind) -> usize {
        self.registrations(kind).saturating_sub(self.releases(kind))
    }

    /// Highest number of simultaneously live registrations of `kind`
    pub fn max_live(&self, kind: SubscriptionKind) -> usize {
        let mut live = 0usize;
        let mut max = 0usize;
        for call in self.calls() {
            match call {
                BackendCall::Register { kind: k, .. } if k == kind => {
                    live += 1;
                    max = max.max(live);
                }
                BackendCall::Release { kind: k, .. } if k == kind => {
                    live = live.saturating_sub(1);
                }
                _ => {}
            }
        }
        max
    }

    /// Whether every release matches a token that was registered and still live
    pub fn releases_are_paired(&self) -> bool {
        let mut live: Vec<(SubscriptionKind, SubscriptionToken)> = Vec::new();
        for call in self.calls() {
            match call {
                BackendCall::Register { kind, token } => live.push((kind, token)),
                BackendCall::Release { kind, token } => {
                    match live.iter().position(|entry| *entry == (kind, token)) {
                        Some(index) => {
                            live.remove(index);
                        }
                        None => return false,
                    }
                }
                _ => {}
            }
        }
        true
    }
}
