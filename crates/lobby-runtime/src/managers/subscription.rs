//! Subscription manager
//!
//! Tracks the single live backend registration per completion kind. A kind
//! can only be registered again after its previous registration has been
//! released, which is what keeps at most one request per kind in flight.

use std::collections::BTreeMap;

use lobby_core::{
    LobbyResult, OnlineBackend, SubscriptionError, SubscriptionKind, SubscriptionToken,
};
use tracing::{debug, trace};

/// A live registration owned by the manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    pub kind: SubscriptionKind,
    pub token: SubscriptionToken,
}

/// Counters for subscription traffic
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionStats {
    pub registered: u64,
    pub released: u64,
    pub refused: u64,
}

/// Owns every live subscription, at most one per kind
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    live: BTreeMap<SubscriptionKind, Subscription>,
    stats: SubscriptionStats,
}

impl SubscriptionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `kind` with the backend
    ///
    /// Refuses without touching the backend if `kind` is still live.
    pub fn register(
        &mut self,
        backend: &mut dyn OnlineBackend,
        kind: SubscriptionKind,
    ) -> LobbyResult<SubscriptionToken> {
        if let Some(existing) = self.live.get(&kind) {
            self.stats.refused += 1;
            return Err(SubscriptionError::AlreadyRegistered {
                kind,
                token: existing.token,
            }
            .into());
        }

        let token = backend.register(kind);
        trace!("Registered {} subscription {}", kind, token);
        self.live.insert(kind, Subscription { kind, token });
        self.stats.registered += 1;
        Ok(token)
    }

    /// Register `kind` unless it is already live; used for listener kinds
    pub fn ensure(
        &mut self,
        backend: &mut dyn OnlineBackend,
        kind: SubscriptionKind,
    ) -> SubscriptionToken {
        match self.live.get(&kind) {
            Some(existing) => existing.token,
            None => {
                let token = backend.register(kind);
                self.live.insert(kind, Subscription { kind, token });
                self.stats.registered += 1;
                token
            }
        }
    }

    /// Release the live registration for `kind`, if any
    ///
    /// Returns the released subscription so the caller can tell a genuine
    /// completion from a stale one.
    pub fn release(
        &mut self,
        backend: &mut dyn OnlineBackend,
        kind: SubscriptionKind,
    ) -> Option<Subscription> {
        let subscription = self.live.remove(&kind)?;
        backend.release(kind, subscription.token);
        trace!("Released {} subscription {}", kind, subscription.token);
        self.stats.released += 1;
        Some(subscription)
    }

    /// Release every live registration, listeners included
    pub fn release_all(&mut self, backend: &mut dyn OnlineBackend) {
        let kinds: Vec<SubscriptionKind> = self.live.keys().copied().collect();
        for kind in kinds {
            self.release(backend, kind);
        }
        debug!("Released all subscriptions");
    }

    pub fn is_registered(&self, kind: SubscriptionKind) -> bool {
        self.live.contains_key(&kind)
    }

    /// One-shot kinds with a request in flight
    pub fn outstanding(&self) -> Vec<SubscriptionKind> {
        self.live
            .keys()
            .copied()
            .filter(|kind| kind.is_one_shot())
            .collect()
    }

    pub fn stats(&self) -> &SubscriptionStats {
        &self.stats
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
