//! Lobby Runtime Engine
//!
//! This crate contains the session orchestration engine:
//! - `SessionLogicTask`: the state machine driving host, find, join,
//!   destroy and invite flows
//! - `SubscriptionManager` and `InviteCoordinator`: the managers it owns
//! - `RuntimeBuilder` and `LobbyRuntime`: setup and the caller-facing handle
//!
//! `lobby-core` provides the stable types and the backend trait; this crate
//! decides what happens when completions arrive.

pub mod builder;
pub mod logic;
pub mod managers;
mod runtime;

pub use builder::{create_test_runtime, BuiltChannels, RuntimeBuilder};
pub use logic::{CommandHandlers, CompletionHandlers, CoreState, CoreStats, Outcome, SessionLogicTask};
pub use managers::*;
pub use runtime::LobbyRuntime;

// Re-export core types for convenience
pub use lobby_core::{
    AppEvent, AppEventReceiver, Command, CommandSender, Effect, EffectReceiver, LobbyConfig,
    LobbyError, LobbyResult, LocalPlayer, OnlineBackend, SessionName, SessionPhase,
    SubscriptionKind, UniqueNetId,
};
