//! Lobby Core
//!
//! Foundational types for online session orchestration: identities, session
//! settings and search state, the [`OnlineBackend`] capability trait, the
//! channel message schema and configuration. The state machine that drives
//! these lives in `lobby-runtime`.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod backend;
pub mod channel;
pub mod config;
pub mod errors;
pub mod session;
pub mod types;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use backend::{OnlineBackend, SubscriptionKind, SubscriptionToken};
pub use channel::{
    AppEvent, AppEventReceiver, AppEventSender, Command, CommandReceiver, CommandRequest,
    CommandSender, Completion, CompletionReceiver, CompletionSender, Effect, EffectReceiver,
    EffectSender, SearchSummary,
};
pub use config::{ChannelConfig, LobbyConfig, SessionPolicy};
pub use errors::{LobbyError, LobbyResult, RequestError, SubscriptionError};
pub use session::{JoinResult, SearchResult, SessionPhase, SessionSearch, SessionSettings};
pub use types::{FriendRecord, LocalPlayer, SessionName, UniqueNetId};
