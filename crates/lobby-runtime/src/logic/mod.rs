//! Session Logic Module
//!
//! The session state machine, split into focused components:
//! - `state`: controller state, statistics and handler outcomes
//! - `handlers`: command handlers (host, find, join, destroy, invite)
//! - `completions`: backend completion handlers and the chained transitions
//! - `task`: the SessionLogicTask loop
//!
//! ## Ownership
//!
//! A single `SessionLogicTask` owns the session state, the backend adapter
//! and every subscription. Commands and completions are processed one at a
//! time, so a completion can never observe a half-applied command. Backend
//! adapters never call back into the task directly; they push completions
//! onto a channel, which also means a completion fired synchronously from
//! inside a request is only processed after that request returns.

pub mod completions;
pub mod handlers;
pub mod state;
pub mod task;

pub use completions::CompletionHandlers;
pub use handlers::CommandHandlers;
pub use state::{CoreState, CoreStats, Outcome};
pub use task::SessionLogicTask;
