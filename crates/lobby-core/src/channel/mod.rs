//! Channel Module
//!
//! This module contains the channel infrastructure around the session logic task:
//! - `communication`: commands, completions, effects and app events
//! - `utils`: channel aliases, constructors and non-blocking send helpers

pub mod communication;
pub mod utils;

pub use communication::{AppEvent, Command, CommandRequest, Completion, Effect, SearchSummary};

pub use crate::config::ChannelConfig;

pub use utils::{
    create_app_event_channel, create_command_channel, create_completion_channel,
    create_effect_channel, AppEventReceiver, AppEventSender, ChannelError, CommandReceiver,
    CommandSender, CompletionReceiver, CompletionSender, EffectReceiver, EffectSender,
    NonBlockingSend,
};
