//! Channel Utilities
//!
//! Channel type aliases, constructors sized from [`ChannelConfig`], and the
//! non-blocking send helpers used by backends and the logic task.

use std::fmt;

use crate::channel::communication::{AppEvent, CommandRequest, Completion, Effect};
use crate::config::ChannelConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelError {
    ChannelFull,
    ChannelClosed,
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelError::ChannelFull => write!(f, "Channel buffer is full"),
            ChannelError::ChannelClosed => write!(f, "Channel is closed"),
        }
    }
}

impl std::error::Error for ChannelError {}

pub type CommandSender = tokio::sync::mpsc::Sender<CommandRequest>;
pub type CommandReceiver = tokio::sync::mpsc::Receiver<CommandRequest>;
pub type CompletionSender = tokio::sync::mpsc::Sender<Completion>;
pub type CompletionReceiver = tokio::sync::mpsc::Receiver<Completion>;
pub type EffectSender = tokio::sync::broadcast::Sender<Effect>;
pub type EffectReceiver = tokio::sync::broadcast::Receiver<Effect>;
pub type AppEventSender = tokio::sync::mpsc::Sender<AppEvent>;
pub type AppEventReceiver = tokio::sync::mpsc::Receiver<AppEvent>;

// ----------------------------------------------------------------------------
// Channel Creation Utilities
// ----------------------------------------------------------------------------

/// Create bounded command channel (UI → Session Logic)
pub fn create_command_channel(config: &ChannelConfig) -> (CommandSender, CommandReceiver) {
    tokio::sync::mpsc::channel(config.command_buffer_size)
}

/// Create bounded completion channel (Backend → Session Logic)
pub fn create_completion_channel(
    config: &ChannelConfig,
) -> (CompletionSender, CompletionReceiver) {
    tokio::sync::mpsc::channel(config.completion_buffer_size)
}

/// Create broadcast effect channel (Session Logic → presentation/transport)
///
/// Consumers obtain their receivers with `sender.subscribe()`.
pub fn create_effect_channel(config: &ChannelConfig) -> (EffectSender, EffectReceiver) {
    tokio::sync::broadcast::channel(config.effect_buffer_size)
}

/// Create bounded app event channel (Session Logic → UI)
pub fn create_app_event_channel(config: &ChannelConfig) -> (AppEventSender, AppEventReceiver) {
    tokio::sync::mpsc::channel(config.app_event_buffer_size)
}

// ----------------------------------------------------------------------------
// Non-blocking Send Utilities
// ----------------------------------------------------------------------------

/// Non-blocking send so the logic task never stalls on a slow consumer
pub trait NonBlockingSend<T> {
    fn try_send_non_blocking(&self, message: T) -> Result<(), ChannelError>;
}

impl<T> NonBlockingSend<T> for tokio::sync::mpsc::Sender<T> {
    fn try_send_non_blocking(&self, message: T) -> Result<(), ChannelError> {
        self.try_send(message).map_err(|e| match e {
            tokio::sync::mpsc::error::TrySendError::Full(_) => ChannelError::ChannelFull,
            tokio::sync::mpsc::error::TrySendError::Closed(_) => ChannelError::ChannelClosed,
        })
    }
}
