//! Runtime Builder API
//!
//! Provides a builder-style API for consumers (CLI, tests) to attach an
//! online backend and local player and get a running [`LobbyRuntime`].

use lobby_core::{
    channel::{
        create_app_event_channel, create_command_channel, create_completion_channel,
        create_effect_channel,
    },
    LobbyConfig, LobbyResult, LocalPlayer, OnlineBackend,
};
use tracing::{info, warn};

use crate::logic::{CoreState, SessionLogicTask};
use crate::managers::{InviteCoordinator, InviteFilter};
use crate::runtime::LobbyRuntime;

// ----------------------------------------------------------------------------
// Runtime Builder
// ----------------------------------------------------------------------------

/// Builder for a lobby runtime
pub struct RuntimeBuilder {
    config: LobbyConfig,
    local_player: Option<LocalPlayer>,
    backend: Option<Box<dyn OnlineBackend>>,
    invite_filter: Option<Box<dyn InviteFilter>>,
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config: LobbyConfig::default(),
            local_player: None,
            backend: None,
            invite_filter: None,
        }
    }

    pub fn with_config(mut self, config: LobbyConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_local_player(mut self, player: LocalPlayer) -> Self {
        self.local_player = Some(player);
        self
    }

    pub fn with_backend(mut self, backend: impl OnlineBackend + 'static) -> Self {
        self.backend = Some(Box::new(backend));
        self
    }

    pub fn with_boxed_backend(mut self, backend: Box<dyn OnlineBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Replace the marker-based auto-invite filter
    pub fn with_invite_filter(mut self, filter: impl InviteFilter + 'static) -> Self {
        self.invite_filter = Some(Box::new(filter));
        self
    }

    /// Build the session logic task and its runtime handle without spawning
    pub fn build(self) -> LobbyResult<(SessionLogicTask, BuiltChannels)> {
        self.config.validate()?;

        let channels = &self.config.channels;
        let (command_sender, command_receiver) = create_command_channel(channels);
        let (completion_sender, completion_receiver) = create_completion_channel(channels);
        let (effect_sender, _effect_receiver) = create_effect_channel(channels);
        let (app_event_sender, app_event_receiver) = create_app_event_channel(channels);

        let mut backend = self.backend;
        let backend_name = match backend.as_mut() {
            Some(backend) => {
                backend.attach_completions(completion_sender)?;
                Some(backend.name().to_string())
            }
            None => {
                warn!("Building lobby runtime without an online backend");
                None
            }
        };

        let mut state = CoreState::new(self.local_player, self.config.session.clone());
        if let Some(filter) = self.invite_filter {
            state.invites = InviteCoordinator::new(filter);
        }

        let task = SessionLogicTask::new(
            state,
            backend,
            command_receiver,
            completion_receiver,
            effect_sender.clone(),
            app_event_sender,
        );

        Ok((
            task,
            BuiltChannels {
                command_sender,
                effect_sender,
                app_event_receiver,
                backend_name,
            },
        ))
    }

    /// Build and start the runtime
    pub async fn build_and_start(self) -> LobbyResult<LobbyRuntime> {
        info!("Building lobby runtime");
        let (mut task, channels) = self.build()?;
        let handle = tokio::spawn(async move { task.run().await });

        info!("Lobby runtime started");
        Ok(LobbyRuntime::new(
            channels.command_sender,
            channels.effect_sender,
            channels.app_event_receiver,
            handle,
            channels.backend_name,
        ))
    }
}

/// Caller-side channel ends produced by [`RuntimeBuilder::build`]
pub struct BuiltChannels {
    pub command_sender: lobby_core::CommandSender,
    pub effect_sender: lobby_core::EffectSender,
    pub app_event_receiver: lobby_core::AppEventReceiver,
    pub backend_name: Option<String>,
}

// ----------------------------------------------------------------------------
// Convenience Functions
// ----------------------------------------------------------------------------

/// Create a runtime with testing channel sizes
pub async fn create_test_runtime(
    local_player: LocalPlayer,
    backend: impl OnlineBackend + 'static,
) -> LobbyResult<LobbyRuntime> {
    RuntimeBuilder::new()
        .with_config(LobbyConfig::testing())
        .with_local_player(local_player)
        .with_backend(backend)
        .build_and_start()
        .await
}
