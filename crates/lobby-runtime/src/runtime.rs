//! Lobby Runtime Handle
//!
//! The caller-facing side of a running session logic task. Every operation
//! becomes a [`Command`] on the command channel; operations that report a
//! synchronous verdict wait for the task's accept/reject reply.
//!
//! ```rust,no_run
//! use lobby_core::{LocalPlayer, UniqueNetId};
//! use lobby_runtime::RuntimeBuilder;
//! # use lobby_core::OnlineBackend;
//!
//! # async fn host(backend: impl OnlineBackend + 'static) -> lobby_core::LobbyResult<()> {
//! let mut runtime = RuntimeBuilder::new()
//!     .with_local_player(LocalPlayer::new(UniqueNetId::new("player-1"), 0))
//!     .with_backend(backend)
//!     .build_and_start()
//!     .await?;
//!
//! let mut events = runtime.take_app_event_receiver().expect("first take");
//! if runtime.host_session("GameSession", true, true, 4).await? {
//!     while let Some(event) = events.recv().await {
//!         println!("{:?}", event);
//!     }
//! }
//! runtime.shutdown().await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use lobby_core::{
    AppEventReceiver, Command, CommandRequest, CommandSender, EffectReceiver, EffectSender,
    LobbyError, LobbyResult, LocalPlayer, SessionName,
};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// How long shutdown waits for the logic task to finish
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Handle to a running session logic task
pub struct LobbyRuntime {
    command_sender: CommandSender,
    effect_sender: EffectSender,
    app_event_receiver: Option<AppEventReceiver>,
    task_handle: Option<JoinHandle<LobbyResult<()>>>,
    backend_name: Option<String>,
    running: bool,
}

impl LobbyRuntime {
    pub(crate) fn new(
        command_sender: CommandSender,
        effect_sender: EffectSender,
        app_event_receiver: AppEventReceiver,
        task_handle: JoinHandle<LobbyResult<()>>,
        backend_name: Option<String>,
    ) -> Self {
        Self {
            command_sender,
            effect_sender,
            app_event_receiver: Some(app_event_receiver),
            task_handle: Some(task_handle),
            backend_name,
            running: true,
        }
    }

    /// Name of the attached backend, if any
    pub fn backend_name(&self) -> Option<&str> {
        self.backend_name.as_deref()
    }

    /// Get a command sender for issuing raw commands
    pub fn command_sender(&self) -> CommandSender {
        self.command_sender.clone()
    }

    /// Take the app event receiver (can only be called once)
    pub fn take_app_event_receiver(&mut self) -> Option<AppEventReceiver> {
        self.app_event_receiver.take()
    }

    /// Subscribe to presentation effects; only effects emitted afterwards are seen
    pub fn subscribe_effects(&self) -> EffectReceiver {
        self.effect_sender.subscribe()
    }

    /// Send a command without waiting for its verdict
    pub async fn send_command(&self, command: Command) -> LobbyResult<()> {
        self.command_sender
            .send(CommandRequest::new(command))
            .await
            .map_err(|_| LobbyError::channel_error("Failed to send command to runtime"))
    }

    /// Send a command and wait for the task's accept/reject verdict
    pub async fn request(&self, command: Command) -> LobbyResult<bool> {
        let (request, reply) = CommandRequest::with_reply(command);
        self.command_sender
            .send(request)
            .await
            .map_err(|_| LobbyError::channel_error("Failed to send command to runtime"))?;
        reply
            .await
            .map_err(|_| LobbyError::channel_error("Session logic task dropped the reply"))
    }

    /// Create and then automatically start a hosted session
    pub async fn host_session(
        &self,
        session_name: impl Into<SessionName>,
        is_lan: bool,
        is_presence: bool,
        max_players: u32,
    ) -> LobbyResult<bool> {
        self.request(Command::HostSession {
            session_name: session_name.into(),
            is_lan,
            is_presence,
            max_players,
        })
        .await
    }

    /// Start a session search; results arrive as a `SearchCompleted` event
    pub async fn find_sessions(&self, is_lan: bool, is_presence: bool) -> LobbyResult<bool> {
        self.request(Command::FindSessions {
            is_lan,
            is_presence,
        })
        .await
    }

    /// Join the first session of the last search not owned by the local player
    pub async fn join_session(&self) -> LobbyResult<bool> {
        self.request(Command::JoinSession).await
    }

    /// Destroy the hosted session, or leave the joined one
    pub async fn destroy_session(&self) -> LobbyResult<()> {
        self.send_command(Command::DestroySession).await
    }

    pub async fn send_invite_to_friend(&self, friend_id: impl Into<String>) -> LobbyResult<bool> {
        self.request(Command::SendInviteToFriend {
            friend_id: friend_id.into(),
        })
        .await
    }

    /// Replace the local player; returns whether the new identity is valid
    pub async fn set_local_player(&self, player: Option<LocalPlayer>) -> LobbyResult<bool> {
        self.request(Command::SetLocalPlayer { player }).await
    }

    /// Ask for a `StatusReport` event
    pub async fn request_status(&self) -> LobbyResult<()> {
        self.send_command(Command::GetStatus).await
    }

    /// Check if the runtime is still running
    pub fn is_running(&self) -> bool {
        self.running
            && self
                .task_handle
                .as_ref()
                .is_some_and(|handle| !handle.is_finished())
    }

    /// Shutdown the runtime gracefully
    pub async fn shutdown(&mut self) -> LobbyResult<()> {
        if !self.running {
            return Ok(());
        }
        info!("Shutting down lobby runtime");

        let _ = self.send_command(Command::Shutdown).await;

        let result = match self.task_handle.take() {
            Some(handle) => match tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await {
                Ok(Ok(result)) => result,
                Ok(Err(e)) => Err(LobbyError::channel_error(format!(
                    "Session logic task panicked: {}",
                    e
                ))),
                Err(_) => {
                    warn!("Session logic task did not stop within {:?}", SHUTDOWN_TIMEOUT);
                    Ok(())
                }
            },
            None => Ok(()),
        };

        self.running = false;
        info!("Lobby runtime shut down");
        result
    }
}
