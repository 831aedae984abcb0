//! Session Logic Task Implementation
//!
//! Contains the SessionLogicTask struct and its coordination loop.

use lobby_core::{
    channel::{ChannelError, NonBlockingSend},
    AppEvent, AppEventSender, Command, CommandReceiver, CommandRequest, Completion,
    CompletionReceiver, Effect, EffectSender, LobbyResult, OnlineBackend, SubscriptionKind,
};
use tracing::{debug, error, info, trace, warn};

use super::completions::CompletionHandlers;
use super::handlers::CommandHandlers;
use super::state::{CoreState, CoreStats, Outcome};

/// Listener kinds registered when the task starts
///
/// `InviteAccepted` is not among them: it is registered once a hosted
/// session has started.
const LISTENERS: [SubscriptionKind; 1] = [SubscriptionKind::InviteReceived];

/// Borrow the backend as a trait object, if there is one
fn backend_mut(backend: &mut Option<Box<dyn OnlineBackend>>) -> Option<&mut dyn OnlineBackend> {
    match backend {
        Some(backend) => Some(&mut **backend),
        None => None,
    }
}

// ----------------------------------------------------------------------------
// Session Logic Task
// ----------------------------------------------------------------------------

/// The task that owns all session state and processes commands and completions
pub struct SessionLogicTask {
    state: CoreState,
    /// Online service adapter; `None` when no service is available
    backend: Option<Box<dyn OnlineBackend>>,
    command_receiver: CommandReceiver,
    completion_receiver: CompletionReceiver,
    effect_sender: EffectSender,
    app_event_sender: AppEventSender,
    running: bool,
}

impl SessionLogicTask {
    pub fn new(
        state: CoreState,
        backend: Option<Box<dyn OnlineBackend>>,
        command_receiver: CommandReceiver,
        completion_receiver: CompletionReceiver,
        effect_sender: EffectSender,
        app_event_sender: AppEventSender,
    ) -> Self {
        Self {
            state,
            backend,
            command_receiver,
            completion_receiver,
            effect_sender,
            app_event_sender,
            running: true,
        }
    }

    /// Run the session logic loop until shutdown or the command channel closes
    pub async fn run(&mut self) -> LobbyResult<()> {
        info!("Session logic task starting");
        self.register_listeners();

        let mut completions_open = true;
        while self.running {
            tokio::select! {
                // Completions for in-flight requests drain before new commands
                biased;

                completion = self.completion_receiver.recv(), if completions_open => {
                    match completion {
                        Some(completion) => self.process_completion(completion),
                        None => {
                            debug!("Completion channel closed");
                            completions_open = false;
                        }
                    }
                }

                request = self.command_receiver.recv() => {
                    match request {
                        Some(request) => {
                            if let Err(e) = self.process_request(request) {
                                error!("Unrecoverable error processing command, shutting down: {}", e);
                                self.running = false;
                                break;
                            }
                        }
                        None => {
                            info!("Command channel closed, shutting down");
                            break;
                        }
                    }
                }
            }
        }

        if let Some(backend) = backend_mut(&mut self.backend) {
            self.state.subscriptions.release_all(backend);
        }
        info!("Session logic task stopped");
        Ok(())
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn stats(&self) -> &CoreStats {
        &self.state.stats
    }

    pub fn state(&self) -> &CoreState {
        &self.state
    }

    fn register_listeners(&mut self) {
        let Some(backend) = backend_mut(&mut self.backend) else {
            warn!("No online backend available, session requests will be refused");
            return;
        };
        info!("Using online backend {}", backend.name());
        for kind in LISTENERS {
            self.state.subscriptions.ensure(backend, kind);
        }
    }

    /// Process one command, replying with its accept/reject verdict
    ///
    /// Only unrecoverable errors are returned; request failures become
    /// `RequestFailed` events.
    fn process_request(&mut self, request: CommandRequest) -> LobbyResult<()> {
        let CommandRequest { command, reply } = request;
        self.state.stats.commands_processed += 1;
        let operation = command.operation();
        trace!("Processing {} command", operation);

        let outcome = match self.process_command(command) {
            Ok(outcome) => outcome,
            Err(e) if e.is_unrecoverable() => return Err(e),
            Err(e) => {
                warn!("{} refused: {}", operation, e);
                self.state.stats.requests_failed += 1;
                Outcome::failed(operation, &e)
            }
        };

        if let Some(reply) = reply {
            // Caller may have stopped waiting
            let _ = reply.send(outcome.accepted);
        }
        self.emit(outcome);
        Ok(())
    }

    fn process_command(&mut self, command: Command) -> LobbyResult<Outcome> {
        let backend = backend_mut(&mut self.backend);
        match command {
            Command::HostSession {
                session_name,
                is_lan,
                is_presence,
                max_players,
            } => CommandHandlers::handle_host_session(
                &mut self.state,
                backend,
                session_name,
                is_lan,
                is_presence,
                max_players,
            ),
            Command::FindSessions {
                is_lan,
                is_presence,
            } => CommandHandlers::handle_find_sessions(&mut self.state, backend, is_lan, is_presence),
            Command::JoinSession => CommandHandlers::handle_join_session(&mut self.state, backend),
            Command::DestroySession => {
                CommandHandlers::handle_destroy_session(&mut self.state, backend)
            }
            Command::SendInviteToFriend { friend_id } => {
                CommandHandlers::handle_send_invite(&mut self.state, backend, &friend_id)
            }
            Command::SetLocalPlayer { player } => {
                CommandHandlers::handle_set_local_player(&mut self.state, player)
            }
            Command::GetStatus => Ok(self.status_report()),
            Command::Shutdown => {
                info!("Shutdown requested");
                self.running = false;
                Ok(Outcome::accepted(true))
            }
        }
    }

    fn process_completion(&mut self, completion: Completion) {
        let outcome = match backend_mut(&mut self.backend) {
            Some(backend) => CompletionHandlers::handle(&mut self.state, backend, completion),
            None => {
                self.state.stats.stale_completions += 1;
                warn!("Completion {} arrived without a backend", completion.kind());
                return;
            }
        };
        self.emit(outcome);
    }

    fn status_report(&self) -> Outcome {
        debug!("Uptime {:?}", self.state.start_time.elapsed());
        Outcome::accepted(true).with_app_event(AppEvent::StatusReport {
            phase: self.state.phase,
            session_name: self.state.session_name.clone(),
            joined_session: self.state.joined_session.clone(),
            outstanding: self.state.subscriptions.outstanding(),
            search_results: self
                .state
                .search
                .as_ref()
                .map(|search| search.results.len())
                .unwrap_or(0),
            commands_processed: self.state.stats.commands_processed,
            completions_processed: self.state.stats.completions_processed,
            stale_completions: self.state.stats.stale_completions,
        })
    }

    fn emit(&mut self, outcome: Outcome) {
        for effect in outcome.effects {
            self.send_effect(effect);
        }
        for app_event in outcome.app_events {
            self.send_app_event(app_event);
        }
    }

    fn send_effect(&self, effect: Effect) {
        trace!("Emitting effect {:?}", effect);
        if self.effect_sender.send(effect).is_err() {
            debug!("No effect subscribers, effect dropped");
        }
    }

    fn send_app_event(&self, app_event: AppEvent) {
        match self.app_event_sender.try_send_non_blocking(app_event) {
            Ok(()) => {}
            Err(ChannelError::ChannelFull) => warn!("App event channel full, event dropped"),
            Err(ChannelError::ChannelClosed) => trace!("App event receiver gone"),
        }
    }
}
