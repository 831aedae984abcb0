//! Command handlers for the lobby CLI
//!
//! Every scenario runs on a fresh loopback network: each player gets their own
//! runtime and backend, and the CLI drives them the way a game client would.

use std::time::Duration;

use lobby_core::{
    AppEvent, AppEventReceiver, Effect, EffectReceiver, LobbyConfig, LocalPlayer, SessionSettings,
    UniqueNetId,
};
use lobby_loopback::LoopbackNetwork;
use lobby_runtime::{LobbyRuntime, RuntimeBuilder};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::cli::{Cli, Commands};
use crate::config::{AppConfig, DemoConfig};
use crate::error::{CliError, Result};
use crate::output::Printer;

// ----------------------------------------------------------------------------
// Participant
// ----------------------------------------------------------------------------

/// One player on the loopback network, with their runtime and receivers
struct Participant {
    label: String,
    user: UniqueNetId,
    runtime: LobbyRuntime,
    events: AppEventReceiver,
    effects: EffectReceiver,
    wait: Duration,
}

impl Participant {
    async fn start(
        network: &LoopbackNetwork,
        user: UniqueNetId,
        label: impl Into<String>,
        config: &LobbyConfig,
        wait: Duration,
    ) -> Result<Self> {
        let backend = network.backend_for(&user)?;
        let mut runtime = RuntimeBuilder::new()
            .with_config(config.clone())
            .with_local_player(LocalPlayer::new(user.clone(), 0))
            .with_backend(backend)
            .build_and_start()
            .await?;
        let events = runtime
            .take_app_event_receiver()
            .ok_or_else(|| CliError::scenario("app event receiver already taken"))?;
        let effects = runtime.subscribe_effects();
        Ok(Self {
            label: label.into(),
            user,
            runtime,
            events,
            effects,
            wait,
        })
    }

    /// Print events until one matches `predicate`
    async fn wait_for(
        &mut self,
        printer: &Printer,
        what: &str,
        predicate: impl Fn(&AppEvent) -> bool,
    ) -> Result<AppEvent> {
        let deadline = tokio::time::Instant::now() + self.wait;
        loop {
            let event = match tokio::time::timeout_at(deadline, self.events.recv()).await {
                Ok(Some(event)) => event,
                Ok(None) => return Err(CliError::scenario(format!("{}: runtime stopped", self.label))),
                Err(_) => {
                    return Err(CliError::scenario(format!(
                        "{}: timed out waiting for {}",
                        self.label, what
                    )))
                }
            };
            printer.event(&self.label, &event)?;
            if predicate(&event) {
                return Ok(event);
            }
        }
    }

    /// Wait for the next effect
    async fn next_effect(&mut self, printer: &Printer) -> Result<Effect> {
        loop {
            match timeout(self.wait, self.effects.recv()).await {
                Ok(Ok(effect)) => {
                    printer.effect(&self.label, &effect)?;
                    return Ok(effect);
                }
                Ok(Err(RecvError::Lagged(skipped))) => {
                    warn!("{} missed {} effects", self.label, skipped);
                }
                Ok(Err(RecvError::Closed)) => {
                    return Err(CliError::scenario(format!("{}: runtime stopped", self.label)))
                }
                Err(_) => {
                    return Err(CliError::scenario(format!(
                        "{}: timed out waiting for an effect",
                        self.label
                    )))
                }
            }
        }
    }

    /// Print whatever events are already queued
    fn drain(&mut self, printer: &Printer) -> Result<()> {
        while let Ok(event) = self.events.try_recv() {
            printer.event(&self.label, &event)?;
        }
        Ok(())
    }

    /// Host a session and wait until it started and the friends list was read
    async fn host(&mut self, printer: &Printer, session_name: &str, demo: &DemoConfig) -> Result<()> {
        printer.note(format!(
            "{} hosts {:?} for {} players",
            self.label, session_name, demo.max_players
        ));
        let accepted = self
            .runtime
            .host_session(session_name, demo.is_lan, true, demo.max_players)
            .await?;
        if !accepted {
            self.drain(printer)?;
            return Err(CliError::scenario(format!(
                "{}: host request was refused",
                self.label
            )));
        }
        self.next_effect(printer).await?;
        self.wait_for(printer, "friends list", |event| {
            matches!(event, AppEvent::FriendsListRead { .. })
        })
        .await?;
        self.drain(printer)
    }

    /// Request a status report and wait for it
    async fn status(&mut self, printer: &Printer) -> Result<AppEvent> {
        self.runtime.request_status().await?;
        self.wait_for(printer, "status", |event| {
            matches!(event, AppEvent::StatusReport { .. })
        })
        .await
    }

    async fn shutdown(mut self, printer: &Printer) -> Result<()> {
        self.runtime.shutdown().await?;
        self.drain(printer)
    }
}

// ----------------------------------------------------------------------------
// Command Dispatcher
// ----------------------------------------------------------------------------

/// Command dispatcher for handling CLI commands
pub struct CommandDispatcher;

impl CommandDispatcher {
    /// Execute a CLI command
    pub async fn execute(cli: &Cli, config: AppConfig) -> Result<()> {
        let printer = Printer::new(cli.json);
        match &cli.command {
            Commands::Demo => Self::handle_demo_command(&config, &printer).await,
            Commands::Browse { sessions } => {
                Self::handle_browse_command(&config, &printer, *sessions).await
            }
            Commands::Config => Self::handle_config_command(&config),
        }
    }

    /// Host a session; marked friends are invited, accept and travel
    async fn handle_demo_command(config: &AppConfig, printer: &Printer) -> Result<()> {
        let wait = Duration::from_millis(config.demo.wait_ms);
        let network = LoopbackNetwork::new();
        let host_id = config.player.user_id();
        network.add_user(host_id.clone(), config.player.display_name.as_str());
        for friend in &config.demo.friends {
            let id = UniqueNetId::new(friend.id.as_str());
            network.add_user(id.clone(), friend.display_name.as_str());
            network.befriend(&host_id, &id)?;
        }

        let mut guests = Vec::with_capacity(config.demo.friends.len());
        for friend in &config.demo.friends {
            let mut guest = Participant::start(
                &network,
                UniqueNetId::new(friend.id.as_str()),
                friend.display_name.as_str(),
                &config.lobby,
                wait,
            )
            .await?;
            // Accepted invites are only followed once the guest's own session started
            guest
                .host(printer, &format!("{} lobby", friend.display_name), &config.demo)
                .await?;
            guests.push(guest);
        }
        let mut host = Participant::start(
            &network,
            host_id,
            config.player.display_name.as_str(),
            &config.lobby,
            wait,
        )
        .await?;

        host.host(printer, &config.demo.session_name, &config.demo).await?;

        let mut joined = 0;
        for guest in &mut guests {
            let invites = network.pending_invites(&guest.user);
            let Some(invite) = invites.first() else {
                printer.note(format!("{} was not invited", guest.label));
                continue;
            };
            guest
                .wait_for(printer, "invite", |event| {
                    matches!(event, AppEvent::InviteReceived { .. })
                })
                .await?;
            printer.note(format!("{} accepts the invite from {}", guest.label, invite.inviter));
            if !network.accept_invite(&guest.user, &invite.session.session_id) {
                warn!("{} had no invite listener", guest.label);
                continue;
            }
            match guest.next_effect(printer).await? {
                Effect::ClientTravel { .. } => joined += 1,
                other => debug!("{} got unexpected effect {:?}", guest.label, other),
            }
            guest.drain(printer)?;
        }

        host.status(printer).await?;
        info!("{} of {} friends joined", joined, guests.len());
        printer.note(format!("{} of {} friends joined", joined, guests.len()));

        for guest in guests {
            guest.shutdown(printer).await?;
        }
        host.shutdown(printer).await
    }

    /// Find seeded sessions and join the first one hosted by someone else
    async fn handle_browse_command(config: &AppConfig, printer: &Printer, sessions: usize) -> Result<()> {
        let wait = Duration::from_millis(config.demo.wait_ms);
        let network = LoopbackNetwork::new();
        let local = config.player.user_id();
        network.add_user(local.clone(), config.player.display_name.as_str());

        let settings = SessionSettings::for_host(
            config.demo.is_lan,
            true,
            config.demo.max_players,
            config.lobby.session.map_name.as_str(),
        );
        // One session of our own, which the join must skip
        network.advertise(&local, settings.clone())?;
        for index in 1..=sessions {
            let remote = UniqueNetId::new(format!("remote-{}", index));
            network.add_user(remote.clone(), format!("Remote {}", index));
            network.advertise(&remote, settings.clone())?;
        }

        let mut browser = Participant::start(
            &network,
            local,
            config.player.display_name.as_str(),
            &config.lobby,
            wait,
        )
        .await?;

        printer.note(format!("{} searches for sessions", browser.label));
        browser
            .runtime
            .find_sessions(config.demo.is_lan, true)
            .await?;
        browser
            .wait_for(printer, "search results", |event| {
                matches!(event, AppEvent::SearchCompleted { .. })
            })
            .await?;

        if !browser.runtime.join_session().await? {
            browser.drain(printer)?;
            printer.note("no session to join");
            return browser.shutdown(printer).await;
        }
        browser.next_effect(printer).await?;
        browser
            .wait_for(printer, "join", |event| {
                matches!(event, AppEvent::JoinCompleted { .. })
            })
            .await?;

        printer.note(format!("{} leaves", browser.label));
        browser.runtime.destroy_session().await?;
        browser.next_effect(printer).await?;
        browser.status(printer).await?;
        browser.shutdown(printer).await
    }

    fn handle_config_command(config: &AppConfig) -> Result<()> {
        print!("{}", config.to_toml()?);
        Ok(())
    }
}
