//! Event printing, as plain text or JSON lines

use lobby_core::{AppEvent, Effect};
use serde::Serialize;

use crate::error::Result;

/// One printed line in `--json` mode
#[derive(Debug, Serialize)]
struct JsonLine<'a, T: Serialize> {
    player: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    body: &'a T,
}

/// Prints what each player's runtime reports
#[derive(Debug, Clone, Copy)]
pub struct Printer {
    json: bool,
}

impl Printer {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn event(&self, player: &str, event: &AppEvent) -> Result<()> {
        if self.json {
            self.json_line(player, "event", event)
        } else {
            println!("[{}] {}", player, describe_event(event));
            Ok(())
        }
    }

    pub fn effect(&self, player: &str, effect: &Effect) -> Result<()> {
        if self.json {
            self.json_line(player, "effect", effect)
        } else {
            println!("[{}] >> {}", player, describe_effect(effect));
            Ok(())
        }
    }

    /// Scenario narration; suppressed in JSON mode
    pub fn note(&self, message: impl AsRef<str>) {
        if !self.json {
            println!("-- {}", message.as_ref());
        }
    }

    fn json_line<T: Serialize>(&self, player: &str, kind: &'static str, body: &T) -> Result<()> {
        let line = serde_json::to_string(&JsonLine { player, kind, body })?;
        println!("{}", line);
        Ok(())
    }
}

pub fn describe_effect(effect: &Effect) -> String {
    match effect {
        Effect::OpenLevel { map_name, listen } if *listen => format!("open {} as listen server", map_name),
        Effect::OpenLevel { map_name, .. } => format!("open {}", map_name),
        Effect::ClientTravel { connect_string } => format!("travel to {}", connect_string),
    }
}

pub fn describe_event(event: &AppEvent) -> String {
    match event {
        AppEvent::PhaseChanged { from, to } => format!("phase {} -> {}", from, to),
        AppEvent::SessionCreated {
            session_name,
            success,
        } => format!("create {}: {}", session_name, verdict(*success)),
        AppEvent::SessionStarted {
            session_name,
            success,
        } => format!("start {}: {}", session_name, verdict(*success)),
        AppEvent::SearchCompleted { success, results } => {
            let mut line = format!("search {}: {} result(s)", verdict(*success), results.len());
            for result in results {
                line.push_str(&format!(
                    "\n    {}. {} hosted by {} ({} ms)",
                    result.index, result.session_id, result.owning_user_name, result.ping_ms
                ));
            }
            line
        }
        AppEvent::JoinCompleted {
            session_name,
            result,
        } => format!("join {}: {}", session_name, result),
        AppEvent::SessionDestroyed {
            session_name,
            success,
        } => format!("destroy {}: {}", session_name, verdict(*success)),
        AppEvent::FriendsListRead {
            success: true,
            friend_count,
            ..
        } => format!("friends list read: {} friend(s)", friend_count),
        AppEvent::FriendsListRead { error, .. } => format!(
            "friends list read failed: {}",
            error.as_deref().unwrap_or("unknown error")
        ),
        AppEvent::FriendInvited {
            friend,
            display_name,
        } => format!("invited {} ({})", display_name, friend),
        AppEvent::InviteReceived {
            inviter,
            session_id,
        } => format!("invite from {} to {}", inviter, session_id),
        AppEvent::InviteAccepted {
            success,
            session_id,
        } => format!(
            "invite accepted: {} ({})",
            verdict(*success),
            session_id.as_deref().unwrap_or("no session")
        ),
        AppEvent::RequestFailed { operation, reason } => {
            format!("{} refused: {}", operation, reason)
        }
        AppEvent::StatusReport {
            phase,
            session_name,
            joined_session,
            outstanding,
            search_results,
            commands_processed,
            completions_processed,
            stale_completions,
        } => format!(
            "status: phase {}, hosting {}, joined {}, {} outstanding, {} search result(s), \
             {} command(s), {} completion(s), {} stale",
            phase,
            session_name.as_ref().map_or("-", |name| name.as_str()),
            joined_session.as_ref().map_or("-", |name| name.as_str()),
            outstanding.len(),
            search_results,
            commands_processed,
            completions_processed,
            stale_completions
        ),
        AppEvent::SystemError { error } => format!("error: {}", error),
    }
}

fn verdict(success: bool) -> &'static str {
    if success {
        "ok"
    } else {
        "failed"
    }
}
