//! End-to-end invite flow over a loopback network
//!
//! Two runtimes share one network: the host's friends list is read after the
//! session starts, the marked friend is invited, accepts through the platform
//! and ends up travelling to the host. Accepted invites are only followed by
//! a player whose own hosted session has started.

use std::time::Duration;

use lobby_core::{
    AppEvent, AppEventReceiver, Effect, EffectReceiver, LobbyConfig, LocalPlayer, SessionPhase,
    UniqueNetId,
};
use lobby_loopback::LoopbackNetwork;
use lobby_runtime::{LobbyRuntime, RuntimeBuilder};
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(2);

async fn runtime_for(
    network: &LoopbackNetwork,
    user: &UniqueNetId,
) -> (LobbyRuntime, AppEventReceiver, EffectReceiver) {
    let backend = network.backend_for(user).expect("known user");
    let mut runtime = RuntimeBuilder::new()
        .with_config(LobbyConfig::testing())
        .with_local_player(LocalPlayer::new(user.clone(), 0))
        .with_backend(backend)
        .build_and_start()
        .await
        .expect("Failed to start runtime");
    let events = runtime.take_app_event_receiver().expect("events");
    let effects = runtime.subscribe_effects();
    (runtime, events, effects)
}

async fn wait_for(events: &mut AppEventReceiver, predicate: impl Fn(&AppEvent) -> bool) -> AppEvent {
    timeout(WAIT, async {
        loop {
            match events.recv().await {
                Some(event) if predicate(&event) => return event,
                Some(_) => continue,
                None => panic!("app event channel closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for app event")
}

async fn next_effect(effects: &mut EffectReceiver) -> Effect {
    timeout(WAIT, effects.recv())
        .await
        .expect("timed out waiting for effect")
        .expect("effect channel closed")
}

fn network_with_friends() -> (LoopbackNetwork, UniqueNetId, UniqueNetId, UniqueNetId) {
    let network = LoopbackNetwork::new();
    let host = UniqueNetId::new("host-1");
    let pingu = UniqueNetId::new("guest-pingu");
    let other = UniqueNetId::new("guest-other");
    network.add_user(host.clone(), "Hosty");
    network.add_user(pingu.clone(), "Pingu7");
    network.add_user(other.clone(), "Walrus");
    network.befriend(&host, &pingu).unwrap();
    network.befriend(&host, &other).unwrap();
    (network, host, pingu, other)
}

/// Host a session and wait for it to become active
async fn host_until_active(
    runtime: &LobbyRuntime,
    events: &mut AppEventReceiver,
    effects: &mut EffectReceiver,
    name: &str,
) {
    assert!(runtime.host_session(name, true, true, 4).await.unwrap());
    assert!(matches!(
        next_effect(effects).await,
        Effect::OpenLevel { listen: true, .. }
    ));
    wait_for(events, |e| {
        matches!(
            e,
            AppEvent::PhaseChanged {
                to: SessionPhase::Active,
                ..
            }
        )
    })
    .await;
}

#[tokio::test]
async fn test_marked_friend_is_invited_and_joins() {
    let (network, host, pingu, other) = network_with_friends();

    let (mut guest, mut guest_events, mut guest_effects) = runtime_for(&network, &pingu).await;
    let (mut hosting, mut host_events, mut host_effects) = runtime_for(&network, &host).await;

    // The guest runs a session of their own, which starts the accept listener
    host_until_active(&guest, &mut guest_events, &mut guest_effects, "Lounge").await;

    host_until_active(&hosting, &mut host_events, &mut host_effects, "Game").await;
    wait_for(&mut host_events, |e| {
        matches!(e, AppEvent::FriendInvited { friend, .. } if friend == &pingu)
    })
    .await;

    let received = wait_for(&mut guest_events, |e| {
        matches!(e, AppEvent::InviteReceived { .. })
    })
    .await;
    let AppEvent::InviteReceived { inviter, session_id } = received else {
        unreachable!()
    };
    assert_eq!(inviter, host);
    assert!(network.pending_invites(&other).is_empty());

    assert!(network.accept_invite(&pingu, &session_id));
    assert_eq!(
        next_effect(&mut guest_effects).await,
        Effect::ClientTravel {
            connect_string: format!("loopback://{}/{}", host, session_id),
        }
    );
    assert_eq!(network.members(&session_id), vec![pingu.clone()]);

    guest.shutdown().await.unwrap();
    hosting.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_idle_player_does_not_follow_accepted_invite() {
    let (network, host, pingu, _other) = network_with_friends();

    let (mut guest, mut guest_events, _guest_effects) = runtime_for(&network, &pingu).await;
    let (mut hosting, mut host_events, mut host_effects) = runtime_for(&network, &host).await;

    // Invite listeners are registered once the first status comes back
    guest.request_status().await.unwrap();
    wait_for(&mut guest_events, |e| matches!(e, AppEvent::StatusReport { .. })).await;

    host_until_active(&hosting, &mut host_events, &mut host_effects, "Game").await;
    let received = wait_for(&mut guest_events, |e| {
        matches!(e, AppEvent::InviteReceived { .. })
    })
    .await;
    let AppEvent::InviteReceived { session_id, .. } = received else {
        unreachable!()
    };

    assert!(!network.accept_invite(&pingu, &session_id));
    assert!(network.members(&session_id).is_empty());

    guest.request_status().await.unwrap();
    let status = wait_for(&mut guest_events, |e| matches!(e, AppEvent::StatusReport { .. })).await;
    assert!(matches!(
        status,
        AppEvent::StatusReport {
            joined_session: None,
            ..
        }
    ));

    guest.shutdown().await.unwrap();
    hosting.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_browse_finds_and_joins_remote_session() {
    let network = LoopbackNetwork::new();
    let local = UniqueNetId::new("browser");
    let remote = UniqueNetId::new("remote");
    network.add_user(local.clone(), "Browser");
    network.add_user(remote.clone(), "Remote");
    let session_id = network
        .advertise(
            &remote,
            lobby_core::SessionSettings::for_host(true, true, 4, "FirstPersonExampleMap"),
        )
        .unwrap();

    let (mut runtime, mut events, mut effects) = runtime_for(&network, &local).await;
    assert!(runtime.find_sessions(true, true).await.unwrap());
    let found = wait_for(&mut events, |e| matches!(e, AppEvent::SearchCompleted { .. })).await;
    assert!(matches!(
        found,
        AppEvent::SearchCompleted { success: true, ref results } if results.len() == 1
    ));

    assert!(runtime.join_session().await.unwrap());
    assert_eq!(
        next_effect(&mut effects).await,
        Effect::ClientTravel {
            connect_string: format!("loopback://remote/{}", session_id),
        }
    );

    // Leaving the joined session returns to the entry map
    runtime.destroy_session().await.unwrap();
    assert_eq!(
        next_effect(&mut effects).await,
        Effect::OpenLevel {
            map_name: "EntryMap".to_string(),
            listen: false,
        }
    );
    assert!(network.members(&session_id).is_empty());

    runtime.request_status().await.unwrap();
    let status = wait_for(&mut events, |e| matches!(e, AppEvent::StatusReport { .. })).await;
    assert!(matches!(
        status,
        AppEvent::StatusReport {
            phase: SessionPhase::Idle,
            joined_session: None,
            ..
        }
    ));

    runtime.shutdown().await.unwrap();
}
