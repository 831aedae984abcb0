//! Integration tests for the lobby runtime
//!
//! Runs the real session logic task against an auto-completing mock backend
//! and observes it only through app events, effects and the call journal.

use std::time::Duration;

use lobby_core::{
    AppEvent, AppEventReceiver, Completion, Effect, EffectReceiver, SessionName, SessionPhase,
    SubscriptionKind,
};
use lobby_harness::{fixtures, BackendCall, MockBackend, MockBackendConfig, MockHandle};
use lobby_runtime::{create_test_runtime, LobbyRuntime};
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(2);

async fn start(config: MockBackendConfig) -> (LobbyRuntime, AppEventReceiver, MockHandle) {
    let backend = MockBackend::new(config);
    let handle = backend.handle();
    let mut runtime = create_test_runtime(fixtures::player("p1"), backend)
        .await
        .expect("Failed to create runtime");
    let events = runtime
        .take_app_event_receiver()
        .expect("Failed to get app event receiver");
    (runtime, events, handle)
}

async fn next_matching(
    events: &mut AppEventReceiver,
    predicate: impl Fn(&AppEvent) -> bool,
) -> AppEvent {
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

async fn status(runtime: &LobbyRuntime, events: &mut AppEventReceiver) -> AppEvent {
    runtime.request_status().await.unwrap();
    next_matching(events, |event| matches!(event, AppEvent::StatusReport { .. })).await
}

#[tokio::test]
async fn test_host_runs_the_full_chain() {
    let config = MockBackendConfig::auto().with_friends(vec![
        fixtures::friend("f1", "Alice"),
        fixtures::friend("f2", "Pingu42"),
    ]);
    let (mut runtime, mut events, handle) = start(config).await;
    let mut effects = runtime.subscribe_effects();

    assert!(runtime.host_session("Game", true, true, 4).await.unwrap());

    assert_eq!(
        next_effect(&mut effects).await,
        Effect::OpenLevel {
            map_name: "FirstPersonExampleMap".to_string(),
            listen: true,
        }
    );
    let invited = next_matching(&mut events, |event| {
        matches!(event, AppEvent::FriendInvited { .. })
    })
    .await;
    assert_eq!(
        invited,
        AppEvent::FriendInvited {
            friend: lobby_core::UniqueNetId::new("f2"),
            display_name: "Pingu42".to_string(),
        }
    );

    match status(&runtime, &mut events).await {
        AppEvent::StatusReport {
            phase,
            session_name,
            outstanding,
            ..
        } => {
            assert_eq!(phase, SessionPhase::Active);
            assert_eq!(session_name, Some(SessionName::new("Game")));
            assert!(outstanding.is_empty());
        }
        other => panic!("unexpected event {:?}", other),
    }

    let journal = handle.journal();
    assert_eq!(
        journal.count(|call| matches!(call, BackendCall::StartSession { .. })),
        1
    );
    for kind in SubscriptionKind::ONE_SHOT {
        assert!(journal.max_live(kind) <= 1);
    }

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_host_then_destroy_returns_to_entry_map() {
    let (mut runtime, mut events, _handle) = start(MockBackendConfig::auto()).await;
    let mut effects = runtime.subscribe_effects();

    assert!(runtime.host_session("Game", false, false, 2).await.unwrap());
    next_effect(&mut effects).await;
    next_matching(&mut events, |event| {
        matches!(
            event,
            AppEvent::PhaseChanged {
                to: SessionPhase::Active,
                ..
            }
        )
    })
    .await;

    runtime.destroy_session().await.unwrap();
    assert_eq!(
        next_effect(&mut effects).await,
        Effect::OpenLevel {
            map_name: "EntryMap".to_string(),
            listen: false,
        }
    );
    next_matching(&mut events, |event| {
        matches!(
            event,
            AppEvent::SessionDestroyed { success: true, .. }
        )
    })
    .await;

    match status(&runtime, &mut events).await {
        AppEvent::StatusReport {
            phase,
            session_name,
            ..
        } => {
            assert_eq!(phase, SessionPhase::Idle);
            assert!(session_name.is_none());
        }
        other => panic!("unexpected event {:?}", other),
    }

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_find_and_join_travels_to_other_session() {
    let config = MockBackendConfig::auto().with_search_results(vec![
        fixtures::search_result("mine", "p1"),
        fixtures::search_result("theirs", "p2"),
    ]);
    let (mut runtime, mut events, handle) = start(config).await;
    let mut effects = runtime.subscribe_effects();

    assert!(runtime.find_sessions(true, true).await.unwrap());
    match next_matching(&mut events, |event| {
        matches!(event, AppEvent::SearchCompleted { .. })
    })
    .await
    {
        AppEvent::SearchCompleted { success, results } => {
            assert!(success);
            assert_eq!(results.len(), 2);
        }
        other => panic!("unexpected event {:?}", other),
    }

    assert!(runtime.join_session().await.unwrap());
    assert_eq!(
        next_effect(&mut effects).await,
        Effect::ClientTravel {
            connect_string: "127.0.0.1:7777".to_string(),
        }
    );
    assert!(handle.journal().calls().iter().any(|call| matches!(
        call,
        BackendCall::JoinSession { session_id, .. } if session_id == "theirs"
    )));

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_lan_search_filters_online_sessions() {
    let mut online = fixtures::search_result("online", "p2");
    online.settings.is_lan_match = false;
    let config = MockBackendConfig::auto().with_search_results(vec![online]);
    let (mut runtime, mut events, _handle) = start(config).await;

    assert!(runtime.find_sessions(true, true).await.unwrap());
    let completed = next_matching(&mut events, |event| {
        matches!(event, AppEvent::SearchCompleted { .. })
    })
    .await;
    assert_eq!(
        completed,
        AppEvent::SearchCompleted {
            success: true,
            results: Vec::new(),
        }
    );
    assert!(!runtime.join_session().await.unwrap());

    runtime.shutdown().await.unwrap();
}

async fn wait_until_active(events: &mut AppEventReceiver) {
    next_matching(events, |event| {
        matches!(
            event,
            AppEvent::PhaseChanged {
                to: SessionPhase::Active,
                ..
            }
        )
    })
    .await;
}

#[tokio::test]
async fn test_accepted_invite_joins_and_travels() {
    let (mut runtime, mut events, handle) = start(MockBackendConfig::auto()).await;
    let mut effects = runtime.subscribe_effects();

    // Accepted invites are only listened for once a hosted session started
    assert!(runtime.host_session("Game", true, true, 4).await.unwrap());
    wait_until_active(&mut events).await;
    next_effect(&mut effects).await;
    assert!(handle.is_registered(SubscriptionKind::InviteAccepted));

    assert!(handle.push_completion(Completion::InviteAccepted {
        success: true,
        controller_slot: 0,
        user_id: Some(lobby_core::UniqueNetId::new("p1")),
        search_result: Some(fixtures::search_result("invited", "p3")),
    }));

    assert_eq!(
        next_effect(&mut effects).await,
        Effect::ClientTravel {
            connect_string: "127.0.0.1:7777".to_string(),
        }
    );
    next_matching(&mut events, |event| {
        matches!(event, AppEvent::JoinCompleted { .. })
    })
    .await;

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_accepted_invite_without_hosting_is_ignored() {
    let (mut runtime, mut events, handle) = start(MockBackendConfig::auto()).await;
    status(&runtime, &mut events).await;
    assert!(!handle.is_registered(SubscriptionKind::InviteAccepted));
    assert!(handle.is_registered(SubscriptionKind::InviteReceived));

    assert!(handle.force_completion(Completion::InviteAccepted {
        success: true,
        controller_slot: 0,
        user_id: Some(lobby_core::UniqueNetId::new("p1")),
        search_result: Some(fixtures::search_result("invited", "p3")),
    }));

    match status(&runtime, &mut events).await {
        AppEvent::StatusReport {
            stale_completions,
            joined_session,
            ..
        } => {
            assert_eq!(stale_completions, 1);
            assert!(joined_session.is_none());
        }
        other => panic!("unexpected event {:?}", other),
    }
    assert_eq!(
        handle
            .journal()
            .count(|call| matches!(call, BackendCall::JoinSession { .. })),
        0
    );

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_failed_start_can_be_destroyed_and_hosted_again() {
    let mut config = MockBackendConfig::auto();
    config.start_succeeds = false;
    let (mut runtime, mut events, handle) = start(config).await;
    let mut effects = runtime.subscribe_effects();

    assert!(runtime.host_session("Game", true, true, 4).await.unwrap());
    next_matching(&mut events, |event| {
        matches!(event, AppEvent::SessionStarted { success: false, .. })
    })
    .await;
    assert!(!runtime.host_session("Game", true, true, 4).await.unwrap());

    runtime.destroy_session().await.unwrap();
    assert_eq!(
        next_effect(&mut effects).await,
        Effect::OpenLevel {
            map_name: "EntryMap".to_string(),
            listen: false,
        }
    );
    match status(&runtime, &mut events).await {
        AppEvent::StatusReport {
            phase,
            session_name,
            ..
        } => {
            assert_eq!(phase, SessionPhase::Idle);
            assert!(session_name.is_none());
        }
        other => panic!("unexpected event {:?}", other),
    }

    assert!(runtime.host_session("Game", true, true, 4).await.unwrap());
    let journal = handle.journal();
    assert!(journal.calls().contains(&BackendCall::DestroySession {
        session_name: SessionName::new("Game"),
    }));
    assert_eq!(
        journal.count(|call| matches!(call, BackendCall::CreateSession { .. })),
        2
    );

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_received_invite_is_reported() {
    let (mut runtime, mut events, handle) = start(MockBackendConfig::default()).await;
    status(&runtime, &mut events).await;

    assert!(handle.push_completion(Completion::InviteReceived {
        invited: lobby_core::UniqueNetId::new("p1"),
        inviter: lobby_core::UniqueNetId::new("p9"),
        app_id: "example".to_string(),
        search_result: fixtures::search_result("party", "p9"),
    }));
    assert_eq!(
        next_matching(&mut events, |event| {
            matches!(event, AppEvent::InviteReceived { .. })
        })
        .await,
        AppEvent::InviteReceived {
            inviter: lobby_core::UniqueNetId::new("p9"),
            session_id: "party".to_string(),
        }
    );

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_stale_completion_is_counted_and_ignored() {
    let (mut runtime, mut events, handle) = start(MockBackendConfig::default()).await;
    status(&runtime, &mut events).await;

    assert!(handle.force_completion(Completion::CreateSession {
        session_name: SessionName::new("Ghost"),
        success: true,
    }));

    match status(&runtime, &mut events).await {
        AppEvent::StatusReport {
            phase,
            stale_completions,
            ..
        } => {
            assert_eq!(phase, SessionPhase::Idle);
            assert_eq!(stale_completions, 1);
        }
        other => panic!("unexpected event {:?}", other),
    }
    assert_eq!(
        handle
            .journal()
            .count(|call| matches!(call, BackendCall::StartSession { .. })),
        0
    );

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_signed_out_player_is_refused() {
    let (mut runtime, mut events, handle) = start(MockBackendConfig::auto()).await;

    assert!(!runtime.set_local_player(None).await.unwrap());
    assert!(!runtime.host_session("Game", true, true, 4).await.unwrap());
    assert!(!runtime.find_sessions(true, true).await.unwrap());
    assert!(!runtime.send_invite_to_friend("f1").await.unwrap());

    let failed = next_matching(&mut events, |event| {
        matches!(event, AppEvent::RequestFailed { .. })
    })
    .await;
    assert!(matches!(
        failed,
        AppEvent::RequestFailed { ref operation, .. } if operation == "host session"
    ));
    assert_eq!(handle.journal().request_count(), 0);

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_releases_every_subscription() {
    let (mut runtime, mut events, handle) = start(MockBackendConfig::default()).await;

    // Create never completes, so its subscription is still live at shutdown
    assert!(runtime.host_session("Game", true, true, 4).await.unwrap());
    status(&runtime, &mut events).await;
    assert!(handle.is_registered(SubscriptionKind::CreateSession));

    runtime.shutdown().await.unwrap();
    assert!(!runtime.is_running());

    let journal = handle.journal();
    assert_eq!(journal.live(SubscriptionKind::CreateSession), 0);
    assert_eq!(journal.live(SubscriptionKind::InviteAccepted), 0);
    assert_eq!(journal.live(SubscriptionKind::InviteReceived), 0);
    assert!(journal.releases_are_paired());
}
