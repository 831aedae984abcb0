//! Test fixtures shared by the lobby test suites

use lobby_core::{
    FriendRecord, LocalPlayer, SearchResult, SessionPolicy, SessionSettings, UniqueNetId,
};

/// Player on controller slot 0
pub fn player(user_id: &str) -> LocalPlayer {
    LocalPlayer::new(UniqueNetId::new(user_id), 0)
}

pub fn friend(user_id: &str, display_name: &str) -> FriendRecord {
    FriendRecord::new(UniqueNetId::new(user_id), display_name)
}

/// A LAN presence session hosted by `owner`
pub fn search_result(session_id: &str, owner: &str) -> SearchResult {
    SearchResult {
        session_id: session_id.to_string(),
        owning_user_id: UniqueNetId::new(owner),
        owning_user_name: format!("{}-name", owner),
        ping_ms: 12,
        open_public_connections: 3,
        settings: SessionSettings::for_host(true, true, 4, &SessionPolicy::default().map_name),
    }
}
