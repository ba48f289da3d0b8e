use crate::error::AppError;
use crate::store::RosterStore;
use shared::{format_timestamp, rank_players, LeaderboardEntry, Player, ServerStatus, SortKey};

/// Case-insensitive lookup. The store does not enforce `userId` uniqueness,
/// so the first match wins.
pub fn find_player(store: &RosterStore, user_id: &str) -> Result<Player, AppError> {
    let wanted = user_id.to_lowercase();
    store
        .read()
        .players
        .into_iter()
        .find(|p| p.user_id.to_lowercase() == wanted)
        .ok_or_else(|| AppError::NotFound(format!("No player with id {}", user_id)))
}

pub fn leaderboard(
    store: &RosterStore,
    sort_by: SortKey,
    limit: Option<usize>,
) -> Vec<LeaderboardEntry> {
    rank_players(&store.read().players, sort_by, limit)
}

pub fn status(store: &RosterStore) -> ServerStatus {
    let snapshot = store.read();
    ServerStatus {
        connected: true,
        player_count: snapshot.players.len(),
        last_update: format_timestamp(snapshot.last_update),
    }
}
