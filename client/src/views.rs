//! Projections the dashboard renders. All of them derive from the mirrored
//! roster snapshot; none hold state of their own.

use shared::{rank_players, LeaderboardEntry, Player, SortKey};

const HOME_TOP: usize = 5;

pub struct HomeView {
    pub total_players: usize,
    pub total_bits: u64,
    pub total_wins: u64,
    pub top_by_bits: Vec<LeaderboardEntry>,
    pub top_by_wins: Vec<LeaderboardEntry>,
}

pub fn home(players: &[Player]) -> HomeView {
    HomeView {
        total_players: players.len(),
        total_bits: players.iter().map(|p| p.bits).sum(),
        total_wins: players.iter().map(|p| p.wins).sum(),
        top_by_bits: rank_players(players, SortKey::Bits, Some(HOME_TOP)),
        top_by_wins: rank_players(players, SortKey::Wins, Some(HOME_TOP)),
    }
}

pub fn leaderboard(
    players: &[Player],
    sort_by: SortKey,
    limit: Option<usize>,
) -> Vec<LeaderboardEntry> {
    rank_players(players, sort_by, limit)
}

/// Case-insensitive substring filter on `userId`.
pub fn search<'a>(players: &'a [Player], query: &str) -> Vec<&'a Player> {
    let needle = query.to_lowercase();
    players
        .iter()
        .filter(|p| p.user_id.to_lowercase().contains(&needle))
        .collect()
}

/// Exact clan filter; the empty string selects clanless players.
pub fn in_clan<'a>(players: &'a [Player], clan: &str) -> Vec<&'a Player> {
    players.iter().filter(|p| p.clan == clan).collect()
}

pub struct PlayerDetail {
    pub player: Player,
    pub bits_rank: usize,
    pub wins_rank: usize,
}

/// Detail view: first case-insensitive match, with 1-based ranks computed
/// from fresh sorted copies. Rank 0 means the player vanished mid-render.
pub fn player_detail(players: &[Player], user_id: &str) -> Option<PlayerDetail> {
    let wanted = user_id.to_lowercase();
    let player = players
        .iter()
        .find(|p| p.user_id.to_lowercase() == wanted)?
        .clone();
    Some(PlayerDetail {
        bits_rank: rank_of(players, &player.user_id, SortKey::Bits),
        wins_rank: rank_of(players, &player.user_id, SortKey::Wins),
        player,
    })
}

fn rank_of(players: &[Player], user_id: &str, sort_by: SortKey) -> usize {
    rank_players(players, sort_by, None)
        .iter()
        .find(|entry| entry.player.user_id == user_id)
        .map(|entry| entry.rank)
        .unwrap_or(0)
}
