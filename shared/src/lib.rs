// Wire types shared between the sync server and the dashboard client.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SPINNER_ID: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub user_id: String,
    pub counter_spin: bool,
    pub wins: u64,
    pub spinner_id: String,
    pub bits: u64,
    pub clan: String,
    pub unlocks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub player: Player,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatus {
    pub connected: bool,
    pub player_count: usize,
    pub last_update: String,
}

/// The single push event: the full roster, never a diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    #[serde(rename = "type")]
    pub kind: PushEvent,
    pub data: Vec<Player>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushEvent {
    PlayersUpdate,
}

impl PushMessage {
    pub fn roster_update(players: Vec<Player>, last_update: DateTime<Utc>) -> Self {
        PushMessage {
            kind: PushEvent::PlayersUpdate,
            data: players,
            timestamp: format_timestamp(last_update),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Bits,
    Wins,
}

impl SortKey {
    /// Permissive parse: anything other than "wins" ranks by bits.
    pub fn parse(raw: &str) -> SortKey {
        match raw {
            "wins" => SortKey::Wins,
            _ => SortKey::Bits,
        }
    }

    pub fn value(&self, player: &Player) -> u64 {
        match self {
            SortKey::Bits => player.bits,
            SortKey::Wins => player.wins,
        }
    }
}

/// Descending rank over a roster snapshot. The sort is stable, so players
/// with equal counters keep their snapshot order.
pub fn rank_players(players: &[Player], sort_by: SortKey, limit: Option<usize>) -> Vec<LeaderboardEntry> {
    let mut sorted: Vec<Player> = players.to_vec();
    sorted.sort_by(|a, b| sort_by.value(b).cmp(&sort_by.value(a)));
    if let Some(limit) = limit {
        sorted.truncate(limit);
    }
    sorted
        .into_iter()
        .enumerate()
        .map(|(idx, player)| LeaderboardEntry {
            rank: idx + 1,
            player,
        })
        .collect()
}

/// ISO 8601 with millisecond precision, matching what browsers produce.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
