use chrono::{DateTime, Utc};
use shared::Player;
use std::sync::RwLock;

#[derive(Debug, Clone)]
pub struct RosterSnapshot {
    pub players: Vec<Player>,
    pub last_update: DateTime<Utc>,
}

/// The authoritative roster. One writer (the sync endpoint), many readers.
/// There is no per-player mutation; the whole snapshot is swapped at once, so
/// readers always observe a complete roster.
pub struct RosterStore {
    inner: RwLock<RosterSnapshot>,
}

impl RosterStore {
    pub fn new() -> Self {
        RosterStore {
            inner: RwLock::new(RosterSnapshot {
                players: Vec::new(),
                last_update: Utc::now(),
            }),
        }
    }

    pub fn replace(&self, players: Vec<Player>) -> DateTime<Utc> {
        let mut snapshot = self.inner.write().unwrap();
        snapshot.players = players;
        snapshot.last_update = Utc::now();
        snapshot.last_update
    }

    pub fn read(&self) -> RosterSnapshot {
        self.inner.read().unwrap().clone()
    }
}

impl Default for RosterStore {
    fn default() -> Self {
        Self::new()
    }
}
