use crate::broadcast::Broadcaster;
use crate::coerce;
use crate::error::AppError;
use crate::models::sync::SyncResult;
use crate::store::RosterStore;
use log::info;
use serde_json::Value;
use shared::{format_timestamp, Player, PushMessage};

/// Exact comparison against the configured secret. A missing header is a
/// mismatch, not a distinct error.
pub fn check_api_key(expected: &str, provided: Option<&str>) -> Result<(), AppError> {
    if provided == Some(expected) {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}

/// The only write path in the system: coerce the payload, swap the roster,
/// fan the new snapshot out to subscribers.
pub fn replace_roster(
    store: &RosterStore,
    broadcaster: &Broadcaster,
    payload: &Value,
) -> Result<SyncResult, AppError> {
    let records = payload
        .get("playerData")
        .and_then(Value::as_array)
        .ok_or_else(|| AppError::BadRequest("playerData must be an array".into()))?;

    let players: Vec<Player> = records.iter().map(coerce::player_record).collect();
    let player_count = players.len();

    let last_update = store.replace(players);
    let snapshot = store.read();
    let reached = broadcaster.publish(&PushMessage::roster_update(
        snapshot.players,
        snapshot.last_update,
    ));

    info!(
        "[Sync] Received {} players, broadcast to {} subscribers",
        player_count, reached
    );

    Ok(SyncResult {
        success: true,
        player_count,
        timestamp: format_timestamp(last_update),
    })
}
