mod broadcast;
mod coerce;
mod config;
mod error;
mod handlers;
mod models;
mod services;
mod store;

use broadcast::Broadcaster;
use config::Config;
use log::info;
use ntex::web;
use ntex_cors::Cors;
use std::sync::Arc;
use store::RosterStore;

// Full roster payloads from the game can be large
const SYNC_BODY_LIMIT: usize = 5 * 1024 * 1024;

fn api_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/players", web::get().to(handlers::roster::get_players))
        .route(
            "/api/players/{user_id}",
            web::get().to(handlers::roster::get_player),
        )
        .route(
            "/api/leaderboard",
            web::get().to(handlers::roster::get_leaderboard),
        )
        .route("/api/status", web::get().to(handlers::roster::get_status))
        .route("/api/sync", web::post().to(handlers::sync::sync_roster))
        .route("/api/events", web::get().to(handlers::events::subscribe));
}

#[ntex::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();

    let config = Arc::new(Config::from_env());
    let store = Arc::new(RosterStore::new());
    let broadcaster = Arc::new(Broadcaster::new());

    let bind_addr = format!("{}:{}", config.host, config.port);
    info!("[Server] Running on http://{}", bind_addr);
    info!("[Server] Sync endpoint: POST /api/sync (requires x-api-key header)");

    web::HttpServer::new(move || {
        web::App::new()
            .state(config.clone())
            .state(store.clone())
            .state(broadcaster.clone())
            .state(web::types::JsonConfig::default().limit(SYNC_BODY_LIMIT))
            .wrap(
                Cors::new()
                    .allowed_origin("*")
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec!["Content-Type", "x-api-key"])
                    .max_age(3600)
                    .finish(),
            )
            .configure(api_routes)
    })
    .bind(bind_addr)?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use serde_json::json;
    use shared::{PushEvent, SortKey};

    fn sync_payload(records: serde_json::Value) -> serde_json::Value {
        json!({ "playerData": records })
    }

    fn seeded_store(records: serde_json::Value) -> (RosterStore, Broadcaster) {
        let store = RosterStore::new();
        let broadcaster = Broadcaster::new();
        services::sync::replace_roster(&store, &broadcaster, &sync_payload(records)).unwrap();
        (store, broadcaster)
    }

    #[test]
    fn test_store_replace_swaps_whole_snapshot() {
        let store = RosterStore::new();
        assert!(store.read().players.is_empty());

        let before = store.read().last_update;
        store.replace(vec![coerce::player_record(&json!({ "userId": "Ace" }))]);
        let snapshot = store.read();
        assert_eq!(snapshot.players.len(), 1);
        assert!(snapshot.last_update >= before);

        store.replace(Vec::new());
        assert!(store.read().players.is_empty());
    }

    #[test]
    fn test_coercion_fills_defaults() {
        let player = coerce::player_record(&json!({}));
        assert_eq!(player.user_id, "");
        assert!(!player.counter_spin);
        assert_eq!(player.wins, 0);
        assert_eq!(player.spinner_id, "default");
        assert_eq!(player.bits, 0);
        assert_eq!(player.clan, "");
        assert!(player.unlocks.is_empty());
    }

    #[test]
    fn test_coercion_stringifies_loose_fields() {
        let player = coerce::player_record(&json!({
            "userId": "Ace",
            "clan": 42,
            "wins": "7",
            "bits": 3.9,
            "counterSpin": "yes",
            "unlocks": ["gold", 1, true],
        }));
        assert_eq!(player.clan, "42");
        assert_eq!(player.wins, 7);
        assert_eq!(player.bits, 3);
        assert!(!player.counter_spin, "non-boolean counterSpin coerces to false");
        assert_eq!(player.unlocks, vec!["gold", "1", "true"]);
    }

    #[test]
    fn test_coercion_never_rejects_a_record() {
        let player = coerce::player_record(&json!({
            "userId": { "nested": true },
            "wins": null,
            "unlocks": "+a+b",
        }));
        assert_eq!(player.user_id, "");
        assert_eq!(player.wins, 0);
        assert!(player.unlocks.is_empty());
    }

    #[test]
    fn test_api_key_exact_match_only() {
        assert!(services::sync::check_api_key("secret", Some("secret")).is_ok());
        assert!(matches!(
            services::sync::check_api_key("secret", Some("Secret")),
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            services::sync::check_api_key("secret", None),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_sync_replaces_roster_in_order() {
        let (store, broadcaster) = seeded_store(json!([
            { "userId": "Ace", "bits": 100 },
            { "userId": "Bop", "bits": 50 },
        ]));

        let snapshot = store.read();
        assert_eq!(snapshot.players.len(), 2);
        assert_eq!(snapshot.players[0].user_id, "Ace");
        assert_eq!(snapshot.players[1].user_id, "Bop");

        let result = services::sync::replace_roster(
            &store,
            &broadcaster,
            &sync_payload(json!([{ "userId": "Solo" }])),
        )
        .unwrap();
        assert!(result.success);
        assert_eq!(result.player_count, 1);
        assert!(result.timestamp.ends_with('Z'));
        assert_eq!(store.read().players[0].user_id, "Solo");
    }

    #[test]
    fn test_sync_is_idempotent() {
        let records = json!([
            { "userId": "Ace", "bits": 100, "wins": 3 },
            { "userId": "Bop", "bits": 100, "wins": 1 },
        ]);
        let store = RosterStore::new();
        let broadcaster = Broadcaster::new();

        services::sync::replace_roster(&store, &broadcaster, &sync_payload(records.clone()))
            .unwrap();
        let first = store.read().players;
        let first_board = services::roster::leaderboard(&store, SortKey::Bits, None);

        services::sync::replace_roster(&store, &broadcaster, &sync_payload(records)).unwrap();
        assert_eq!(store.read().players, first);
        assert_eq!(
            services::roster::leaderboard(&store, SortKey::Bits, None),
            first_board
        );
    }

    #[test]
    fn test_sync_rejects_non_array_payload_without_touching_store() {
        let (store, broadcaster) = seeded_store(json!([{ "userId": "Ace" }]));
        let before = store.read().players;

        for bad in [json!({ "playerData": "nope" }), json!({}), json!({ "playerData": 7 })] {
            let err = services::sync::replace_roster(&store, &broadcaster, &bad).unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)));
        }
        assert_eq!(store.read().players, before);
    }

    #[test]
    fn test_duplicate_user_ids_are_kept_verbatim() {
        let (store, _) = seeded_store(json!([
            { "userId": "Ace", "bits": 1 },
            { "userId": "Ace", "bits": 2 },
        ]));
        assert_eq!(store.read().players.len(), 2);

        // first match wins
        let found = services::roster::find_player(&store, "ACE").unwrap();
        assert_eq!(found.bits, 1);
    }

    #[test]
    fn test_failed_auth_leaves_roster_untouched() {
        let (store, broadcaster) = seeded_store(json!([{ "userId": "Ace" }]));
        let before = store.read().players;

        // handler sequence: key check gates the replace
        let attempt = services::sync::check_api_key("secret", Some("wrong")).and_then(|_| {
            services::sync::replace_roster(&store, &broadcaster, &sync_payload(json!([])))
        });
        assert!(matches!(attempt, Err(AppError::Unauthorized)));
        assert_eq!(store.read().players, before);
    }

    #[test]
    fn test_player_lookup_is_case_insensitive() {
        let (store, _) = seeded_store(json!([{ "userId": "Ace", "wins": 3, "bits": 100 }]));

        let found = services::roster::find_player(&store, "ace").unwrap();
        assert_eq!(found.user_id, "Ace");
        assert!(matches!(
            services::roster::find_player(&store, "nobody"),
            Err(AppError::NotFound(_))
        ));

        let top = services::roster::leaderboard(&store, SortKey::Wins, Some(1));
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].rank, 1);
        assert_eq!(top[0].player.user_id, "Ace");
    }

    #[test]
    fn test_leaderboard_sorts_stable_and_truncates() {
        let (store, _) = seeded_store(json!([
            { "userId": "low", "bits": 10, "wins": 9 },
            { "userId": "tie-a", "bits": 50, "wins": 1 },
            { "userId": "tie-b", "bits": 50, "wins": 2 },
            { "userId": "high", "bits": 90, "wins": 0 },
        ]));

        let board = services::roster::leaderboard(&store, SortKey::Bits, None);
        let order: Vec<&str> = board.iter().map(|e| e.player.user_id.as_str()).collect();
        assert_eq!(order, vec!["high", "tie-a", "tie-b", "low"]);
        assert_eq!(board[0].rank, 1);

        let top = services::roster::leaderboard(&store, SortKey::Wins, Some(1));
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].player.user_id, "low");
        assert_eq!(top[0].rank, 1);
    }

    #[test]
    fn test_status_reports_count_and_timestamp() {
        let (store, _) = seeded_store(json!([{ "userId": "Ace" }, { "userId": "Bop" }]));
        let status = services::roster::status(&store);
        assert!(status.connected);
        assert_eq!(status.player_count, 2);
        assert!(status.last_update.ends_with('Z'));
    }

    #[test]
    fn test_subscriber_receives_snapshot_on_subscribe() {
        let (store, broadcaster) = seeded_store(json!([{ "userId": "Ace" }]));

        let snapshot = store.read();
        let mut rx = broadcaster.subscribe(shared::PushMessage::roster_update(
            snapshot.players,
            snapshot.last_update,
        ));

        let initial = rx.try_recv().unwrap();
        assert_eq!(initial.kind, PushEvent::PlayersUpdate);
        assert_eq!(initial.data.len(), 1);
        assert_eq!(initial.data[0].user_id, "Ace");
    }

    #[test]
    fn test_late_subscriber_sees_only_latest_sync() {
        let store = RosterStore::new();
        let broadcaster = Broadcaster::new();
        services::sync::replace_roster(
            &store,
            &broadcaster,
            &sync_payload(json!([{ "userId": "old" }])),
        )
        .unwrap();
        services::sync::replace_roster(
            &store,
            &broadcaster,
            &sync_payload(json!([{ "userId": "new" }])),
        )
        .unwrap();

        let snapshot = store.read();
        let mut rx = broadcaster.subscribe(shared::PushMessage::roster_update(
            snapshot.players,
            snapshot.last_update,
        ));

        let initial = rx.try_recv().unwrap();
        assert_eq!(initial.data[0].user_id, "new");
        assert!(rx.try_recv().is_err(), "no stale snapshots queued");
    }

    #[test]
    fn test_sync_pushes_update_to_subscribers() {
        let store = RosterStore::new();
        let broadcaster = Broadcaster::new();
        let snapshot = store.read();
        let mut rx = broadcaster.subscribe(shared::PushMessage::roster_update(
            snapshot.players,
            snapshot.last_update,
        ));
        let _ = rx.try_recv().unwrap(); // drain the empty initial snapshot

        services::sync::replace_roster(
            &store,
            &broadcaster,
            &sync_payload(json!([{ "userId": "Ace", "bits": 100 }])),
        )
        .unwrap();

        let pushed = rx.try_recv().unwrap();
        assert_eq!(pushed.data.len(), 1);
        assert_eq!(pushed.data[0].bits, 100);
    }

    #[test]
    fn test_disconnected_subscribers_are_pruned() {
        let store = RosterStore::new();
        let broadcaster = Broadcaster::new();
        let snapshot = store.read();
        let rx = broadcaster.subscribe(shared::PushMessage::roster_update(
            snapshot.players,
            snapshot.last_update,
        ));
        assert_eq!(broadcaster.subscriber_count(), 1);

        drop(rx);
        let reached = broadcaster.publish(&shared::PushMessage::roster_update(
            Vec::new(),
            chrono::Utc::now(),
        ));
        assert_eq!(reached, 0);
        assert_eq!(broadcaster.subscriber_count(), 0);
    }
}
