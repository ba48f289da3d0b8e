use crate::error::AppError;
use crate::models::roster::LeaderboardQuery;
use crate::services::roster as service;
use crate::store::RosterStore;
use ntex::web::{self, HttpResponse};
use shared::SortKey;
use std::sync::Arc;

pub async fn get_players(store: web::types::State<Arc<RosterStore>>) -> HttpResponse {
    HttpResponse::Ok().json(&store.read().players)
}

pub async fn get_player(
    store: web::types::State<Arc<RosterStore>>,
    path: web::types::Path<String>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    let player = service::find_player(&store, &user_id)?;
    Ok(HttpResponse::Ok().json(&player))
}

pub async fn get_leaderboard(
    store: web::types::State<Arc<RosterStore>>,
    query: web::types::Query<LeaderboardQuery>,
) -> HttpResponse {
    let sort_by = query
        .sort_by
        .as_deref()
        .map(SortKey::parse)
        .unwrap_or_default();
    let entries = service::leaderboard(&store, sort_by, query.limit);
    HttpResponse::Ok().json(&entries)
}

pub async fn get_status(store: web::types::State<Arc<RosterStore>>) -> HttpResponse {
    HttpResponse::Ok().json(&service::status(&store))
}
