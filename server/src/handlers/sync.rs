use crate::broadcast::Broadcaster;
use crate::config::Config;
use crate::error::AppError;
use crate::services::sync as service;
use crate::store::RosterStore;
use log::warn;
use ntex::web::{self, HttpRequest, HttpResponse};
use std::sync::Arc;

pub async fn sync_roster(
    req: HttpRequest,
    config: web::types::State<Arc<Config>>,
    store: web::types::State<Arc<RosterStore>>,
    broadcaster: web::types::State<Arc<Broadcaster>>,
    body: web::types::Json<serde_json::Value>,
) -> Result<HttpResponse, AppError> {
    let provided = req
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok());
    if let Err(err) = service::check_api_key(&config.sync_api_key, provided) {
        warn!("[Sync] Rejected - invalid API key");
        return Err(err);
    }

    let result = service::replace_roster(&store, &broadcaster, &body.into_inner())?;
    Ok(HttpResponse::Ok().json(&result))
}
