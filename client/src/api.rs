use crate::connection::{Backend, BackendError, Subscription};
use futures::StreamExt;
use log::{debug, warn};
use ntex::http::client::Client;
use shared::{Player, PushMessage, ServerStatus};
use std::time::Duration;
use tokio::sync::mpsc;

// Matches the server's sync body limit; rosters are small but not tiny.
const BODY_LIMIT: usize = 5 * 1024 * 1024;

/// `Backend` over the REST + SSE surface of the leaderboard server.
pub struct HttpBackend {
    base_url: String,
    client: Client,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Self {
        HttpBackend {
            base_url: base_url.trim_end_matches('/').to_string(),
            // Probe deadlines are enforced by the connection manager; the
            // client-level timeout only bounds the response head.
            client: Client::build().timeout(Duration::from_secs(60)).finish(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Backend for HttpBackend {
    async fn probe(&self) -> Result<ServerStatus, BackendError> {
        let mut resp = self
            .client
            .get(self.url("/api/status"))
            .send()
            .await
            .map_err(|e| BackendError::Unreachable(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(BackendError::BadStatus(resp.status().as_u16()));
        }
        resp.json::<ServerStatus>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn fetch_players(&self) -> Result<Vec<Player>, BackendError> {
        let mut resp = self
            .client
            .get(self.url("/api/players"))
            .send()
            .await
            .map_err(|e| BackendError::Unreachable(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(BackendError::BadStatus(resp.status().as_u16()));
        }
        resp.json::<Vec<Player>>()
            .limit(BODY_LIMIT)
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn subscribe(&self) -> Result<Subscription, BackendError> {
        let resp = self
            .client
            .get(self.url("/api/events"))
            .send()
            .await
            .map_err(|e| BackendError::Unreachable(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(BackendError::BadStatus(resp.status().as_u16()));
        }

        let (tx, rx) = mpsc::channel(16);
        ntex::rt::spawn(async move {
            let mut resp = resp;
            let mut buffer = String::new();
            while let Some(chunk) = resp.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(err) => {
                        warn!("[Push] Stream error: {}", err);
                        break;
                    }
                };
                buffer.push_str(&String::from_utf8_lossy(&chunk));
                while let Some(end) = buffer.find("\n\n") {
                    let frame: String = buffer.drain(..end + 2).collect();
                    if let Some(message) = parse_event(&frame) {
                        if tx.send(message).await.is_err() {
                            // subscription dropped client-side
                            return;
                        }
                    }
                }
            }
            debug!("[Push] Stream closed");
        });

        Ok(Subscription { rx })
    }
}

/// Decode one SSE frame. Frames that are not a `data:` payload (comments,
/// keep-alives) or that fail to decode are skipped.
fn parse_event(frame: &str) -> Option<PushMessage> {
    let data = frame
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(str::trim_start)
        .collect::<Vec<_>>()
        .join("\n");
    if data.is_empty() {
        return None;
    }
    match serde_json::from_str(&data) {
        Ok(message) => Some(message),
        Err(err) => {
            warn!("[Push] Undecodable event: {}", err);
            None
        }
    }
}
