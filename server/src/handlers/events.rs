use crate::broadcast::Broadcaster;
use crate::store::RosterStore;
use ntex::util::Bytes;
use ntex::web::{self, HttpResponse};
use shared::PushMessage;
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Server-sent events: one `data:` frame per roster replacement, preceded by
/// a frame with the current snapshot so new subscribers start synchronized.
pub async fn subscribe(
    store: web::types::State<Arc<RosterStore>>,
    broadcaster: web::types::State<Arc<Broadcaster>>,
) -> HttpResponse {
    let snapshot = store.read();
    let initial = PushMessage::roster_update(snapshot.players, snapshot.last_update);
    let rx = broadcaster.subscribe(initial);

    let events = Box::pin(futures::stream::unfold(
        rx,
        |mut rx: mpsc::Receiver<PushMessage>| async move {
            let message = rx.recv().await?;
            Some((encode_event(&message), rx))
        },
    ));

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .header("cache-control", "no-cache")
        .streaming(events)
}

fn encode_event(message: &PushMessage) -> Result<Bytes, io::Error> {
    let json = serde_json::to_string(message)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(Bytes::from(format!("data: {}\n\n", json).into_bytes()))
}
