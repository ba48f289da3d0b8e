use log::{debug, warn};
use shared::PushMessage;
use std::sync::Mutex;
use tokio::sync::mpsc;
use uuid::Uuid;

// Updates queued per subscriber before we start dropping on the floor.
const SUBSCRIBER_BUFFER: usize = 16;

struct Subscriber {
    id: Uuid,
    tx: mpsc::Sender<PushMessage>,
}

/// Registry of push subscribers. Delivery is best effort: a full buffer loses
/// that update for that subscriber, a closed channel drops the subscriber.
/// Publishing never blocks the sync request.
pub struct Broadcaster {
    subscribers: Mutex<Vec<Subscriber>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Broadcaster {
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Register a subscriber and queue `initial` so late joiners get the
    /// current roster without waiting for the next sync.
    pub fn subscribe(&self, initial: PushMessage) -> mpsc::Receiver<PushMessage> {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        let id = Uuid::new_v4();
        let _ = tx.try_send(initial);
        debug!("[Broadcast] Subscriber connected: {}", id);
        self.subscribers.lock().unwrap().push(Subscriber { id, tx });
        rx
    }

    /// Push `message` to every live subscriber, pruning the disconnected.
    /// Returns the number of subscribers still registered.
    pub fn publish(&self, message: &PushMessage) -> usize {
        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers.retain(|sub| match sub.tx.try_send(message.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("[Broadcast] Subscriber {} lagging, update dropped", sub.id);
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("[Broadcast] Subscriber disconnected: {}", sub.id);
                false
            }
        });
        subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}
