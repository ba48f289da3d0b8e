//! Connection lifecycle against the leaderboard backend. The backend may be
//! cold-starting, so reachability is probed in two stages before giving up:
//! a short probe first, then a single much longer one.

use log::{info, warn};
use shared::{Player, PushMessage, ServerStatus};
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Waking,
    Connected,
    Error,
}

#[derive(Debug, Clone)]
pub struct ProbeTiming {
    pub short: Duration,
    pub long: Duration,
}

impl Default for ProbeTiming {
    fn default() -> Self {
        ProbeTiming {
            short: Duration::from_secs(5),
            // Free-tier hosts can take the better part of a minute to wake
            long: Duration::from_secs(45),
        }
    }
}

#[derive(Debug)]
pub enum BackendError {
    Unreachable(String),
    BadStatus(u16),
    Decode(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Unreachable(msg) => write!(f, "backend unreachable: {}", msg),
            BackendError::BadStatus(code) => write!(f, "backend answered with status {}", code),
            BackendError::Decode(msg) => write!(f, "undecodable response: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

/// An open push subscription. Dropping it closes the subscription; the
/// transport side stops as soon as its sender fails.
pub struct Subscription {
    pub rx: mpsc::Receiver<PushMessage>,
}

#[allow(async_fn_in_trait)]
pub trait Backend {
    async fn probe(&self) -> Result<ServerStatus, BackendError>;
    async fn fetch_players(&self) -> Result<Vec<Player>, BackendError>;
    async fn subscribe(&self) -> Result<Subscription, BackendError>;
}

/// Owns the connection state machine and the mirrored roster. At most one
/// subscription is open at a time; `connect` tears down the previous one
/// before probing again.
pub struct ConnectionManager<B: Backend> {
    backend: B,
    timing: ProbeTiming,
    state: ConnectionState,
    players: Vec<Player>,
    last_update: Option<String>,
    subscription: Option<Subscription>,
}

impl<B: Backend> ConnectionManager<B> {
    pub fn new(backend: B) -> Self {
        Self::with_timing(backend, ProbeTiming::default())
    }

    pub fn with_timing(backend: B, timing: ProbeTiming) -> Self {
        ConnectionManager {
            backend,
            timing,
            state: ConnectionState::Connecting,
            players: Vec::new(),
            last_update: None,
            subscription: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn last_update(&self) -> Option<&str> {
        self.last_update.as_deref()
    }

    /// Run the staged handshake: short probe, long "waking" probe, then the
    /// push subscription plus one REST fetch in case the first push is slow.
    pub async fn connect(&mut self) -> ConnectionState {
        self.subscription = None;
        self.state = ConnectionState::Connecting;

        if !self.probe(self.timing.short).await {
            info!("[Client] Server not answering, assuming cold start");
            self.state = ConnectionState::Waking;
            if !self.probe(self.timing.long).await {
                self.state = ConnectionState::Error;
                return self.state;
            }
        }
        self.state = ConnectionState::Connected;

        match self.backend.subscribe().await {
            Ok(subscription) => self.subscription = Some(subscription),
            Err(err) => {
                warn!("[Client] Subscription failed: {}", err);
                self.state = ConnectionState::Error;
                return self.state;
            }
        }

        match self.backend.fetch_players().await {
            Ok(players) => self.players = players,
            Err(err) => warn!("[Client] Initial roster fetch failed: {}", err),
        }

        self.state
    }

    /// Explicit user-triggered retry; the only way out of `Error`.
    pub async fn retry(&mut self) -> ConnectionState {
        self.connect().await
    }

    /// Replace the mirrored roster. Applies in every connection state.
    pub fn apply_update(&mut self, message: PushMessage) {
        self.players = message.data;
        self.last_update = Some(message.timestamp);
    }

    /// Await the next pushed roster. `None` means the subscription is gone
    /// (never opened, or the stream ended) and the machine is in `Error`.
    pub async fn next_update(&mut self) -> Option<PushMessage> {
        let subscription = self.subscription.as_mut()?;
        match subscription.rx.recv().await {
            Some(message) => Some(message),
            None => {
                self.subscription = None;
                self.state = ConnectionState::Error;
                None
            }
        }
    }

    async fn probe(&self, deadline: Duration) -> bool {
        match time::timeout(deadline, self.backend.probe()).await {
            Ok(Ok(_)) => true,
            Ok(Err(err)) => {
                warn!("[Client] Status probe failed: {}", err);
                false
            }
            Err(_) => {
                warn!("[Client] Status probe timed out after {:?}", deadline);
                false
            }
        }
    }
}
