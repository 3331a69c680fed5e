//! Live observer set and broadcast.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use crate::metrics::{
    NOTIFICATIONS_DELIVERED, OBSERVERS_DROPPED, OBSERVERS_REGISTERED, RELAY_MESSAGES_SKIPPED,
};

/// Handle returned by [`ObserverRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "observer-{}", self.0)
    }
}

/// Sending half of one observer's outbound queues.
///
/// Job notifications and relayed client messages travel on separate queues,
/// so client chatter can never fill the queue job notifications depend on.
#[derive(Debug)]
pub struct ObserverConnection {
    tx: mpsc::Sender<Arc<str>>,
    relay_tx: Option<mpsc::Sender<Arc<str>>>,
}

impl ObserverConnection {
    /// Creates a connection with a bounded queue of `buffer` messages.
    ///
    /// The receiver is drained by whatever owns the transport (a WebSocket
    /// writer task, or a test). The connection does not take part in
    /// [`ObserverRegistry::relay`].
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<Arc<str>>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self { tx, relay_tx: None }, rx)
    }

    /// Like [`channel`](Self::channel), plus a second queue of the same size
    /// for relayed client messages. Returns the notification receiver first.
    pub fn with_relay(
        buffer: usize,
    ) -> (Self, mpsc::Receiver<Arc<str>>, mpsc::Receiver<Arc<str>>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let (relay_tx, relay_rx) = mpsc::channel(buffer.max(1));
        (
            Self {
                tx,
                relay_tx: Some(relay_tx),
            },
            rx,
            relay_rx,
        )
    }
}

#[derive(Debug, Clone, Copy)]
enum DropReason {
    Full,
    Closed,
}

impl DropReason {
    fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Closed => "closed",
        }
    }
}

/// The set of currently connected observers.
///
/// Broadcasts hold the read lock while queueing, so once [`unregister`]
/// returns no later delivery reaches the removed observer. Queueing never
/// waits: an observer whose queue is full or closed is dropped from the set
/// and the rest still receive the message.
///
/// [`unregister`]: ObserverRegistry::unregister
#[derive(Debug, Default)]
pub struct ObserverRegistry {
    observers: RwLock<HashMap<ObserverId, ObserverConnection>>,
    next_id: AtomicU64,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, connection: ObserverConnection) -> ObserverId {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.observers.write().await.insert(id, connection);
        OBSERVERS_REGISTERED.inc();
        debug!(observer = %id, "Observer registered");
        id
    }

    /// Removes an observer. Returns `false` if it was already gone.
    pub async fn unregister(&self, id: ObserverId) -> bool {
        let removed = self.observers.write().await.remove(&id).is_some();
        if removed {
            OBSERVERS_REGISTERED.dec();
            debug!(observer = %id, "Observer unregistered");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.observers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.observers.read().await.is_empty()
    }

    /// Serializes `message` once and queues it to every observer.
    ///
    /// Returns the number of observers it was queued to.
    pub async fn broadcast<T: Serialize>(&self, message: &T) -> usize {
        match serde_json::to_string(message) {
            Ok(json) => self.broadcast_raw(json).await,
            Err(e) => {
                error!("Failed to serialize notification: {}", e);
                0
            }
        }
    }

    /// Queues an already-encoded payload to every observer.
    pub async fn broadcast_raw(&self, payload: impl Into<Arc<str>>) -> usize {
        let payload: Arc<str> = payload.into();
        let mut delivered = 0;
        let mut failed = Vec::new();

        {
            let observers = self.observers.read().await;
            for (id, connection) in observers.iter() {
                match connection.tx.try_send(Arc::clone(&payload)) {
                    Ok(()) => delivered += 1,
                    Err(TrySendError::Full(_)) => failed.push((*id, DropReason::Full)),
                    Err(TrySendError::Closed(_)) => failed.push((*id, DropReason::Closed)),
                }
            }
        }

        NOTIFICATIONS_DELIVERED.inc_by(delivered as u64);
        self.evict(failed).await;
        delivered
    }

    /// Queues a client-originated payload to every observer with a relay queue.
    ///
    /// Lossy: an observer whose relay queue is full misses the message but
    /// stays registered. Only a closed connection is dropped.
    pub async fn relay(&self, payload: impl Into<Arc<str>>) -> usize {
        let payload: Arc<str> = payload.into();
        let mut delivered = 0;
        let mut closed = Vec::new();

        {
            let observers = self.observers.read().await;
            for (id, connection) in observers.iter() {
                let Some(relay_tx) = &connection.relay_tx else {
                    continue;
                };
                match relay_tx.try_send(Arc::clone(&payload)) {
                    Ok(()) => delivered += 1,
                    Err(TrySendError::Full(_)) => RELAY_MESSAGES_SKIPPED.inc(),
                    Err(TrySendError::Closed(_)) => closed.push((*id, DropReason::Closed)),
                }
            }
        }

        self.evict(closed).await;
        delivered
    }

    async fn evict(&self, failed: Vec<(ObserverId, DropReason)>) {
        if failed.is_empty() {
            return;
        }
        let mut observers = self.observers.write().await;
        for (id, reason) in failed {
            if observers.remove(&id).is_some() {
                OBSERVERS_REGISTERED.dec();
                OBSERVERS_DROPPED.with_label_values(&[reason.as_str()]).inc();
                warn!(observer = %id, reason = reason.as_str(), "Dropping observer after failed delivery");
            }
        }
    }
}
