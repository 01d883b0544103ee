use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info};

use crate::error::DeliveryError;

/// Per-subscriber outbound queue depth; a full queue drops the newest message.
pub const DEFAULT_QUEUE_DEPTH: usize = 64;

/// One connected listener as seen by the fan-out loop.
pub trait Subscriber: Send + Sync {
    fn id(&self) -> &str;

    /// Whether the underlying connection still accepts messages.
    fn is_open(&self) -> bool;

    /// Hand `message` to the connection without waiting for it to be written.
    fn send(&self, message: &str) -> Result<(), DeliveryError>;
}

/// Source of the current subscriber set.
pub trait Transport: Send + Sync {
    /// Point-in-time copy of the connected subscribers. Connects and
    /// disconnects that happen after the call do not affect the returned list.
    fn subscribers(&self) -> Vec<Arc<dyn Subscriber>>;
}

/// Subscriber backed by a bounded mpsc queue drained by its connection task.
pub struct ChannelSubscriber {
    id: String,
    tx: mpsc::Sender<String>,
}

impl ChannelSubscriber {
    pub fn new(id: impl Into<String>, tx: mpsc::Sender<String>) -> Self {
        Self { id: id.into(), tx }
    }
}

impl Subscriber for ChannelSubscriber {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }

    fn send(&self, message: &str) -> Result<(), DeliveryError> {
        // try_send never blocks the tick; a full queue drops this message only.
        self.tx
            .try_send(message.to_string())
            .map_err(|e| match e {
                TrySendError::Full(_) => DeliveryError::Lagging {
                    id: self.id.clone(),
                },
                TrySendError::Closed(_) => DeliveryError::Closed {
                    id: self.id.clone(),
                },
            })
    }
}

/// Concurrent set of live connections for one stream: conn_id -> subscriber.
pub struct SubscriberRegistry {
    clients: DashMap<String, Arc<ChannelSubscriber>>,
    queue_depth: usize,
}

impl SubscriberRegistry {
    pub fn new(queue_depth: usize) -> Self {
        Self {
            clients: DashMap::new(),
            queue_depth: queue_depth.max(1),
        }
    }

    /// Register a connection and return the queue its messages arrive on.
    ///
    /// Re-using an id replaces the previous registration, closing its queue.
    pub fn connect(&self, id: impl Into<String>) -> mpsc::Receiver<String> {
        let id = id.into();
        let (tx, rx) = mpsc::channel(self.queue_depth);
        let previous = self
            .clients
            .insert(id.clone(), Arc::new(ChannelSubscriber::new(id.clone(), tx)));
        if previous.is_some() {
            debug!(conn_id = %id, "subscriber re-registered");
        }
        info!(conn_id = %id, subscribers = self.clients.len(), "subscriber connected");
        rx
    }

    /// Remove a connection. Returns false when the id was not registered.
    pub fn disconnect(&self, id: &str) -> bool {
        let removed = self.clients.remove(id).is_some();
        if removed {
            info!(conn_id = %id, subscribers = self.clients.len(), "subscriber disconnected");
        }
        removed
    }

    /// Drop every registration. Receivers still yield what was already
    /// queued, then end.
    pub fn disconnect_all(&self) -> usize {
        let count = self.clients.len();
        self.clients.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_DEPTH)
    }
}

impl Transport for SubscriberRegistry {
    fn subscribers(&self) -> Vec<Arc<dyn Subscriber>> {
        self.clients
            .iter()
            .map(|entry| Arc::clone(entry.value()) as Arc<dyn Subscriber>)
            .collect()
    }
}
