//! Application event channel
//!
//! Components that need to react to authorization failures reported by the
//! backend subscribe to an [`EventBus`] handed to them explicitly. A
//! [`Subscription`] stays registered for as long as it is alive; dropping it
//! unsubscribes.

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::debug;

/// Default number of events buffered per subscriber
const DEFAULT_CAPACITY: usize = 16;

/// Events published by the search client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The backend answered 403 for a request
    PermissionDenied { message: String },
    /// The backend answered 401; credentials must be renewed
    SessionExpired,
}

/// Single-topic publish/subscribe channel
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AppEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an event, returning how many subscribers will see it
    ///
    /// Publishing with no subscribers is not an error; the event is dropped.
    pub fn publish(&self, event: AppEvent) -> usize {
        match self.tx.send(event) {
            Ok(n) => n,
            Err(broadcast::error::SendError(event)) => {
                debug!("No subscribers for {:?}", event);
                0
            }
        }
    }

    /// Register a new subscriber
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
        }
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Handle to a registration on an [`EventBus`]
#[derive(Debug)]
pub struct Subscription {
    rx: broadcast::Receiver<AppEvent>,
}

impl Subscription {
    /// Wait for the next event; `None` once every publisher is gone
    ///
    /// Events missed because the subscriber fell behind are skipped.
    pub async fn recv(&mut self) -> Option<AppEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    debug!("Subscriber lagged, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next pending event without waiting
    pub fn try_recv(&mut self) -> Option<AppEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }
}
