//! Bounded, drop-on-failure notifier queue.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::domain::LobbyEvent;
use crate::ports::{EventDeliveryPort, EventNotifierPort};

/// Notifier that queues events for a background delivery task.
///
/// `notify` never blocks: when the queue is full or the delivery task is
/// gone the event is dropped. Delivery errors are logged and discarded.
pub struct QueuedNotifier {
    tx: mpsc::Sender<LobbyEvent>,
    dropped: Arc<AtomicU64>,
}

impl QueuedNotifier {
    /// Spawn the delivery task on the current runtime.
    ///
    /// The task ends once every `QueuedNotifier` handle has been dropped
    /// and the queue is drained.
    pub fn spawn<D: EventDeliveryPort>(delivery: D, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<LobbyEvent>(capacity.max(1));
        let dropped = Arc::new(AtomicU64::new(0));

        let failures = dropped.clone();
        let handle = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let Err(e) = delivery.deliver(event).await {
                    failures.fetch_add(1, Ordering::Relaxed);
                    debug!(error = %e, "Notification dropped");
                }
            }
        });

        (Self { tx, dropped }, handle)
    }

    /// Events that were dropped, either at the queue or during delivery.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl EventNotifierPort for QueuedNotifier {
    fn notify(&self, event: LobbyEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!(?event, "Notification queue full, dropping event");
            }
            Err(TrySendError::Closed(event)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!(?event, "Notification queue closed, dropping event");
            }
        }
    }
}
