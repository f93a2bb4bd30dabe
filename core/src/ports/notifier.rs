//! Event notification ports (interfaces).

use crate::domain::LobbyEvent;
use crate::error::Result;

/// Port for emitting lobby events from the capture pipeline.
///
/// Notification is fire-and-forget: implementations must not block the
/// caller and must not report delivery failures back to it.
pub trait EventNotifierPort: Send + Sync {
    /// Hand an event off for delivery.
    fn notify(&self, event: LobbyEvent);
}

/// Port for delivering a single event to the collaborator.
///
/// Called from the background side of a notifier queue. Errors are
/// logged by the caller and never retried.
pub trait EventDeliveryPort: Send + Sync + 'static {
    /// Deliver one event.
    fn deliver(&self, event: LobbyEvent) -> impl std::future::Future<Output = Result<()>> + Send;
}

impl<T: EventNotifierPort> EventNotifierPort for std::sync::Arc<T> {
    fn notify(&self, event: LobbyEvent) {
        (**self).notify(event)
    }
}

impl<T: EventDeliveryPort> EventDeliveryPort for std::sync::Arc<T> {
    fn deliver(&self, event: LobbyEvent) -> impl std::future::Future<Output = Result<()>> + Send {
        (**self).deliver(event)
    }
}
