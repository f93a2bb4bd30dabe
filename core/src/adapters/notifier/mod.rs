//! Outbound notification adapters.
//!
//! Events leave the capture pipeline through a bounded queue and are
//! delivered best-effort by a background task.

mod http;
mod queue;

pub use http::HttpDelivery;
pub use queue::QueuedNotifier;
