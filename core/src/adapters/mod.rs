//! Adapters layer - External system implementations.
//!
//! This module contains implementations of the port traits defined in `ports`.
//! Each adapter handles communication with external systems.

#[cfg(feature = "capture")]
pub mod capture;
pub mod introspection;
pub mod notifier;
pub mod store;

// Re-export main types for convenience
#[cfg(feature = "capture")]
pub use capture::LiveCapture;
pub use introspection::ProcessIntrospector;
pub use notifier::{HttpDelivery, QueuedNotifier};
pub use store::MemorySightingStore;
