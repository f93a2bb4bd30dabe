//! Ports layer - Trait definitions (interfaces).
//!
//! This module defines the interfaces that the application layer uses
//! to interact with external systems. Implementations live in `adapters`.

mod introspection;
mod notifier;
mod store;

pub use introspection::ProcessIntrospectorPort;
pub use notifier::{EventDeliveryPort, EventNotifierPort};
pub use store::SightingRepository;
