//! Application layer - Use case services.
//!
//! This module contains application services that orchestrate
//! domain logic and adapter interactions.
//!
//! Services are designed to be thin orchestrators that:
//! - Accept domain types as inputs
//! - Use ports (traits) for external dependencies
//! - Return domain types as outputs

mod dispatcher;
mod ingest;
mod linker;
pub(crate) mod port_resolver;
mod traffic_filter;

pub use dispatcher::SightingDispatcher;
pub use ingest::{IngestOutcome, SightingIngest};
pub use linker::{IdentityLinker, LinkReport, MAX_LINK_DEPTH};
pub use port_resolver::{PortResolver, DEFAULT_REFRESH_INTERVAL_SECS};
pub use traffic_filter::{PayloadBounds, TrafficFilter, MAX_PAYLOAD_LEN, MIN_PAYLOAD_LEN};
