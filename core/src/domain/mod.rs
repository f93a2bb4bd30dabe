//! Domain layer - Pure data models and payload parsing.
//!
//! This module contains domain entities that represent core concepts.
//! These types have no I/O dependencies and can be tested in isolation.

mod identity;
mod packet;
pub mod payload;
mod port_set;

// Re-export all domain types
pub use identity::{DecodedIdentity, HistoryEntry, LobbyEntry, LobbyEvent, Sighting};
pub use packet::{CapturedPacket, LinkType, UdpDatagram};
pub use port_set::{PortSetTransition, TargetPortSet};

#[cfg(test)]
pub(crate) mod fixtures {
    pub use super::packet::fixtures::*;
    pub use super::payload::fixtures::*;
}
