//! LobbyWatch Core Library
//!
//! Watches a game client's UDP lobby traffic and turns player
//! announcements into identity sightings. Provides functionality to:
//! - Resolve the UDP ports bound by the game process
//! - Filter captured traffic down to plausible lobby payloads
//! - Decode player name, country, device id and user id
//! - Notify a collaborator of sightings and lobby resets
//! - Record sightings and link devices to accounts
//!
//! # Architecture
//! This library follows hexagonal architecture (ports & adapters):
//! - `domain`: Pure business logic and data models
//! - `ports`: Trait definitions (interfaces)
//! - `adapters`: External system implementations
//! - `application`: Use case services
//!
//! # Platform Support
//! - macOS: Uses `ps` and `lsof` commands
//! - Linux: Uses `ps` and `ss` commands
//! - Windows: Uses `tasklist` and `netstat` commands
//!
//! Live capture needs libpcap (Npcap on Windows) and is behind the
//! `capture` feature.

// Hexagonal architecture layers
pub mod domain;
pub mod ports;
pub mod adapters;
pub mod application;

pub mod config;
pub mod engine;
pub mod error;

// Re-export domain types (primary API)
pub use domain::{
    CapturedPacket, DecodedIdentity, HistoryEntry, LinkType, LobbyEntry, LobbyEvent, Sighting,
    TargetPortSet,
};

// Re-export other commonly used types
pub use adapters::{HttpDelivery, MemorySightingStore, ProcessIntrospector, QueuedNotifier};
pub use application::{IdentityLinker, PortResolver, SightingDispatcher, SightingIngest, TrafficFilter};
pub use config::{Config, ConfigStore, IgnoreList};
pub use engine::{EngineStats, LobbyWatchEngine};
pub use error::{Error, Result};
