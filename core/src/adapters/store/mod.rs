//! Sighting store adapters.

mod memory;

pub use memory::MemorySightingStore;
