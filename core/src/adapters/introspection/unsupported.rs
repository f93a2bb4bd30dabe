//! Fallback for platforms without an introspection backend.

use crate::error::{Error, Result};

use super::Introspector;

pub struct UnsupportedIntrospector;

impl Introspector for UnsupportedIntrospector {
    async fn list_process_ids(&self, _name: &str) -> Result<Vec<u32>> {
        Err(Error::UnsupportedPlatform(std::env::consts::OS.to_string()))
    }

    async fn list_udp_ports(&self, _pid: u32) -> Result<Vec<u16>> {
        Err(Error::UnsupportedPlatform(std::env::consts::OS.to_string()))
    }
}
