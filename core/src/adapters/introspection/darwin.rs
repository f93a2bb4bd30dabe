//! macOS introspection using ps and lsof.

use std::process::Stdio;

use tokio::process::Command;

use crate::error::{Error, Result};

use super::utils::Utils;
use super::Introspector;

/// macOS-specific process introspector.
pub struct DarwinIntrospector;

impl DarwinIntrospector {
    /// Create a new macOS introspector.
    pub fn new() -> Self {
        Self
    }
}

impl Default for DarwinIntrospector {
    fn default() -> Self {
        Self::new()
    }
}

impl Introspector for DarwinIntrospector {
    async fn list_process_ids(&self, name: &str) -> Result<Vec<u32>> {
        let output = Command::new("/bin/ps")
            .args(["-axo", "pid,comm"])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| Error::CommandFailed(format!("Failed to run ps: {}", e)))?;

        let stdout = Utils::successful_stdout("ps", output)?;
        let stdout = String::from_utf8(stdout)
            .map_err(|e| Error::ParseError(format!("Invalid UTF-8 in ps output: {}", e)))?;

        Ok(Utils::parse_ps_output(&stdout, name))
    }

    async fn list_udp_ports(&self, pid: u32) -> Result<Vec<u16>> {
        let pid = pid.to_string();
        let output = Command::new("/usr/sbin/lsof")
            .args(["-nP", "-a", "-p", pid.as_str(), "-iUDP"])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| Error::CommandFailed(format!("Failed to run lsof: {}", e)))?;

        // lsof exits non-zero when the pid has no UDP sockets
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(Utils::parse_lsof_udp_output(&stdout))
    }
}
