//! Windows introspection using tasklist and netstat.

use std::process::Stdio;

use tokio::process::Command;

use crate::error::{Error, Result};

use super::utils::Utils;
use super::Introspector;

/// Windows-specific process introspector.
pub struct WindowsIntrospector;

impl WindowsIntrospector {
    pub fn new() -> Self {
        Self
    }

    async fn run(&self, program: &str, args: &[&str]) -> Result<String> {
        let output = Command::new(program)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| Error::CommandFailed(format!("Failed to run {}: {}", program, e)))?;

        let stdout = Utils::successful_stdout(program, output)?;
        // Console code pages are not always UTF-8
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

impl Default for WindowsIntrospector {
    fn default() -> Self {
        Self::new()
    }
}

impl Introspector for WindowsIntrospector {
    async fn list_process_ids(&self, name: &str) -> Result<Vec<u32>> {
        let stdout = self.run("tasklist", &["/FO", "CSV", "/NH"]).await?;
        Ok(Utils::parse_tasklist_output(&stdout, name))
    }

    async fn list_udp_ports(&self, pid: u32) -> Result<Vec<u16>> {
        let stdout = self.run("netstat", &["-ano", "-p", "udp"]).await?;
        Ok(Utils::parse_netstat_udp_output(&stdout, pid))
    }
}
