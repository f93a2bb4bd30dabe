//! Linux introspection using ps and ss.

use std::process::Stdio;

use tokio::process::Command;

use crate::error::{Error, Result};

use super::utils::Utils;
use super::Introspector;

/// Linux-specific process introspector.
pub struct LinuxIntrospector;

impl LinuxIntrospector {
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
        String::from_utf8(stdout)
            .map_err(|e| Error::ParseError(format!("Invalid UTF-8 in {} output: {}", program, e)))
    }
}

impl Default for LinuxIntrospector {
    fn default() -> Self {
        Self::new()
    }
}

impl Introspector for LinuxIntrospector {
    async fn list_process_ids(&self, name: &str) -> Result<Vec<u32>> {
        let stdout = self
            .run("/bin/ps", &["-axo", "pid,comm", "--no-headers"])
            .await?;
        Ok(Utils::parse_ps_output(&stdout, name))
    }

    async fn list_udp_ports(&self, pid: u32) -> Result<Vec<u16>> {
        // -a: connected UDP sockets are not "listening"
        let stdout = self.run("ss", &["-Huanp"]).await?;
        Ok(Utils::parse_ss_udp_output(&stdout, pid))
    }
}
