//! Ports command - show the UDP ports bound by the game process.

use anyhow::Result;
use lobbywatch_core::ports::ProcessIntrospectorPort;
use lobbywatch_core::{ConfigStore, ProcessIntrospector};
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProcessPorts {
    pid: u32,
    udp_ports: Vec<u16>,
}

pub async fn run(process: Option<String>, json: bool) -> Result<()> {
    let config = ConfigStore::new()?.load().await?;
    let process_name = process.unwrap_or(config.process_name);

    let introspector = ProcessIntrospector::new();
    let mut rows = Vec::new();
    for pid in introspector.list_process_ids(&process_name).await? {
        let mut udp_ports = introspector.list_udp_ports(pid).await?;
        udp_ports.sort_unstable();
        udp_ports.dedup();
        rows.push(ProcessPorts { pid, udp_ports });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No process named {} is running.", process_name);
        return Ok(());
    }

    println!("{:<8} UDP PORTS", "PID");
    println!("{}", "-".repeat(40));

    for row in &rows {
        let ports: Vec<String> = row.udp_ports.iter().map(u16::to_string).collect();
        let ports = if ports.is_empty() {
            "-".to_string()
        } else {
            ports.join(", ")
        };
        println!("{:<8} {}", row.pid, ports);
    }

    println!("\nTotal: {} processes", rows.len());
    Ok(())
}
