//! Decode command - extract a player identity from a saved payload.

use std::path::Path;

use anyhow::{Context, Result};
use lobbywatch_core::domain::payload;

pub async fn run(file: &Path, hex: bool, json: bool) -> Result<()> {
    let raw = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let bytes = if hex {
        let text: String = String::from_utf8_lossy(&raw)
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        hex::decode(text).context("Payload is not valid hex")?
    } else {
        raw
    };

    let identity = payload::decode(&bytes);

    if json {
        println!("{}", serde_json::to_string_pretty(&identity)?);
        return Ok(());
    }

    match identity {
        Some(identity) => {
            println!("Name:       {}", identity.name);
            println!("Country:    {}", identity.country);
            println!("Device id:  {}", identity.device_id);
            match identity.user_id {
                Some(user_id) => println!("User id:    {}", user_id),
                None => println!("User id:    - (missing, reported as 0)"),
            }
        }
        None => println!("No player identity in {} bytes.", bytes.len()),
    }
    Ok(())
}
