//! Config command - show or change the configuration.

use anyhow::Result;
use lobbywatch_core::{ConfigStore, IgnoreList};

pub async fn set_process(name: &str) -> Result<()> {
    ConfigStore::new()?.set_process_name(name).await?;
    println!("Watching process {}", name);
    Ok(())
}

pub async fn set_notify_url(url: &str) -> Result<()> {
    ConfigStore::new()?.set_notify_url(url).await?;
    println!("Notifying {}", url);
    Ok(())
}

pub async fn show(json: bool) -> Result<()> {
    let store = ConfigStore::new()?;
    let config = store.load().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    println!("Config file:        {}", store.config_path().display());
    println!("Process name:       {}", config.process_name);
    println!("Port refresh:       {}s", config.port_refresh_interval_secs);
    println!(
        "Payload size:       {}..={} bytes",
        config.min_payload_len, config.max_payload_len
    );
    println!("Notify URL:         {}", config.notify_url);
    println!("Notify timeout:     {}ms", config.notify_timeout_ms);
    println!("Decode workers:     {}", config.decode_workers);
    println!("Capture queue:      {}", config.capture_queue_capacity);
    println!("Outbound queue:     {}", config.outbound_queue_capacity);
    let ignored_path = store.ignored_user_ids_path(&config);
    let ignored = IgnoreList::load(&ignored_path).await?;
    println!(
        "Ignored user ids:   {} ({} ids)",
        ignored_path.display(),
        ignored.len()
    );
    Ok(())
}
