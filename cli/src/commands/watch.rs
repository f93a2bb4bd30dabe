//! Watch command - capture lobby traffic until Ctrl-C.

use anyhow::Result;

#[cfg(not(feature = "capture"))]
pub async fn run(
    _local: bool,
    _process: Option<String>,
    _notify_url: Option<String>,
) -> Result<()> {
    anyhow::bail!(
        "this build has no packet capture support; rebuild with `--features capture` (needs libpcap or Npcap)"
    )
}

#[cfg(feature = "capture")]
pub async fn run(local: bool, process: Option<String>, notify_url: Option<String>) -> Result<()> {
    use std::sync::Arc;
    use std::time::Duration;

    use lobbywatch_core::{
        ConfigStore, HttpDelivery, IgnoreList, LobbyWatchEngine, MemorySightingStore,
        ProcessIntrospector, QueuedNotifier, SightingIngest,
    };
    use tracing::{info, warn};

    let store = ConfigStore::new()?;
    let mut config = store.load().await?;
    if let Some(process) = process {
        config.process_name = process;
    }
    if let Some(url) = notify_url {
        config.notify_url = url;
    }
    config.validate()?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    if local {
        let ignored = IgnoreList::load(&store.ignored_user_ids_path(&config)).await?;
        info!(ignored = ignored.len(), "Recording sightings locally");

        let ingest = Arc::new(SightingIngest::new(MemorySightingStore::with_ignored(
            ignored.into_vec(),
        )));
        let (notifier, delivery) =
            QueuedNotifier::spawn(ingest.clone(), config.outbound_queue_capacity);
        let notifier = Arc::new(notifier);

        let engine = LobbyWatchEngine::new(&config, ProcessIntrospector::new(), notifier.clone());
        let stats = engine.run(shutdown).await?;
        let dropped = notifier.dropped();

        // Closing the queue lets the delivery task drain and exit
        drop(engine);
        drop(notifier);
        delivery.await?;

        print_lobby(&ingest.lobby_report().await?);
        println!(
            "\n{} packets, {} sightings, {} dropped at capture, {} notifications dropped",
            stats.packets, stats.sightings, stats.dropped, dropped
        );
    } else {
        let delivery = HttpDelivery::new(
            config.notify_url.clone(),
            Duration::from_millis(config.notify_timeout_ms),
        )?;
        info!(url = %delivery.base_url(), "Notifying collaborator");

        let (notifier, handle) = QueuedNotifier::spawn(delivery, config.outbound_queue_capacity);
        let notifier = Arc::new(notifier);

        let engine = LobbyWatchEngine::new(&config, ProcessIntrospector::new(), notifier.clone());
        let stats = engine.run(shutdown).await?;

        drop(engine);
        drop(notifier);
        handle.await?;

        println!(
            "{} packets, {} sightings, {} dropped at capture",
            stats.packets, stats.sightings, stats.dropped
        );
    }

    Ok(())
}

#[cfg(feature = "capture")]
fn print_lobby(lobby: &[lobbywatch_core::LobbyEntry]) {
    if lobby.is_empty() {
        println!("Lobby is empty.");
        return;
    }

    println!("{:<20} {:<24} {:<20} SEEN BEFORE", "NAME", "DEVICE", "USER");
    println!("{}", "-".repeat(80));

    for entry in lobby {
        let player = &entry.player;
        println!(
            "{:<20} {:<24} {:<20} {}",
            player.name,
            player.device_id,
            player.user_id,
            entry.history.len()
        );
        for earlier in &entry.history {
            let mut changed = Vec::new();
            if earlier.name_changed {
                changed.push("name");
            }
            if earlier.device_id_changed {
                changed.push("device");
            }
            if earlier.user_id_changed {
                changed.push("user");
            }
            println!(
                "  {} as {} ({}) changed: {}",
                earlier.sighting.seen_at.format("%Y-%m-%d %H:%M"),
                earlier.sighting.name,
                earlier.sighting.device_id,
                if changed.is_empty() {
                    "-".to_string()
                } else {
                    changed.join(", ")
                }
            );
        }
    }
}
