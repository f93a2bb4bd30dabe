//! Collaborator-side sighting ingestion.

use tracing::{debug, info, warn};

use crate::domain::{HistoryEntry, LobbyEntry, LobbyEvent, Sighting};
use crate::error::{Error, Result};
use crate::ports::{EventDeliveryPort, SightingRepository};

use super::{IdentityLinker, LinkReport};

/// What happened to an ingested event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The user id is on the ignore list.
    Ignored,
    /// The (device, user) pair is already in the current lobby.
    AlreadyPresent,
    /// A new sighting was recorded and linked.
    Recorded {
        sighting: Sighting,
        links: LinkReport,
        history: Vec<HistoryEntry>,
    },
    /// The current lobby was cleared.
    LobbyCleared,
}

/// Applies lobby events to a sighting store.
///
/// Each player is recorded once per lobby generation. Every recorded
/// sighting is fed to the identity linker.
pub struct SightingIngest<S: SightingRepository> {
    store: S,
}

impl<S: SightingRepository> SightingIngest<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Apply one event.
    pub async fn handle(&self, event: LobbyEvent) -> Result<IngestOutcome> {
        match event {
            LobbyEvent::PlayerSighted {
                name,
                device_id,
                user_id,
            } => self.sighted(name, device_id, user_id).await,
            LobbyEvent::LobbyReset => {
                self.store.reset_lobby().await?;
                Ok(IngestOutcome::LobbyCleared)
            }
        }
    }

    async fn sighted(&self, name: String, device_id: String, user_id: String) -> Result<IngestOutcome> {
        if name.is_empty() || device_id.is_empty() || user_id.is_empty() {
            return Err(Error::Store("Missing parameters".to_string()));
        }

        if self.store.is_ignored(&user_id).await? {
            return Ok(IngestOutcome::Ignored);
        }

        if self.store.current_lobby_contains(&device_id, &user_id).await? {
            return Ok(IngestOutcome::AlreadyPresent);
        }

        let sighting = Sighting::new(name, device_id, user_id);
        self.store.record_sighting(sighting.clone()).await?;

        let links = IdentityLinker::new(&self.store)
            .link_with_known(&sighting.device_id, &sighting.user_id)
            .await?;
        let history = self.history_for(&sighting).await?;

        Ok(IngestOutcome::Recorded {
            sighting,
            links,
            history,
        })
    }

    /// Earlier sightings of the same person, newest first.
    ///
    /// Includes sightings reached through linked devices and linked users.
    pub async fn history_for(&self, player: &Sighting) -> Result<Vec<HistoryEntry>> {
        let seen = self
            .store
            .sightings_with_linked(&player.device_id, &player.user_id)
            .await?;

        Ok(seen
            .into_iter()
            .filter(|s| s.id != player.id)
            .map(|s| HistoryEntry::compare(player, s))
            .collect())
    }

    /// Every current lobby member with their history.
    pub async fn lobby_report(&self) -> Result<Vec<LobbyEntry>> {
        let mut entries = Vec::new();
        for player in self.store.current_lobby().await? {
            let history = self.history_for(&player).await?;
            entries.push(LobbyEntry { player, history });
        }
        Ok(entries)
    }
}

impl<S: SightingRepository + 'static> EventDeliveryPort for SightingIngest<S> {
    async fn deliver(&self, event: LobbyEvent) -> Result<()> {
        match self.handle(event).await? {
            IngestOutcome::Recorded {
                sighting, history, ..
            } => {
                let mut aliases: Vec<&str> = history
                    .iter()
                    .filter(|h| h.name_changed)
                    .map(|h| h.sighting.name.as_str())
                    .collect();
                aliases.sort_unstable();
                aliases.dedup();

                if aliases.is_empty() {
                    info!(name = %sighting.name, sightings = history.len(), "Recorded sighting");
                } else {
                    warn!(
                        name = %sighting.name,
                        previously = %aliases.join(", "),
                        "Known player under a different name"
                    );
                }
            }
            IngestOutcome::LobbyCleared => info!("Lobby cleared"),
            outcome => debug!(?outcome, "Sighting not recorded"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemorySightingStore;

    fn sighted(name: &str, device: &str, user: &str) -> LobbyEvent {
        LobbyEvent::PlayerSighted {
            name: name.to_string(),
            device_id: device.to_string(),
            user_id: user.to_string(),
        }
    }

    #[tokio::test]
    async fn test_records_new_player() {
        let ingest = SightingIngest::new(MemorySightingStore::new());

        let outcome = ingest.handle(sighted("Alice", "D1", "U1")).await.unwrap();
        assert!(matches!(outcome, IngestOutcome::Recorded { .. }));
        assert_eq!(ingest.store().sighting_count(), 1);
        assert!(ingest.store().current_lobby_contains("D1", "U1").await.unwrap());
    }

    #[tokio::test]
    async fn test_deduplicates_within_lobby_generation() {
        let ingest = SightingIngest::new(MemorySightingStore::new());

        ingest.handle(sighted("Alice", "D1", "U1")).await.unwrap();
        let again = ingest.handle(sighted("Alice", "D1", "U1")).await.unwrap();
        assert_eq!(again, IngestOutcome::AlreadyPresent);
        assert_eq!(ingest.store().sighting_count(), 1);

        // a new lobby generation records the player again
        assert_eq!(
            ingest.handle(LobbyEvent::LobbyReset).await.unwrap(),
            IngestOutcome::LobbyCleared
        );
        let next = ingest.handle(sighted("Alice", "D1", "U1")).await.unwrap();
        assert!(matches!(next, IngestOutcome::Recorded { .. }));
        assert_eq!(ingest.store().sighting_count(), 2);
    }

    #[tokio::test]
    async fn test_ignored_user_is_not_recorded() {
        let ingest = SightingIngest::new(MemorySightingStore::with_ignored(vec!["U1".to_string()]));

        let outcome = ingest.handle(sighted("Me", "D1", "U1")).await.unwrap();
        assert_eq!(outcome, IngestOutcome::Ignored);
        assert_eq!(ingest.store().sighting_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_fields_are_rejected() {
        let ingest = SightingIngest::new(MemorySightingStore::new());
        assert!(ingest.handle(sighted("", "D1", "U1")).await.is_err());
    }

    #[tokio::test]
    async fn test_renamed_player_history() {
        let ingest = SightingIngest::new(MemorySightingStore::new());

        ingest.handle(sighted("Alice", "D1", "U1")).await.unwrap();
        ingest.handle(LobbyEvent::LobbyReset).await.unwrap();

        // same account on a new device under a new name
        let outcome = ingest.handle(sighted("Mallory", "D2", "U1")).await.unwrap();
        let IngestOutcome::Recorded { links, history, .. } = outcome else {
            panic!("expected a recorded sighting");
        };

        assert_eq!(links.new_device_links, 1);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].sighting.name, "Alice");
        assert!(history[0].name_changed);
        assert!(history[0].device_id_changed);
        assert!(!history[0].user_id_changed);
    }

    #[tokio::test]
    async fn test_lobby_report_follows_links() {
        let ingest = SightingIngest::new(MemorySightingStore::new());

        // U1 on D1, then U2 on D1: users linked through the device
        ingest.handle(sighted("Alice", "D1", "U1")).await.unwrap();
        ingest.handle(LobbyEvent::LobbyReset).await.unwrap();
        ingest.handle(sighted("Bob", "D1", "U2")).await.unwrap();
        ingest.handle(LobbyEvent::LobbyReset).await.unwrap();

        // U2 shows up on a fresh device; history reaches Alice via the user link
        ingest.handle(sighted("Eve", "D9", "U2")).await.unwrap();

        let report = ingest.lobby_report().await.unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].player.name, "Eve");

        let names: Vec<&str> = report[0]
            .history
            .iter()
            .map(|h| h.sighting.name.as_str())
            .collect();
        assert!(names.contains(&"Bob"));
        assert!(names.contains(&"Alice"));
        assert!(!names.contains(&"Eve"));
    }

    #[tokio::test]
    async fn test_delivery_applies_events() {
        let ingest = SightingIngest::new(MemorySightingStore::new());
        ingest.deliver(sighted("Alice", "D1", "U1")).await.unwrap();
        assert_eq!(ingest.store().sighting_count(), 1);
    }
}
