//! Identity correlation across sightings.
//!
//! Device ids and user ids that were ever seen together are linked, so a
//! player who changes name, device or account can still be recognised.
//! Links are grown incrementally, one sighting at a time, by a
//! breadth-first expansion that stops one hop past direct co-occurrence.

use std::collections::{BTreeSet, HashSet, VecDeque};

use tracing::debug;

use crate::error::Result;
use crate::ports::SightingRepository;

/// Hops expanded beyond the originating sighting.
pub const MAX_LINK_DEPTH: usize = 1;

/// What a single `link_with_known` call changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkReport {
    /// Device pairs linked for the first time.
    pub new_device_links: usize,
    /// User pairs linked for the first time.
    pub new_user_links: usize,
    /// (device, user) nodes expanded.
    pub expanded: usize,
}

impl LinkReport {
    pub fn is_empty(&self) -> bool {
        self.new_device_links == 0 && self.new_user_links == 0
    }
}

/// Grows the device/user link graph from sighting history.
pub struct IdentityLinker<'s, S: SightingRepository> {
    store: &'s S,
    max_depth: usize,
}

impl<'s, S: SightingRepository> IdentityLinker<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self {
            store,
            max_depth: MAX_LINK_DEPTH,
        }
    }

    /// Link `device_id` and `user_id` with every identifier they co-occur with.
    ///
    /// The origin is expanded first. Each identifier it gets linked to is
    /// then expanded once more, paired with the origin's other half, and
    /// nothing beyond that. Re-running with the same history creates no
    /// new links.
    pub async fn link_with_known(&self, device_id: &str, user_id: &str) -> Result<LinkReport> {
        let mut report = LinkReport::default();
        let mut visited: HashSet<(String, String)> = HashSet::new();
        let mut frontier = VecDeque::from([(device_id.to_string(), user_id.to_string(), 0usize)]);

        while let Some((device, user, depth)) = frontier.pop_front() {
            if !visited.insert((device.clone(), user.clone())) {
                continue;
            }
            report.expanded += 1;

            let (devices, users) = self.co_occurring(&device, &user).await?;
            let expand = depth < self.max_depth;

            for other in devices.iter().filter(|d| **d != device) {
                if self.store.link_devices(&device, other).await? {
                    report.new_device_links += 1;
                }
                if expand {
                    frontier.push_back((other.clone(), user.clone(), depth + 1));
                }
            }

            for other in users.iter().filter(|u| **u != user) {
                if self.store.link_users(&user, other).await? {
                    report.new_user_links += 1;
                }
                if expand {
                    frontier.push_back((device.clone(), other.clone(), depth + 1));
                }
            }
        }

        debug!(
            device_id,
            user_id,
            expanded = report.expanded,
            new_device_links = report.new_device_links,
            new_user_links = report.new_user_links,
            "Linked identities"
        );
        Ok(report)
    }

    /// Distinct device and user ids seen together with the pair.
    ///
    /// Each device found is looked up again by device, and each user by
    /// user, widening the sets by that history.
    async fn co_occurring(
        &self,
        device_id: &str,
        user_id: &str,
    ) -> Result<(BTreeSet<String>, BTreeSet<String>)> {
        let seen = self
            .store
            .sightings_by_device_or_user(device_id, user_id)
            .await?;

        let mut devices: BTreeSet<String> = seen.iter().map(|s| s.device_id.clone()).collect();
        let mut users: BTreeSet<String> = seen.iter().map(|s| s.user_id.clone()).collect();

        for device in devices.clone() {
            for sighting in self.store.sightings_by_device(&device).await? {
                devices.insert(sighting.device_id);
            }
        }

        for user in users.clone() {
            for sighting in self.store.sightings_by_user(&user).await? {
                users.insert(sighting.user_id);
            }
        }

        Ok((devices, users))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemorySightingStore;
    use crate::domain::Sighting;

    async fn record(store: &MemorySightingStore, name: &str, device: &str, user: &str) {
        store
            .record_sighting(Sighting::new(name, device, user))
            .await
            .unwrap();
    }

    async fn devices_of(store: &MemorySightingStore, device: &str) -> Vec<String> {
        store.linked_devices(device).await.unwrap()
    }

    async fn users_of(store: &MemorySightingStore, user: &str) -> Vec<String> {
        store.linked_users(user).await.unwrap()
    }

    #[tokio::test]
    async fn test_new_device_for_known_user_links_devices() {
        let store = MemorySightingStore::new();
        record(&store, "Alice", "D1", "U1").await;
        record(&store, "Alice2", "D2", "U1").await;

        let report = IdentityLinker::new(&store)
            .link_with_known("D2", "U1")
            .await
            .unwrap();

        assert_eq!(report.new_device_links, 1);
        assert_eq!(devices_of(&store, "D1").await, vec!["D2"]);
        assert_eq!(devices_of(&store, "D2").await, vec!["D1"]);
        assert!(users_of(&store, "U1").await.is_empty());
    }

    #[tokio::test]
    async fn test_new_user_on_known_device_links_users() {
        let store = MemorySightingStore::new();
        record(&store, "Bob", "D1", "U1").await;
        record(&store, "Bobby", "D1", "U2").await;

        IdentityLinker::new(&store)
            .link_with_known("D1", "U2")
            .await
            .unwrap();

        assert_eq!(users_of(&store, "U1").await, vec!["U2"]);
        assert_eq!(users_of(&store, "U2").await, vec!["U1"]);
    }

    #[tokio::test]
    async fn test_link_with_known_is_idempotent() {
        let store = MemorySightingStore::new();
        record(&store, "A", "D1", "U1").await;
        record(&store, "B", "D2", "U1").await;
        record(&store, "C", "D2", "U2").await;

        let linker = IdentityLinker::new(&store);
        let first = linker.link_with_known("D2", "U2").await.unwrap();
        let device_rows = store.device_link_rows();
        let user_rows = store.user_link_rows();

        let second = linker.link_with_known("D2", "U2").await.unwrap();
        assert!(!first.is_empty());
        assert!(second.is_empty());
        assert_eq!(store.device_link_rows(), device_rows);
        assert_eq!(store.user_link_rows(), user_rows);
    }

    #[tokio::test]
    async fn test_second_hop_links_through_shared_user() {
        // D1/U1, D2/U1 share a user; D2/U2 adds an account on D2.
        let store = MemorySightingStore::new();
        record(&store, "A", "D1", "U1").await;
        record(&store, "B", "D2", "U1").await;
        record(&store, "C", "D2", "U2").await;

        IdentityLinker::new(&store)
            .link_with_known("D2", "U2")
            .await
            .unwrap();

        // origin: D2 with U2; sightings by D2 or U2 cover U1 and U2
        assert!(users_of(&store, "U2").await.contains(&"U1".to_string()));
        // hop (D2, U1): sightings by D2 or U1 reach D1
        assert!(devices_of(&store, "D2").await.contains(&"D1".to_string()));
    }

    #[tokio::test]
    async fn test_graph_stays_symmetric() {
        let store = MemorySightingStore::new();
        record(&store, "A", "D1", "U1").await;
        record(&store, "B", "D2", "U1").await;
        record(&store, "C", "D3", "U2").await;
        record(&store, "D", "D2", "U2").await;

        IdentityLinker::new(&store)
            .link_with_known("D2", "U2")
            .await
            .unwrap();

        for device in ["D1", "D2", "D3"] {
            for other in devices_of(&store, device).await {
                assert!(devices_of(&store, &other).await.contains(&device.to_string()));
            }
        }
        for user in ["U1", "U2"] {
            for other in users_of(&store, user).await {
                assert!(users_of(&store, &other).await.contains(&user.to_string()));
            }
        }
    }

    #[tokio::test]
    async fn test_expansion_is_depth_bounded() {
        // A chain D1-U1-D2-U2-D3-U3-D4: far ends must not be linked in one call.
        let store = MemorySightingStore::new();
        record(&store, "a", "D1", "U1").await;
        record(&store, "b", "D2", "U1").await;
        record(&store, "c", "D2", "U2").await;
        record(&store, "d", "D3", "U2").await;
        record(&store, "e", "D3", "U3").await;
        record(&store, "f", "D4", "U3").await;

        let report = IdentityLinker::new(&store)
            .link_with_known("D1", "U1")
            .await
            .unwrap();

        assert!(devices_of(&store, "D1").await.contains(&"D2".to_string()));
        assert!(!devices_of(&store, "D1").await.contains(&"D4".to_string()));
        assert!(report.expanded <= 3);
    }

    #[tokio::test]
    async fn test_unknown_pair_links_nothing() {
        let store = MemorySightingStore::new();
        let report = IdentityLinker::new(&store)
            .link_with_known("D1", "U1")
            .await
            .unwrap();

        assert!(report.is_empty());
        assert_eq!(report.expanded, 1);
    }
}
