//! In-memory sighting store.

use std::collections::{BTreeSet, HashSet};

use parking_lot::RwLock;

use crate::domain::Sighting;
use crate::error::Result;
use crate::ports::SightingRepository;

#[derive(Default)]
struct Tables {
    seen: Vec<Sighting>,
    current_lobby: Vec<Sighting>,
    linked_devices: BTreeSet<(String, String)>,
    linked_users: BTreeSet<(String, String)>,
}

/// Sighting store kept entirely in memory.
///
/// Links are stored as two directed rows per pair, so lookups only ever
/// need the first column.
#[derive(Default)]
pub struct MemorySightingStore {
    tables: RwLock<Tables>,
    ignored: HashSet<String>,
}

impl MemorySightingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that drops sightings of the given user ids.
    pub fn with_ignored(ignored: impl IntoIterator<Item = String>) -> Self {
        Self {
            tables: RwLock::default(),
            ignored: ignored.into_iter().collect(),
        }
    }

    /// Total number of recorded sightings.
    pub fn sighting_count(&self) -> usize {
        self.tables.read().seen.len()
    }

    /// Number of directed device link rows.
    pub fn device_link_rows(&self) -> usize {
        self.tables.read().linked_devices.len()
    }

    /// Number of directed user link rows.
    pub fn user_link_rows(&self) -> usize {
        self.tables.read().linked_users.len()
    }

    fn newest_first(mut sightings: Vec<Sighting>) -> Vec<Sighting> {
        sightings.sort_by(|a, b| b.seen_at.cmp(&a.seen_at));
        sightings
    }

    fn insert_link(links: &mut BTreeSet<(String, String)>, a: &str, b: &str) -> bool {
        let forward = links.insert((a.to_string(), b.to_string()));
        let backward = links.insert((b.to_string(), a.to_string()));
        forward || backward
    }

    fn linked(links: &BTreeSet<(String, String)>, id: &str) -> Vec<String> {
        links
            .iter()
            .filter(|(from, _)| from == id)
            .map(|(_, to)| to.clone())
            .collect()
    }
}

impl SightingRepository for MemorySightingStore {
    async fn record_sighting(&self, sighting: Sighting) -> Result<()> {
        let mut tables = self.tables.write();
        tables.current_lobby.push(sighting.clone());
        tables.seen.push(sighting);
        Ok(())
    }

    async fn sightings_by_device_or_user(&self, device_id: &str, user_id: &str) -> Result<Vec<Sighting>> {
        let tables = self.tables.read();
        Ok(tables
            .seen
            .iter()
            .filter(|s| s.device_id == device_id || s.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn sightings_by_device(&self, device_id: &str) -> Result<Vec<Sighting>> {
        let tables = self.tables.read();
        let found = tables
            .seen
            .iter()
            .filter(|s| s.device_id == device_id)
            .cloned()
            .collect();
        Ok(Self::newest_first(found))
    }

    async fn sightings_by_user(&self, user_id: &str) -> Result<Vec<Sighting>> {
        let tables = self.tables.read();
        let found = tables
            .seen
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        Ok(Self::newest_first(found))
    }

    async fn sightings_with_linked(&self, device_id: &str, user_id: &str) -> Result<Vec<Sighting>> {
        let tables = self.tables.read();

        let mut devices: HashSet<String> = Self::linked(&tables.linked_devices, device_id)
            .into_iter()
            .collect();
        devices.insert(device_id.to_string());

        let mut users: HashSet<String> = Self::linked(&tables.linked_users, user_id)
            .into_iter()
            .collect();
        users.insert(user_id.to_string());

        let found = tables
            .seen
            .iter()
            .filter(|s| devices.contains(&s.device_id) || users.contains(&s.user_id))
            .cloned()
            .collect();
        Ok(Self::newest_first(found))
    }

    async fn current_lobby_contains(&self, device_id: &str, user_id: &str) -> Result<bool> {
        Ok(self
            .tables
            .read()
            .current_lobby
            .iter()
            .any(|s| s.is_pair(device_id, user_id)))
    }

    async fn current_lobby(&self) -> Result<Vec<Sighting>> {
        Ok(self.tables.read().current_lobby.clone())
    }

    async fn reset_lobby(&self) -> Result<()> {
        self.tables.write().current_lobby.clear();
        Ok(())
    }

    async fn is_ignored(&self, user_id: &str) -> Result<bool> {
        Ok(self.ignored.contains(user_id))
    }

    async fn link_devices(&self, a: &str, b: &str) -> Result<bool> {
        Ok(Self::insert_link(&mut self.tables.write().linked_devices, a, b))
    }

    async fn link_users(&self, a: &str, b: &str) -> Result<bool> {
        Ok(Self::insert_link(&mut self.tables.write().linked_users, a, b))
    }

    async fn linked_devices(&self, device_id: &str) -> Result<Vec<String>> {
        Ok(Self::linked(&self.tables.read().linked_devices, device_id))
    }

    async fn linked_users(&self, user_id: &str) -> Result<Vec<String>> {
        Ok(Self::linked(&self.tables.read().linked_users, user_id))
    }
}
