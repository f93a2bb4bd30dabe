//! Player identity domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// DecodedIdentity
// ============================================================================

/// Identity fields decoded from a single lobby payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedIdentity {
    pub name: String,
    pub country: String,
    pub device_id: String,
    /// `None` when the `userId` field was missing or truncated.
    pub user_id: Option<i64>,
}

impl DecodedIdentity {
    /// The user id, falling back to 0 when it could not be decoded.
    pub fn user_id_or_default(&self) -> i64 {
        self.user_id.unwrap_or(0)
    }

    /// Build the event announcing this player.
    pub fn to_event(&self) -> LobbyEvent {
        LobbyEvent::PlayerSighted {
            name: self.name.clone(),
            device_id: self.device_id.clone(),
            user_id: self.user_id_or_default().to_string(),
        }
    }
}

// ============================================================================
// LobbyEvent
// ============================================================================

/// Events the core emits to its collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LobbyEvent {
    /// A player was seen joining the current lobby.
    #[serde(rename_all = "camelCase")]
    PlayerSighted {
        name: String,
        device_id: String,
        user_id: String,
    },
    /// The lobby closed or a new one was created.
    LobbyReset,
}

// ============================================================================
// Sighting
// ============================================================================

/// One recorded observation of a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sighting {
    pub id: Uuid,
    pub name: String,
    pub device_id: String,
    pub user_id: String,
    pub seen_at: DateTime<Utc>,
}

impl Sighting {
    /// Create a sighting stamped with the current time.
    pub fn new(
        name: impl Into<String>,
        device_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self::at(name, device_id, user_id, Utc::now())
    }

    /// Create a sighting at an explicit time.
    pub fn at(
        name: impl Into<String>,
        device_id: impl Into<String>,
        user_id: impl Into<String>,
        seen_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            device_id: device_id.into(),
            user_id: user_id.into(),
            seen_at,
        }
    }

    /// Whether this sighting is the (device, user) pair given.
    pub fn is_pair(&self, device_id: &str, user_id: &str) -> bool {
        self.device_id == device_id && self.user_id == user_id
    }
}

/// An earlier sighting of a lobby member, annotated with what changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub sighting: Sighting,
    pub name_changed: bool,
    pub device_id_changed: bool,
    pub user_id_changed: bool,
}

impl HistoryEntry {
    /// Compare `earlier` against the `current` sighting.
    pub fn compare(current: &Sighting, earlier: Sighting) -> Self {
        Self {
            name_changed: current.name != earlier.name,
            device_id_changed: current.device_id != earlier.device_id,
            user_id_changed: current.user_id != earlier.user_id,
            sighting: earlier,
        }
    }
}

/// A current lobby member together with everything known about them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbyEntry {
    pub player: Sighting,
    pub history: Vec<HistoryEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_event_falls_back_to_zero() {
        let identity = DecodedIdentity {
            name: "Alice".to_string(),
            country: "NL".to_string(),
            device_id: "dev-1".to_string(),
            user_id: None,
        };

        assert_eq!(
            identity.to_event(),
            LobbyEvent::PlayerSighted {
                name: "Alice".to_string(),
                device_id: "dev-1".to_string(),
                user_id: "0".to_string(),
            }
        );
    }

    #[test]
    fn test_negative_user_id_renders_signed() {
        let identity = DecodedIdentity {
            name: "Bob".to_string(),
            country: "DE".to_string(),
            device_id: "dev-2".to_string(),
            user_id: Some(-42),
        };

        match identity.to_event() {
            LobbyEvent::PlayerSighted { user_id, .. } => assert_eq!(user_id, "-42"),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_history_flags() {
        let current = Sighting::new("Alice", "dev-1", "7");
        let earlier = Sighting::new("Alicia", "dev-1", "8");

        let entry = HistoryEntry::compare(&current, earlier);
        assert!(entry.name_changed);
        assert!(!entry.device_id_changed);
        assert!(entry.user_id_changed);
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_value(LobbyEvent::PlayerSighted {
            name: "Alice".to_string(),
            device_id: "dev-1".to_string(),
            user_id: "7".to_string(),
        })
        .unwrap();

        assert_eq!(json["type"], "playerSighted");
        assert_eq!(json["deviceId"], "dev-1");
        assert_eq!(json["userId"], "7");
    }
}
