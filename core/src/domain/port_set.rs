//! Target port set domain model.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// The UDP local ports currently owned by the monitored process.
///
/// A set is never mutated in place. The resolver derives a fresh candidate
/// from OS state and swaps it in whole, bumping the generation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetPortSet {
    ports: BTreeSet<u16>,
    generation: u64,
}

/// Outcome of comparing the cached port set with a freshly derived one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortSetTransition {
    /// Same ports; keep the cached set.
    Unchanged,
    /// Ports differ; swap in the candidate.
    Replaced {
        /// Whether the change closes the current lobby.
        lobby_reset: bool,
    },
}

impl TargetPortSet {
    /// Create an empty set (generation 0).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a candidate set from enumerated ports.
    pub fn from_ports(ports: impl IntoIterator<Item = u16>) -> Self {
        Self {
            ports: ports.into_iter().collect(),
            generation: 0,
        }
    }

    /// Whether `port` belongs to the monitored process.
    pub fn contains(&self, port: u16) -> bool {
        self.ports.contains(&port)
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    /// Ports in ascending order.
    pub fn ports(&self) -> impl Iterator<Item = u16> + '_ {
        self.ports.iter().copied()
    }

    /// Number of swaps that produced this set.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Value equality on the ports only.
    pub fn same_ports(&self, other: &TargetPortSet) -> bool {
        self.ports == other.ports
    }

    /// Decide how the cached set (`self`) moves to `candidate`.
    ///
    /// A lobby reset fires only when the cached set was non-empty and the
    /// candidate differs from it.
    pub fn transition_to(&self, candidate: &TargetPortSet) -> PortSetTransition {
        if self.same_ports(candidate) {
            return PortSetTransition::Unchanged;
        }

        PortSetTransition::Replaced {
            lobby_reset: !self.is_empty(),
        }
    }

    /// Turn a candidate into the successor of `self`.
    pub fn succeed(&self, candidate: TargetPortSet) -> TargetPortSet {
        TargetPortSet {
            ports: candidate.ports,
            generation: self.generation + 1,
        }
    }
}

impl std::fmt::Display for TargetPortSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.ports.is_empty() {
            return write!(f, "{{}}");
        }

        let ports = self
            .ports
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{{{}}}", ports)
    }
}
