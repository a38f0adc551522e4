//! Host save files for the reference world.
//!
//! Provides [`WorldSnapshot`] -- a serializable image of a [`SimWorld`]
//! (allocator position, every live entity, actors, item definitions and
//! registered permissions) with a BLAKE3 content hash. Capturing a snapshot
//! and restoring it into a fresh world is how tests model a host save
//! followed by a process restart: entity ids survive, transient logs
//! (effects, network updates) and live sessions do not.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::entity::{EntityAllocator, EntityId};
use crate::identity::ActorId;
use crate::world::{SimEntity, SimPlayer, SimWorld};
use crate::HostError;

// ---------------------------------------------------------------------------
// Snapshot types
// ---------------------------------------------------------------------------

/// The hashed portion of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    /// Next id the allocator will hand out.
    pub next_entity_id: u64,
    /// All live entities keyed by id.
    pub entities: BTreeMap<EntityId, SimEntity>,
    pub players: BTreeMap<ActorId, SimPlayer>,
    pub item_definitions: BTreeSet<String>,
    pub registered_permissions: BTreeSet<String>,
}

/// A complete, integrity-checked host save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub state: WorldState,
    /// BLAKE3 hex digest (64 lowercase hex chars) of `state` as JSON.
    pub hash: String,
}

// ---------------------------------------------------------------------------
// Hashing helpers
// ---------------------------------------------------------------------------

fn compute_hash(state: &WorldState) -> Result<String, HostError> {
    let json_bytes =
        serde_json::to_vec(state).map_err(|e| HostError::SnapshotDecode(e.to_string()))?;
    Ok(blake3::hash(&json_bytes).to_hex().to_string())
}

// ---------------------------------------------------------------------------
// WorldSnapshot
// ---------------------------------------------------------------------------

impl WorldSnapshot {
    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, HostError> {
        serde_json::to_string_pretty(self).map_err(|e| HostError::SnapshotDecode(e.to_string()))
    }

    /// Parse a snapshot from JSON. The hash is checked on restore, not here.
    pub fn from_json(json: &str) -> Result<Self, HostError> {
        serde_json::from_str(json).map_err(|e| HostError::SnapshotDecode(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// SimWorld snapshot/restore impl
// ---------------------------------------------------------------------------

impl SimWorld {
    /// Capture a save of the current world.
    pub fn capture_snapshot(&self) -> Result<WorldSnapshot, HostError> {
        let state = WorldState {
            next_entity_id: self.allocator.peek_next(),
            entities: self.entities.clone(),
            players: self.players.clone(),
            item_definitions: self.item_definitions.clone(),
            registered_permissions: self.registered_permissions.clone(),
        };
        let hash = compute_hash(&state)?;
        Ok(WorldSnapshot { state, hash })
    }

    /// Boot a fresh world from a save.
    ///
    /// Every actor comes back disconnected with an empty chat log. Entities
    /// whose parent is missing from the save are dropped, as the host would
    /// when it loads a child without its parent.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::SnapshotHashMismatch`] if the recorded hash does
    /// not match the state.
    pub fn restore_from_snapshot(snapshot: &WorldSnapshot) -> Result<SimWorld, HostError> {
        let recomputed = compute_hash(&snapshot.state)?;
        if recomputed != snapshot.hash {
            return Err(HostError::SnapshotHashMismatch {
                recorded: snapshot.hash.clone(),
                recomputed,
            });
        }

        let state = &snapshot.state;
        let entities: BTreeMap<EntityId, SimEntity> = state
            .entities
            .iter()
            .filter(|(id, e)| match e.parent {
                Some(parent) if !state.entities.contains_key(&parent) => {
                    tracing::warn!(entity = %id, parent = %parent, "dropping child of missing parent on restore");
                    false
                }
                _ => true,
            })
            .map(|(id, e)| (*id, e.clone()))
            .collect();

        let players = state
            .players
            .iter()
            .map(|(actor, p)| {
                let mut p = p.clone();
                p.connected = false;
                p.messages.clear();
                (*actor, p)
            })
            .collect();

        Ok(SimWorld::from_parts(
            EntityAllocator::starting_at(state.next_entity_id),
            entities,
            players,
            state.item_definitions.clone(),
            state.registered_permissions.clone(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
