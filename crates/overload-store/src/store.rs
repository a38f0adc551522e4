//! In-memory override map.
//!
//! The [`OverrideStore`] holds one entry per generator that currently carries
//! an override: `entity id -> power level`. It is a dumb map. It never talks
//! to disk and never decides anything on its own; the controller and the
//! reconciler mutate it and then ask a [`DataFile`](crate::data_file::DataFile)
//! to persist the whole thing.
//!
//! # Example
//!
//! ```
//! use overload_store::store::OverrideStore;
//! use overload_host::entity::EntityId;
//!
//! let mut store = OverrideStore::new();
//! store.put(EntityId::new(42), 150);
//! assert_eq!(store.get(EntityId::new(42)), Some(150));
//!
//! let removed = store.retain_live(|id| id == EntityId::new(7));
//! assert_eq!(removed, vec![EntityId::new(42)]);
//! assert!(store.is_empty());
//! ```

use std::collections::BTreeMap;

use overload_host::entity::EntityId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// OverrideRecord
// ---------------------------------------------------------------------------

/// One active override: `entity_id` runs at `power_level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideRecord {
    pub entity_id: EntityId,
    pub power_level: i32,
}

// ---------------------------------------------------------------------------
// OverrideStore
// ---------------------------------------------------------------------------

/// Authoritative `entity id -> override level` map.
///
/// Serialized as `{ "overrides": { "<id>": <level>, ... } }`, which is also the
/// on-disk layout of the data file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideStore {
    #[serde(default)]
    overrides: BTreeMap<EntityId, i32>,
}

impl OverrideStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            overrides: BTreeMap::new(),
        }
    }

    /// Record an override, replacing any previous level for `id`.
    ///
    /// Returns the previous level, if there was one.
    pub fn put(&mut self, id: EntityId, level: i32) -> Option<i32> {
        self.overrides.insert(id, level)
    }

    /// Forget the override for `id`. Returns the level it had.
    pub fn remove(&mut self, id: EntityId) -> Option<i32> {
        self.overrides.remove(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<i32> {
        self.overrides.get(&id).copied()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.overrides.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.overrides.clear();
    }

    /// Keep only entries whose id satisfies `is_live`.
    ///
    /// Returns the removed ids in ascending order.
    pub fn retain_live(&mut self, mut is_live: impl FnMut(EntityId) -> bool) -> Vec<EntityId> {
        let orphans: Vec<EntityId> = self
            .overrides
            .keys()
            .copied()
            .filter(|id| !is_live(*id))
            .collect();
        for id in &orphans {
            self.overrides.remove(id);
        }
        orphans
    }

    /// All active overrides in ascending id order.
    pub fn records(&self) -> impl Iterator<Item = OverrideRecord> + '_ {
        self.overrides
            .iter()
            .map(|(&entity_id, &power_level)| OverrideRecord {
                entity_id,
                power_level,
            })
    }

    /// All ids with an active override, ascending.
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.overrides.keys().copied()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
