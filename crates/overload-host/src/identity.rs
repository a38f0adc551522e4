//! Entity kinds, prefab descriptors, and actor identity.
//!
//! The host knows every object by a prefab path. The override logic only
//! cares whether an object is a generator, so the prefab is classified once
//! at the host boundary into an [`EntityKind`] and never re-inspected deeper
//! in.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Prefabs
// ---------------------------------------------------------------------------

/// Prefab path of the small test generator.
pub const GENERATOR_PREFAB: &str = "assets/prefabs/deployable/playerioents/generators/generator.small.prefab";

/// Short-name fragment that identifies a small generator prefab.
pub const GENERATOR_SHORT_NAME: &str = "generator.small";

/// Prefab path of the marker spawned inside an overridden generator.
pub const MARKER_PREFAB: &str =
    "assets/prefabs/deployable/playerioents/teslacoil/teslacoil.deployed.prefab";

/// One-shot effect played where an override was applied.
pub const UPGRADE_EFFECT: &str = "assets/bundled/prefabs/fx/build/promote_metal.prefab";

// ---------------------------------------------------------------------------
// EntityKind
// ---------------------------------------------------------------------------

/// What an entity is, as far as overrides are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// A small generator: the only override target.
    Generator,
    /// Anything else, markers included.
    Other,
}

impl EntityKind {
    /// Classify a prefab path.
    pub fn from_prefab(prefab: &str) -> Self {
        if prefab.contains(GENERATOR_SHORT_NAME) {
            EntityKind::Generator
        } else {
            EntityKind::Other
        }
    }

    /// `true` for [`EntityKind::Generator`].
    pub fn is_generator(self) -> bool {
        matches!(self, EntityKind::Generator)
    }
}

// ---------------------------------------------------------------------------
// ActorId / OwnerId
// ---------------------------------------------------------------------------

/// A player (or other actor) issuing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub u64);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Owner recorded on a deployed entity. `OwnerId(0)` means "no owner"
/// (world-placed objects).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub u64);

impl OwnerId {
    /// The "nobody" owner.
    pub const NONE: OwnerId = OwnerId(0);
}

impl From<ActorId> for OwnerId {
    fn from(actor: ActorId) -> Self {
        OwnerId(actor.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
