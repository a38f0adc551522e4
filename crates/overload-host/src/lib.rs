//! Overload Host -- host-side contracts for the generator override plugin.
//!
//! This crate describes everything the override logic consumes from the game
//! host: stable entity ids, entity classification, the simulation,
//! inventory, permission, targeting and chat services (as traits), plus
//! [`SimWorld`](world::SimWorld), an in-memory reference host that
//! implements all of them and can be saved and restored to model restarts.
//!
//! # Quick Start
//!
//! ```
//! use overload_host::prelude::*;
//!
//! let mut world = SimWorld::new();
//! let generator = world.spawn_generator(Vec3::new(0.0, 0.0, 0.0), OwnerId(1));
//!
//! assert_eq!(world.kind(generator), Some(EntityKind::Generator));
//! assert_eq!(world.output(generator).unwrap(), DEFAULT_GENERATOR_OUTPUT);
//!
//! let save = world.capture_snapshot().unwrap();
//! let restarted = SimWorld::restore_from_snapshot(&save).unwrap();
//! assert_eq!(restarted.generators(), vec![generator]);
//! ```

#![deny(unsafe_code)]

pub mod entity;
pub mod host;
pub mod identity;
pub mod snapshot;
pub mod world;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by host operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HostError {
    /// The entity does not exist (destroyed or never spawned).
    #[error("entity {entity} does not exist")]
    UnknownEntity { entity: entity::EntityId },

    /// An entity id was claimed twice.
    #[error("entity id {entity} is already in use")]
    IdInUse { entity: entity::EntityId },

    /// The host could not instantiate a prefab.
    #[error("failed to spawn '{prefab}': {reason}")]
    SpawnFailed { prefab: String, reason: String },

    /// No item definition exists under that short name.
    #[error("unknown item '{item}'")]
    UnknownItem { item: String },

    /// The actor does not carry enough of an item.
    #[error("not enough '{item}': required {required}, available {available}")]
    InsufficientItems {
        item: String,
        required: u32,
        available: u32,
    },

    /// The actor is not known to the host.
    #[error("unknown actor {actor}")]
    UnknownActor { actor: identity::ActorId },

    /// A save's hash does not match its contents.
    #[error("snapshot hash mismatch: recorded {recorded} but recomputed {recomputed}")]
    SnapshotHashMismatch {
        recorded: String,
        recomputed: String,
    },

    /// A save could not be encoded or decoded.
    #[error("snapshot encode/decode failed: {0}")]
    SnapshotDecode(String),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::entity::{EntityAllocator, EntityId};
    pub use crate::host::{
        Chat, EntityFlag, Host, Inventory, Permissions, RayHit, Simulation, Targeting, Vec3,
    };
    pub use crate::identity::{
        ActorId, EntityKind, OwnerId, GENERATOR_PREFAB, MARKER_PREFAB, UPGRADE_EFFECT,
    };
    pub use crate::snapshot::{WorldSnapshot, WorldState};
    pub use crate::world::{SimEntity, SimPlayer, SimWorld, DEFAULT_GENERATOR_OUTPUT, TECH_PARTS};
    pub use crate::HostError;
}
