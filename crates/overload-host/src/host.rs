//! Contracts the override logic consumes from the host simulation.
//!
//! The host owns entity lifetimes, identity assignment, inventories,
//! permissions, view raycasts and chat. None of that is reimplemented here;
//! the override crates only talk to it through these traits. [`SimWorld`]
//! is the in-memory reference implementation used by tests and demos.
//!
//! [`SimWorld`]: crate::world::SimWorld

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::identity::{ActorId, EntityKind, OwnerId};
use crate::HostError;

// ---------------------------------------------------------------------------
// Value types
// ---------------------------------------------------------------------------

/// A world-space position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Presentation flags the marker is switched into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityFlag {
    /// The entity renders as powered.
    HasPower,
    /// The entity plays its weak spark effect.
    WeakShorting,
}

/// Result of the actor's view raycast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// The entity that was hit.
    pub entity: EntityId,
    /// Distance from the actor's eyes to the hit point.
    pub distance: f32,
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// Entity access on the live simulation.
///
/// Every per-entity call fails with [`HostError::UnknownEntity`] when the id
/// is not alive. [`despawn`](Simulation::despawn) is the exception: it is
/// idempotent and just reports whether anything was removed.
pub trait Simulation {
    /// Ids of every live generator.
    fn generators(&self) -> Vec<EntityId>;

    /// Classification of a live entity, `None` if it does not exist.
    fn kind(&self, id: EntityId) -> Option<EntityKind>;

    fn position(&self, id: EntityId) -> Result<Vec3, HostError>;

    fn owner(&self, id: EntityId) -> Result<OwnerId, HostError>;

    /// Current power output.
    fn output(&self, id: EntityId) -> Result<i32, HostError>;

    fn set_output(&mut self, id: EntityId, level: i32) -> Result<(), HostError>;

    /// Push the entity's output to everything wired to it.
    fn propagate_outputs(&mut self, id: EntityId) -> Result<(), HostError>;

    fn pickup_enabled(&self, id: EntityId) -> Result<bool, HostError>;

    fn set_pickup_enabled(&mut self, id: EntityId, enabled: bool) -> Result<(), HostError>;

    /// Create and spawn an entity from a prefab at `position`.
    fn create_entity(&mut self, prefab: &str, position: Vec3) -> Result<EntityId, HostError>;

    /// Remove the entity's own destruction triggers (ground checks) and its
    /// collision meshes, so only an explicit kill or its parent's death can
    /// remove it.
    fn strip_destroy_triggers(&mut self, id: EntityId) -> Result<(), HostError>;

    fn set_owner(&mut self, id: EntityId, owner: OwnerId) -> Result<(), HostError>;

    fn set_flag(&mut self, id: EntityId, flag: EntityFlag, on: bool) -> Result<(), HostError>;

    fn set_position(&mut self, id: EntityId, position: Vec3) -> Result<(), HostError>;

    /// Attach `child` under `parent`. Destroying the parent destroys the child.
    fn set_parent(&mut self, child: EntityId, parent: EntityId) -> Result<(), HostError>;

    /// Live children of `id` created from `prefab`.
    fn children(&self, id: EntityId, prefab: &str) -> Vec<EntityId>;

    /// Destroy `id` and its children. Returns `false` if it was already gone.
    fn despawn(&mut self, id: EntityId) -> bool;

    /// Force an immediate network update of `id` and its children.
    fn send_network_update(&mut self, id: EntityId) -> Result<(), HostError>;

    /// Play a one-shot effect at `position`.
    fn run_effect(&mut self, prefab: &str, position: Vec3);
}

// ---------------------------------------------------------------------------
// Actor-facing services
// ---------------------------------------------------------------------------

/// Item inventories keyed by actor and item short name.
pub trait Inventory {
    /// How many of `item` the actor carries. Fails with
    /// [`HostError::UnknownItem`] if no such item definition exists.
    fn amount(&self, actor: ActorId, item: &str) -> Result<u32, HostError>;

    fn take(&mut self, actor: ActorId, item: &str, amount: u32) -> Result<(), HostError>;

    fn give(&mut self, actor: ActorId, item: &str, amount: u32) -> Result<(), HostError>;

    fn is_connected(&self, actor: ActorId) -> bool;
}

/// Named permission grants.
pub trait Permissions {
    fn register_permission(&mut self, permission: &str);

    fn has_permission(&self, actor: ActorId, permission: &str) -> bool;
}

/// What the actor is looking at.
pub trait Targeting {
    /// Unbounded raycast from the actor's eyes; callers apply range limits.
    fn view_target(&self, actor: ActorId) -> Option<RayHit>;
}

/// Plain-text messages to an actor.
pub trait Chat {
    fn send_message(&mut self, actor: ActorId, text: &str);
}

/// Everything the override plugin needs from its host.
pub trait Host: Simulation + Inventory + Permissions + Targeting + Chat {}

impl<T> Host for T where T: Simulation + Inventory + Permissions + Targeting + Chat {}
