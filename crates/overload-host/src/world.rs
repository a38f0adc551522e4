//! The [`SimWorld`] is an in-memory reference host. It owns the entity
//! allocator, every live entity, and the actor-side services (inventories,
//! permissions, view targets, chat) behind the [`host`](crate::host) traits.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::entity::{EntityAllocator, EntityId};
use crate::host::{Chat, EntityFlag, Inventory, Permissions, RayHit, Simulation, Targeting, Vec3};
use crate::identity::{ActorId, EntityKind, OwnerId, GENERATOR_PREFAB};
use crate::HostError;

/// Output a freshly deployed generator produces.
pub const DEFAULT_GENERATOR_OUTPUT: i32 = 100;

/// Item short name used to pay for overrides.
pub const TECH_PARTS: &str = "techparts";

// ---------------------------------------------------------------------------
// SimEntity
// ---------------------------------------------------------------------------

/// A single live entity in the reference host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimEntity {
    /// Prefab path the entity was created from.
    pub prefab: String,
    /// Classification derived from the prefab at creation.
    pub kind: EntityKind,
    pub position: Vec3,
    pub owner: OwnerId,
    /// Parent entity; the child dies with it.
    pub parent: Option<EntityId>,
    /// Power output (meaningful for generators only).
    pub output: i32,
    pub pickup_enabled: bool,
    pub flags: BTreeSet<EntityFlag>,
    /// Whether ground checks / collision can still destroy the entity.
    pub destroy_triggers: bool,
}

impl SimEntity {
    fn from_prefab(prefab: &str, position: Vec3) -> Self {
        let kind = EntityKind::from_prefab(prefab);
        Self {
            prefab: prefab.to_owned(),
            kind,
            position,
            owner: OwnerId::NONE,
            parent: None,
            output: if kind.is_generator() {
                DEFAULT_GENERATOR_OUTPUT
            } else {
                0
            },
            pickup_enabled: true,
            flags: BTreeSet::new(),
            destroy_triggers: true,
        }
    }
}

// ---------------------------------------------------------------------------
// SimPlayer
// ---------------------------------------------------------------------------

/// An actor known to the reference host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimPlayer {
    pub connected: bool,
    pub inventory: BTreeMap<String, u32>,
    pub permissions: BTreeSet<String>,
    /// Entity under the crosshair and its distance.
    pub view: Option<(EntityId, f32)>,
    /// Chat messages received, oldest first.
    pub messages: Vec<String>,
}

// ---------------------------------------------------------------------------
// SimWorld
// ---------------------------------------------------------------------------

/// In-memory host simulation implementing every [`host`](crate::host) trait.
#[derive(Debug, Clone)]
pub struct SimWorld {
    pub(crate) allocator: EntityAllocator,
    pub(crate) entities: BTreeMap<EntityId, SimEntity>,
    pub(crate) players: BTreeMap<ActorId, SimPlayer>,
    pub(crate) item_definitions: BTreeSet<String>,
    pub(crate) registered_permissions: BTreeSet<String>,
    /// Prefabs whose creation is forced to fail.
    failing_prefabs: BTreeSet<String>,
    effects: Vec<(String, Vec3)>,
    network_updates: Vec<EntityId>,
    propagations: Vec<EntityId>,
}

impl SimWorld {
    /// Create an empty world that knows the [`TECH_PARTS`] item.
    pub fn new() -> Self {
        let mut item_definitions = BTreeSet::new();
        item_definitions.insert(TECH_PARTS.to_owned());
        Self {
            allocator: EntityAllocator::new(),
            entities: BTreeMap::new(),
            players: BTreeMap::new(),
            item_definitions,
            registered_permissions: BTreeSet::new(),
            failing_prefabs: BTreeSet::new(),
            effects: Vec::new(),
            network_updates: Vec::new(),
            propagations: Vec::new(),
        }
    }

    pub(crate) fn from_parts(
        allocator: EntityAllocator,
        entities: BTreeMap<EntityId, SimEntity>,
        players: BTreeMap<ActorId, SimPlayer>,
        item_definitions: BTreeSet<String>,
        registered_permissions: BTreeSet<String>,
    ) -> Self {
        Self {
            allocator,
            entities,
            players,
            item_definitions,
            registered_permissions,
            ..Self::new()
        }
    }

    // -- entities -----------------------------------------------------------

    /// Deploy a generator owned by `owner`.
    pub fn spawn_generator(&mut self, position: Vec3, owner: OwnerId) -> EntityId {
        let id = self.allocator.allocate();
        let mut entity = SimEntity::from_prefab(GENERATOR_PREFAB, position);
        entity.owner = owner;
        self.entities.insert(id, entity);
        id
    }

    /// Deploy a generator under a caller-chosen id.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::IdInUse`] if `id` is already alive.
    pub fn insert_generator_with_id(
        &mut self,
        id: EntityId,
        position: Vec3,
        owner: OwnerId,
    ) -> Result<(), HostError> {
        if self.entities.contains_key(&id) {
            return Err(HostError::IdInUse { entity: id });
        }
        self.allocator.reserve(id);
        let mut entity = SimEntity::from_prefab(GENERATOR_PREFAB, position);
        entity.owner = owner;
        self.entities.insert(id, entity);
        Ok(())
    }

    /// Spawn an arbitrary prefab (bypasses injected failures).
    pub fn spawn_prefab(&mut self, prefab: &str, position: Vec3) -> EntityId {
        let id = self.allocator.allocate();
        self.entities
            .insert(id, SimEntity::from_prefab(prefab, position));
        id
    }

    pub fn entity(&self, id: EntityId) -> Option<&SimEntity> {
        self.entities.get(&id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut SimEntity> {
        self.entities.get_mut(&id)
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Make every later creation of `prefab` fail.
    pub fn fail_spawns_of(&mut self, prefab: &str) {
        self.failing_prefabs.insert(prefab.to_owned());
    }

    /// Undo [`fail_spawns_of`](Self::fail_spawns_of).
    pub fn allow_spawns_of(&mut self, prefab: &str) {
        self.failing_prefabs.remove(prefab);
    }

    /// Effects played so far, oldest first.
    pub fn effects(&self) -> &[(String, Vec3)] {
        &self.effects
    }

    /// Entities that received a forced network update, oldest first.
    pub fn network_updates(&self) -> &[EntityId] {
        &self.network_updates
    }

    /// Entities whose outputs were propagated, oldest first.
    pub fn propagations(&self) -> &[EntityId] {
        &self.propagations
    }

    fn get(&self, id: EntityId) -> Result<&SimEntity, HostError> {
        self.entities
            .get(&id)
            .ok_or(HostError::UnknownEntity { entity: id })
    }

    fn get_mut(&mut self, id: EntityId) -> Result<&mut SimEntity, HostError> {
        self.entities
            .get_mut(&id)
            .ok_or(HostError::UnknownEntity { entity: id })
    }

    // -- players ------------------------------------------------------------

    /// Register a connected player with an empty inventory.
    pub fn add_player(&mut self, actor: ActorId) {
        self.players.entry(actor).or_insert_with(|| SimPlayer {
            connected: true,
            ..SimPlayer::default()
        });
    }

    pub fn player(&self, actor: ActorId) -> Option<&SimPlayer> {
        self.players.get(&actor)
    }

    /// Define an additional item short name.
    pub fn define_item(&mut self, item: &str) {
        self.item_definitions.insert(item.to_owned());
    }

    /// Add `amount` of `item` to the player's inventory.
    pub fn give_items(&mut self, actor: ActorId, item: &str, amount: u32) {
        let player = self.players.entry(actor).or_default();
        *player.inventory.entry(item.to_owned()).or_insert(0) += amount;
    }

    pub fn grant_permission(&mut self, actor: ActorId, permission: &str) {
        self.players
            .entry(actor)
            .or_default()
            .permissions
            .insert(permission.to_owned());
    }

    pub fn is_permission_registered(&self, permission: &str) -> bool {
        self.registered_permissions.contains(permission)
    }

    /// Point the player's crosshair at `entity`, `distance` units away.
    pub fn look_at(&mut self, actor: ActorId, entity: EntityId, distance: f32) {
        self.players.entry(actor).or_default().view = Some((entity, distance));
    }

    pub fn look_away(&mut self, actor: ActorId) {
        if let Some(player) = self.players.get_mut(&actor) {
            player.view = None;
        }
    }

    pub fn set_connected(&mut self, actor: ActorId, connected: bool) {
        self.players.entry(actor).or_default().connected = connected;
    }

    /// Items of `item` the player holds, zero when unknown.
    pub fn item_count(&self, actor: ActorId, item: &str) -> u32 {
        self.players
            .get(&actor)
            .and_then(|p| p.inventory.get(item))
            .copied()
            .unwrap_or(0)
    }

    /// Chat messages the player received.
    pub fn messages(&self, actor: ActorId) -> &[String] {
        self.players
            .get(&actor)
            .map(|p| p.messages.as_slice())
            .unwrap_or(&[])
    }

    fn player_mut(&mut self, actor: ActorId) -> Result<&mut SimPlayer, HostError> {
        self.players
            .get_mut(&actor)
            .ok_or(HostError::UnknownActor { actor })
    }
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Host trait impls
// ---------------------------------------------------------------------------

impl Simulation for SimWorld {
    fn generators(&self) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, e)| e.kind.is_generator())
            .map(|(id, _)| *id)
            .collect()
    }

    fn kind(&self, id: EntityId) -> Option<EntityKind> {
        self.entities.get(&id).map(|e| e.kind)
    }

    fn position(&self, id: EntityId) -> Result<Vec3, HostError> {
        Ok(self.get(id)?.position)
    }

    fn owner(&self, id: EntityId) -> Result<OwnerId, HostError> {
        Ok(self.get(id)?.owner)
    }

    fn output(&self, id: EntityId) -> Result<i32, HostError> {
        Ok(self.get(id)?.output)
    }

    fn set_output(&mut self, id: EntityId, level: i32) -> Result<(), HostError> {
        self.get_mut(id)?.output = level;
        Ok(())
    }

    fn propagate_outputs(&mut self, id: EntityId) -> Result<(), HostError> {
        self.get(id)?;
        self.propagations.push(id);
        Ok(())
    }

    fn pickup_enabled(&self, id: EntityId) -> Result<bool, HostError> {
        Ok(self.get(id)?.pickup_enabled)
    }

    fn set_pickup_enabled(&mut self, id: EntityId, enabled: bool) -> Result<(), HostError> {
        self.get_mut(id)?.pickup_enabled = enabled;
        Ok(())
    }

    fn create_entity(&mut self, prefab: &str, position: Vec3) -> Result<EntityId, HostError> {
        if self.failing_prefabs.contains(prefab) {
            return Err(HostError::SpawnFailed {
                prefab: prefab.to_owned(),
                reason: "prefab could not be instantiated".to_owned(),
            });
        }
        Ok(self.spawn_prefab(prefab, position))
    }

    fn strip_destroy_triggers(&mut self, id: EntityId) -> Result<(), HostError> {
        self.get_mut(id)?.destroy_triggers = false;
        Ok(())
    }

    fn set_owner(&mut self, id: EntityId, owner: OwnerId) -> Result<(), HostError> {
        self.get_mut(id)?.owner = owner;
        Ok(())
    }

    fn set_flag(&mut self, id: EntityId, flag: EntityFlag, on: bool) -> Result<(), HostError> {
        let entity = self.get_mut(id)?;
        if on {
            entity.flags.insert(flag);
        } else {
            entity.flags.remove(&flag);
        }
        Ok(())
    }

    fn set_position(&mut self, id: EntityId, position: Vec3) -> Result<(), HostError> {
        self.get_mut(id)?.position = position;
        Ok(())
    }

    fn set_parent(&mut self, child: EntityId, parent: EntityId) -> Result<(), HostError> {
        self.get(parent)?;
        self.get_mut(child)?.parent = Some(parent);
        Ok(())
    }

    fn children(&self, id: EntityId, prefab: &str) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, e)| e.parent == Some(id) && e.prefab == prefab)
            .map(|(child, _)| *child)
            .collect()
    }

    fn despawn(&mut self, id: EntityId) -> bool {
        if self.entities.remove(&id).is_none() {
            return false;
        }
        let mut pending = vec![id];
        while let Some(parent) = pending.pop() {
            let orphans: Vec<EntityId> = self
                .entities
                .iter()
                .filter(|(_, e)| e.parent == Some(parent))
                .map(|(child, _)| *child)
                .collect();
            for child in orphans {
                self.entities.remove(&child);
                pending.push(child);
            }
        }
        true
    }

    fn send_network_update(&mut self, id: EntityId) -> Result<(), HostError> {
        self.get(id)?;
        self.network_updates.push(id);
        Ok(())
    }

    fn run_effect(&mut self, prefab: &str, position: Vec3) {
        self.effects.push((prefab.to_owned(), position));
    }
}

impl Inventory for SimWorld {
    fn amount(&self, actor: ActorId, item: &str) -> Result<u32, HostError> {
        if !self.item_definitions.contains(item) {
            return Err(HostError::UnknownItem {
                item: item.to_owned(),
            });
        }
        Ok(self.item_count(actor, item))
    }

    fn take(&mut self, actor: ActorId, item: &str, amount: u32) -> Result<(), HostError> {
        let available = self.amount(actor, item)?;
        if available < amount {
            return Err(HostError::InsufficientItems {
                item: item.to_owned(),
                required: amount,
                available,
            });
        }
        let player = self.player_mut(actor)?;
        if let Some(count) = player.inventory.get_mut(item) {
            *count -= amount;
        }
        Ok(())
    }

    fn give(&mut self, actor: ActorId, item: &str, amount: u32) -> Result<(), HostError> {
        if !self.item_definitions.contains(item) {
            return Err(HostError::UnknownItem {
                item: item.to_owned(),
            });
        }
        let player = self.player_mut(actor)?;
        *player.inventory.entry(item.to_owned()).or_insert(0) += amount;
        Ok(())
    }

    fn is_connected(&self, actor: ActorId) -> bool {
        self.players.get(&actor).is_some_and(|p| p.connected)
    }
}

impl Permissions for SimWorld {
    fn register_permission(&mut self, permission: &str) {
        self.registered_permissions.insert(permission.to_owned());
    }

    fn has_permission(&self, actor: ActorId, permission: &str) -> bool {
        self.players
            .get(&actor)
            .is_some_and(|p| p.permissions.contains(permission))
    }
}

impl Targeting for SimWorld {
    fn view_target(&self, actor: ActorId) -> Option<RayHit> {
        let (entity, distance) = self.players.get(&actor)?.view?;
        // A raycast can only hit something that exists.
        self.entities
            .contains_key(&entity)
            .then_some(RayHit { entity, distance })
    }
}

impl Chat for SimWorld {
    fn send_message(&mut self, actor: ActorId, text: &str) {
        if let Some(player) = self.players.get_mut(&actor) {
            player.messages.push(text.to_owned());
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::MARKER_PREFAB;

    const ALICE: ActorId = ActorId(7);

    #[test]
    fn spawned_generator_starts_at_default_output() {
        let mut world = SimWorld::new();
        let g = world.spawn_generator(Vec3::default(), OwnerId(1));
        assert_eq!(world.output(g).unwrap(), DEFAULT_GENERATOR_OUTPUT);
        assert!(world.pickup_enabled(g).unwrap());
        assert_eq!(world.kind(g), Some(EntityKind::Generator));
        assert_eq!(world.generators(), vec![g]);
    }

    #[test]
    fn despawn_cascades_to_children() {
        let mut world = SimWorld::new();
        let g = world.spawn_generator(Vec3::default(), OwnerId(1));
        let marker = world.create_entity(MARKER_PREFAB, Vec3::default()).unwrap();
        world.set_parent(marker, g).unwrap();
        assert_eq!(world.children(g, MARKER_PREFAB), vec![marker]);

        assert!(world.despawn(g));
        assert!(!world.is_alive(marker));
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn despawn_is_idempotent() {
        let mut world = SimWorld::new();
        let g = world.spawn_generator(Vec3::default(), OwnerId(1));
        assert!(world.despawn(g));
        assert!(!world.despawn(g));
    }

    #[test]
    fn operations_on_dead_entity_fail() {
        let mut world = SimWorld::new();
        let g = world.spawn_generator(Vec3::default(), OwnerId(1));
        world.despawn(g);
        assert!(matches!(
            world.set_output(g, 200),
            Err(HostError::UnknownEntity { .. })
        ));
        assert_eq!(world.kind(g), None);
    }

    #[test]
    fn injected_spawn_failure() {
        let mut world = SimWorld::new();
        world.fail_spawns_of(MARKER_PREFAB);
        assert!(matches!(
            world.create_entity(MARKER_PREFAB, Vec3::default()),
            Err(HostError::SpawnFailed { .. })
        ));
        world.allow_spawns_of(MARKER_PREFAB);
        assert!(world.create_entity(MARKER_PREFAB, Vec3::default()).is_ok());
    }

    #[test]
    fn insert_with_id_rejects_live_id_and_reserves() {
        let mut world = SimWorld::new();
        let id = EntityId::new(42);
        world
            .insert_generator_with_id(id, Vec3::default(), OwnerId(1))
            .unwrap();
        assert!(matches!(
            world.insert_generator_with_id(id, Vec3::default(), OwnerId(1)),
            Err(HostError::IdInUse { .. })
        ));
        let next = world.spawn_generator(Vec3::default(), OwnerId(1));
        assert!(next.to_raw() > 42);
    }

    #[test]
    fn take_and_give_items() {
        let mut world = SimWorld::new();
        world.add_player(ALICE);
        world.give_items(ALICE, TECH_PARTS, 10);

        assert!(matches!(
            world.take(ALICE, TECH_PARTS, 11),
            Err(HostError::InsufficientItems { required: 11, available: 10, .. })
        ));
        world.take(ALICE, TECH_PARTS, 10).unwrap();
        assert_eq!(world.amount(ALICE, TECH_PARTS).unwrap(), 0);

        world.give(ALICE, TECH_PARTS, 3).unwrap();
        assert_eq!(world.item_count(ALICE, TECH_PARTS), 3);
    }

    #[test]
    fn unknown_item_is_an_error() {
        let world = SimWorld::new();
        assert!(matches!(
            world.amount(ALICE, "unobtainium"),
            Err(HostError::UnknownItem { .. })
        ));
    }

    #[test]
    fn view_target_ignores_dead_entities() {
        let mut world = SimWorld::new();
        world.add_player(ALICE);
        let g = world.spawn_generator(Vec3::default(), OwnerId(1));
        world.look_at(ALICE, g, 2.0);
        assert_eq!(
            world.view_target(ALICE),
            Some(RayHit {
                entity: g,
                distance: 2.0
            })
        );
        world.despawn(g);
        assert_eq!(world.view_target(ALICE), None);
    }

    #[test]
    fn permissions_and_chat() {
        let mut world = SimWorld::new();
        world.add_player(ALICE);
        world.register_permission("overload.use");
        assert!(world.is_permission_registered("overload.use"));
        assert!(!world.has_permission(ALICE, "overload.use"));
        world.grant_permission(ALICE, "overload.use");
        assert!(world.has_permission(ALICE, "overload.use"));

        world.send_message(ALICE, "hello");
        assert_eq!(world.messages(ALICE), ["hello".to_owned()]);
    }
}
