//! Apply/revert transitions for a single generator.
//!
//! A generator is in one of two states:
//!
//! - **Default**: output equals the configured default, no marker, pickup
//!   allowed.
//! - **Overridden**: output was set by an override, a marker child exists,
//!   pickup is disabled, and the store holds the applied level.
//!
//! [`OverrideController::toggle`] is the only entry point for actors. It
//! reads the current state synchronously and flips it:
//!
//! 1. Overridden -> revert: restore the default output, drop the store entry,
//!    kill the marker, re-enable pickup, refund if configured.
//! 2. Default -> apply: resolve the level, charge the cost, run
//!    [`apply_override`], record the level, play the upgrade effect.
//!
//! A refused apply leaves no trace: range and payment checks happen before
//! anything is touched, and a marker that cannot be created triggers a
//! refund of the charge just taken.

use overload_host::entity::EntityId;
use overload_host::host::{EntityFlag, Inventory, Simulation};
use overload_host::identity::{ActorId, EntityKind, MARKER_PREFAB, UPGRADE_EFFECT};
use overload_host::HostError;

use crate::config::OverloadConfig;
use crate::context::OverloadContext;
use crate::error::OverrideError;

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// An entity id that has been checked to be a live generator.
///
/// Produced at the host boundary so the controller never re-checks kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Generator(EntityId);

impl Generator {
    /// Classify `id` through the host.
    ///
    /// # Errors
    ///
    /// [`OverrideError::Host`] if the entity is gone,
    /// [`OverrideError::NotAGenerator`] if it is something else.
    pub fn resolve<S: Simulation + ?Sized>(host: &S, id: EntityId) -> Result<Self, OverrideError> {
        match host.kind(id) {
            Some(EntityKind::Generator) => Ok(Self(id)),
            Some(EntityKind::Other) => Err(OverrideError::NotAGenerator { entity: id }),
            None => Err(HostError::UnknownEntity { entity: id }.into()),
        }
    }

    /// Wrap an id the host itself listed as a generator.
    pub(crate) fn listed(id: EntityId) -> Self {
        Self(id)
    }

    pub fn id(self) -> EntityId {
        self.0
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Observed override state of a generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    Default,
    Overridden { output: i32 },
}

/// Outcome of a successful [`OverrideController::toggle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The generator now runs at `level`.
    Applied { entity: EntityId, level: i32 },
    /// The generator is back to default; `refunded` items were returned.
    Reverted { entity: EntityId, refunded: u32 },
}

/// Pick the level an apply request targets.
///
/// `None` and `Some(0)` both mean "standard level".
pub fn resolve_level(config: &OverloadConfig, requested: Option<i32>) -> Result<i32, OverrideError> {
    match requested {
        None | Some(0) => Ok(config.standard_level),
        Some(level) if (0..=config.max_custom_level).contains(&level) => Ok(level),
        Some(level) => Err(OverrideError::OutOfRange {
            requested: level,
            max: config.max_custom_level,
        }),
    }
}

// ---------------------------------------------------------------------------
// Apply primitive
// ---------------------------------------------------------------------------

/// Put `generator` into the overridden presentation at `level`.
///
/// Creates the marker inside the generator, detaches it from every
/// destruction trigger except its parent, and switches it to powered with a
/// weak spark. Then sets the output, blocks pickup, propagates the output to
/// wired consumers and pushes an immediate network update.
///
/// Does not charge, does not touch the store, and does not check state:
/// callers guarantee the generator is in its default state without a marker.
/// If anything fails after the marker exists, the marker is killed again.
///
/// Returns the marker's id.
pub fn apply_override<S: Simulation + ?Sized>(
    host: &mut S,
    generator: Generator,
    level: i32,
) -> Result<EntityId, HostError> {
    let id = generator.id();
    let position = host.position(id)?;
    let owner = host.owner(id)?;
    let marker = host.create_entity(MARKER_PREFAB, position)?;

    let configured = (|| {
        host.strip_destroy_triggers(marker)?;
        host.set_owner(marker, owner)?;
        host.set_pickup_enabled(marker, false)?;
        host.set_flag(marker, EntityFlag::HasPower, true)?;
        host.set_flag(marker, EntityFlag::WeakShorting, true)?;
        host.set_parent(marker, id)?;
        host.set_position(marker, position)?;

        host.set_output(id, level)?;
        host.set_pickup_enabled(id, false)?;
        host.propagate_outputs(id)?;
        host.send_network_update(id)
    })();

    if let Err(e) = configured {
        host.despawn(marker);
        return Err(e);
    }
    Ok(marker)
}

/// Kill every marker attached to `id`. Returns how many were removed.
pub fn remove_markers<S: Simulation + ?Sized>(host: &mut S, id: EntityId) -> usize {
    host.children(id, MARKER_PREFAB)
        .into_iter()
        .filter(|marker| host.despawn(*marker))
        .count()
}

// ---------------------------------------------------------------------------
// OverrideController
// ---------------------------------------------------------------------------

/// Actor-driven apply/revert on top of an [`OverloadContext`].
pub struct OverrideController<'a> {
    ctx: &'a mut OverloadContext,
}

impl<'a> OverrideController<'a> {
    pub fn new(ctx: &'a mut OverloadContext) -> Self {
        Self { ctx }
    }

    /// Read the generator's state from what the host shows.
    ///
    /// A generator counts as overridden when its output differs from the
    /// configured default or a marker is attached (an applied custom level
    /// may equal the default). A store entry alone does not count: it may be
    /// left over from a reapply that failed at boot.
    pub fn state<S: Simulation + ?Sized>(
        &self,
        host: &S,
        generator: Generator,
    ) -> Result<GeneratorState, HostError> {
        let id = generator.id();
        let output = host.output(id)?;
        let marked = !host.children(id, MARKER_PREFAB).is_empty();
        if output != self.ctx.config().default_level || marked {
            Ok(GeneratorState::Overridden { output })
        } else {
            Ok(GeneratorState::Default)
        }
    }

    /// Flip the generator between default and overridden.
    ///
    /// `requested` is the custom level; `None` or `Some(0)` selects the
    /// standard level. It is ignored when reverting.
    pub fn toggle<H: Simulation + Inventory + ?Sized>(
        &mut self,
        host: &mut H,
        actor: ActorId,
        generator: Generator,
        requested: Option<i32>,
    ) -> Result<ToggleOutcome, OverrideError> {
        match self.state(&*host, generator)? {
            GeneratorState::Overridden { .. } => self.revert(host, actor, generator),
            GeneratorState::Default => self.apply(host, actor, generator, requested),
        }
    }

    fn revert<H: Simulation + Inventory + ?Sized>(
        &mut self,
        host: &mut H,
        actor: ActorId,
        generator: Generator,
    ) -> Result<ToggleOutcome, OverrideError> {
        let id = generator.id();
        let config = self.ctx.config().clone();

        host.set_output(id, config.default_level)?;
        host.propagate_outputs(id)?;
        if self.ctx.store_mut().remove(id).is_some() {
            self.ctx.persist();
        }
        remove_markers(host, id);
        host.set_pickup_enabled(id, true)?;

        let mut refunded = 0;
        if config.refund_on_revert && config.cost > 0 && host.is_connected(actor) {
            match host.give(actor, &config.resource, config.cost) {
                Ok(()) => refunded = config.cost,
                Err(e) => {
                    tracing::warn!(actor = %actor, error = %e, "refund on revert failed");
                }
            }
        }

        tracing::info!(entity = %id, actor = %actor, refunded, "override reverted");
        Ok(ToggleOutcome::Reverted {
            entity: id,
            refunded,
        })
    }

    fn apply<H: Simulation + Inventory + ?Sized>(
        &mut self,
        host: &mut H,
        actor: ActorId,
        generator: Generator,
        requested: Option<i32>,
    ) -> Result<ToggleOutcome, OverrideError> {
        let id = generator.id();
        let config = self.ctx.config().clone();
        let level = resolve_level(&config, requested)?;

        charge(host, actor, &config)?;

        if let Err(source) = apply_override(host, generator, level) {
            refund(host, actor, &config);
            tracing::warn!(entity = %id, error = %source, "marker creation failed, charge refunded");
            return Err(OverrideError::MarkerCreation { entity: id, source });
        }

        self.ctx.store_mut().put(id, level);
        self.ctx.persist();

        match host.position(id) {
            Ok(position) => host.run_effect(UPGRADE_EFFECT, position),
            Err(e) => tracing::debug!(entity = %id, error = %e, "no position for upgrade effect"),
        }

        tracing::info!(entity = %id, actor = %actor, level, "override applied");
        Ok(ToggleOutcome::Applied { entity: id, level })
    }
}

// ---------------------------------------------------------------------------
// Payment helpers
// ---------------------------------------------------------------------------

fn charge<I: Inventory + ?Sized>(
    host: &mut I,
    actor: ActorId,
    config: &OverloadConfig,
) -> Result<(), OverrideError> {
    if config.cost == 0 {
        return Ok(());
    }
    let insufficient = |available: u32| OverrideError::InsufficientResources {
        resource: config.resource.clone(),
        required: config.cost,
        available,
    };
    let available = match host.amount(actor, &config.resource) {
        Ok(available) => available,
        Err(e) => {
            tracing::warn!(resource = %config.resource, error = %e, "cost resource unavailable");
            return Err(insufficient(0));
        }
    };
    if available < config.cost {
        return Err(insufficient(available));
    }
    host.take(actor, &config.resource, config.cost)
        .map_err(|_| insufficient(available))
}

fn refund<I: Inventory + ?Sized>(host: &mut I, actor: ActorId, config: &OverloadConfig) {
    if config.cost == 0 {
        return;
    }
    if let Err(e) = host.give(actor, &config.resource, config.cost) {
        tracing::warn!(actor = %actor, error = %e, "refund after failed apply did not go through");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
