//! Boot-time reconciliation of saved overrides against the live world.
//!
//! After the host has loaded every entity, [`Reconciler::run`]:
//!
//! 1. Collects the ids of all live generators.
//! 2. Drops saved entries for generators that no longer exist and persists
//!    the pruned store.
//! 3. For every surviving entry whose generator sits at the default output,
//!    kills any leftover marker (a crash can leave one behind without the
//!    output change, or the output change without the marker) and re-runs
//!    [`apply_override`] with the saved level. Nothing is charged and the
//!    store is not touched.
//!
//! Generators whose output already differs from the default are skipped.
//! A generator that cannot be re-applied keeps its store entry so the next
//! boot tries again.

use std::collections::BTreeSet;

use overload_host::entity::EntityId;
use overload_host::host::Simulation;
use overload_host::HostError;

use crate::context::OverloadContext;
use crate::controller::{apply_override, remove_markers, Generator};

// ---------------------------------------------------------------------------
// ReconcileReport
// ---------------------------------------------------------------------------

/// What a reconciliation pass did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    /// Number of live generators seen.
    pub live: usize,
    /// Saved entries removed because their generator is gone.
    pub pruned: Vec<EntityId>,
    /// Generators put back into their overridden state.
    pub reapplied: Vec<EntityId>,
    /// Generators left alone because their output was not the default.
    pub skipped: Vec<EntityId>,
    /// Generators that could not be re-applied; their entries are kept.
    pub failed: Vec<(EntityId, HostError)>,
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

/// Diffs the override store against the live simulation.
pub struct Reconciler<'a> {
    ctx: &'a mut OverloadContext,
}

impl<'a> Reconciler<'a> {
    pub fn new(ctx: &'a mut OverloadContext) -> Self {
        Self { ctx }
    }

    /// Run one reconciliation pass.
    pub fn run<S: Simulation + ?Sized>(&mut self, host: &mut S) -> ReconcileReport {
        let live: BTreeSet<EntityId> = host.generators().into_iter().collect();
        let mut report = ReconcileReport {
            live: live.len(),
            ..ReconcileReport::default()
        };

        report.pruned = self.ctx.store_mut().retain_live(|id| live.contains(&id));
        for id in &report.pruned {
            tracing::warn!(entity = %id, "removed missing generator from saved overrides");
        }
        self.ctx.persist();

        let default_level = self.ctx.config().default_level;
        let saved: Vec<(EntityId, i32)> = self
            .ctx
            .store()
            .records()
            .map(|r| (r.entity_id, r.power_level))
            .collect();

        for (id, level) in saved {
            let output = match host.output(id) {
                Ok(output) => output,
                Err(e) => {
                    tracing::warn!(entity = %id, error = %e, "saved generator not readable");
                    report.failed.push((id, e));
                    continue;
                }
            };
            if output != default_level {
                tracing::debug!(entity = %id, output, "generator already overridden, skipping");
                report.skipped.push(id);
                continue;
            }

            let stale = remove_markers(host, id);
            if stale > 0 {
                tracing::debug!(entity = %id, stale, "removed leftover markers");
            }

            match apply_override(host, Generator::listed(id), level) {
                Ok(_) => {
                    tracing::info!(entity = %id, level, "restored saved override");
                    report.reapplied.push(id);
                }
                Err(e) => {
                    tracing::warn!(
                        entity = %id,
                        level,
                        error = %e,
                        "could not restore saved override, keeping entry for next boot"
                    );
                    report.failed.push((id, e));
                }
            }
        }

        tracing::info!(
            live = report.live,
            pruned = report.pruned.len(),
            reapplied = report.reapplied.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "override reconciliation finished"
        );
        report
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OverloadConfig;
    use overload_host::prelude::*;
    use overload_store::data_file::DataFile;
    use overload_store::store::OverrideStore;

    fn context(dir: &std::path::Path, entries: &[(u64, i32)]) -> OverloadContext {
        let mut store = OverrideStore::new();
        for &(id, level) in entries {
            store.put(EntityId::new(id), level);
        }
        OverloadContext::new(
            OverloadConfig::default(),
            store,
            DataFile::new(dir, "Overload"),
        )
    }

    fn world_with(ids: &[u64]) -> SimWorld {
        let mut world = SimWorld::new();
        for &id in ids {
            world
                .insert_generator_with_id(EntityId::new(id), Vec3::default(), OwnerId(1))
                .unwrap();
        }
        world
    }

    #[test]
    fn prunes_orphans_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(dir.path(), &[(1, 200), (2, 150), (3, 300)]);
        let mut world = world_with(&[2]);

        let report = Reconciler::new(&mut ctx).run(&mut world);
        assert_eq!(report.live, 1);
        assert_eq!(report.pruned, vec![EntityId::new(1), EntityId::new(3)]);
        assert_eq!(report.reapplied, vec![EntityId::new(2)]);
        assert_eq!(ctx.store().ids().collect::<Vec<_>>(), vec![EntityId::new(2)]);
        assert_eq!(ctx.data_file().load(), *ctx.store());
    }

    #[test]
    fn skips_generators_not_at_default() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(dir.path(), &[(2, 150)]);
        let mut world = world_with(&[2]);
        world.set_output(EntityId::new(2), 175).unwrap();

        let report = Reconciler::new(&mut ctx).run(&mut world);
        assert_eq!(report.skipped, vec![EntityId::new(2)]);
        assert!(report.reapplied.is_empty());
        assert_eq!(world.output(EntityId::new(2)).unwrap(), 175);
        assert!(world.children(EntityId::new(2), MARKER_PREFAB).is_empty());
    }

    #[test]
    fn replaces_leftover_marker() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(dir.path(), &[(5, 400)]);
        let mut world = world_with(&[5]);
        let g = EntityId::new(5);
        let stale = world.create_entity(MARKER_PREFAB, Vec3::default()).unwrap();
        world.set_parent(stale, g).unwrap();

        Reconciler::new(&mut ctx).run(&mut world);
        let markers = world.children(g, MARKER_PREFAB);
        assert_eq!(markers.len(), 1);
        assert_ne!(markers[0], stale);
        assert_eq!(world.output(g).unwrap(), 400);
    }

    #[test]
    fn failed_reapply_keeps_entry() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(dir.path(), &[(5, 400)]);
        let mut world = world_with(&[5]);
        world.fail_spawns_of(MARKER_PREFAB);

        let report = Reconciler::new(&mut ctx).run(&mut world);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, EntityId::new(5));
        assert_eq!(ctx.store().get(EntityId::new(5)), Some(400));
        assert_eq!(world.output(EntityId::new(5)).unwrap(), 100);

        // Next attempt succeeds once the host can spawn markers again.
        world.allow_spawns_of(MARKER_PREFAB);
        let report = Reconciler::new(&mut ctx).run(&mut world);
        assert_eq!(report.reapplied, vec![EntityId::new(5)]);
    }

    #[test]
    fn empty_store_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(dir.path(), &[]);
        let mut world = world_with(&[1, 2]);
        let report = Reconciler::new(&mut ctx).run(&mut world);
        assert_eq!(
            report,
            ReconcileReport {
                live: 2,
                ..ReconcileReport::default()
            }
        );
    }
}
