//! Property tests for the reference host world.
//!
//! These tests use `proptest` to generate random sequences of spawn, attach
//! and despawn operations and verify that parent/child lifetimes and id
//! stability hold after each step.

use overload_host::prelude::*;
use proptest::prelude::*;

/// Operations we can perform on the world.
#[derive(Debug, Clone)]
enum WorldOp {
    SpawnGenerator,
    AttachMarker(usize),
    Despawn(usize),
    SaveAndRestore,
}

fn world_op_strategy() -> impl Strategy<Value = WorldOp> {
    prop_oneof![
        Just(WorldOp::SpawnGenerator),
        (0..50usize).prop_map(WorldOp::AttachMarker),
        (0..50usize).prop_map(WorldOp::Despawn),
        Just(WorldOp::SaveAndRestore),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn children_never_outlive_parents(ops in prop::collection::vec(world_op_strategy(), 1..40)) {
        let mut world = SimWorld::new();
        let mut generators: Vec<EntityId> = Vec::new();
        let mut dead: Vec<EntityId> = Vec::new();

        for op in ops {
            match op {
                WorldOp::SpawnGenerator => {
                    generators.push(world.spawn_generator(Vec3::default(), OwnerId(1)));
                }
                WorldOp::AttachMarker(idx) => {
                    if !generators.is_empty() {
                        let parent = generators[idx % generators.len()];
                        let marker = world.create_entity(MARKER_PREFAB, Vec3::default()).unwrap();
                        world.set_parent(marker, parent).unwrap();
                    }
                }
                WorldOp::Despawn(idx) => {
                    if !generators.is_empty() {
                        let e = generators.remove(idx % generators.len());
                        prop_assert!(world.despawn(e));
                        dead.push(e);
                    }
                }
                WorldOp::SaveAndRestore => {
                    let save = world.capture_snapshot().unwrap();
                    world = SimWorld::restore_from_snapshot(&save).unwrap();
                }
            }

            // Invariant: the host enumerates exactly the generators we track.
            let mut listed = world.generators();
            listed.sort();
            let mut tracked = generators.clone();
            tracked.sort();
            prop_assert_eq!(listed, tracked);

            // Invariant: nothing references a dead parent.
            for &d in &dead {
                prop_assert!(!world.is_alive(d));
                prop_assert!(world.children(d, MARKER_PREFAB).is_empty());
            }
        }
    }
}
