//! Integration tests for the `/overload` command through the plugin.

use overload_engine::prelude::*;

const ALICE: ActorId = ActorId(7);
const BOB: ActorId = ActorId(8);

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

struct Server {
    _dir: tempfile::TempDir,
    world: SimWorld,
    plugin: OverloadPlugin,
    generator: EntityId,
}

impl Server {
    fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut world = SimWorld::new();
        for actor in [ALICE, BOB] {
            world.add_player(actor);
            world.give_items(actor, TECH_PARTS, 100);
        }
        world.grant_permission(ALICE, PERM_USE);
        world.grant_permission(ALICE, PERM_CUSTOM);
        world.grant_permission(BOB, PERM_USE);

        let generator = world.spawn_generator(Vec3::default(), OwnerId(1));
        let paths = OverloadPaths::under(dir.path());
        let mut plugin = OverloadPlugin::init(&mut world, &paths).unwrap();
        plugin.on_server_initialized(&mut world);

        Self {
            _dir: dir,
            world,
            plugin,
            generator,
        }
    }

    fn run(&mut self, actor: ActorId, args: &[&str]) -> CommandOutcome {
        self.plugin.handle_command(&mut self.world, actor, args)
    }

    fn output(&self) -> i32 {
        self.world.output(self.generator).unwrap()
    }
}

// ---------------------------------------------------------------------------
// Gating
// ---------------------------------------------------------------------------

#[test]
fn without_use_permission_nothing_happens() {
    let mut s = Server::start();
    let carol = ActorId(9);
    s.world.add_player(carol);
    s.world.give_items(carol, TECH_PARTS, 100);
    s.world.look_at(carol, s.generator, 1.0);

    assert!(matches!(s.run(carol, &[]), CommandOutcome::Denied));
    assert_eq!(s.output(), 100);
    assert!(s.world.messages(carol).is_empty());
}

#[test]
fn needs_a_generator_in_reach() {
    let mut s = Server::start();
    assert!(matches!(s.run(ALICE, &[]), CommandOutcome::NoTarget));

    s.world.look_at(ALICE, s.generator, MAX_TARGET_DISTANCE + 0.5);
    assert!(matches!(s.run(ALICE, &[]), CommandOutcome::NoTarget));

    let crate_box = s.world.spawn_prefab("assets/prefabs/misc/crate.prefab", Vec3::default());
    s.world.look_at(ALICE, crate_box, 1.0);
    assert!(matches!(s.run(ALICE, &[]), CommandOutcome::NoTarget));
    assert_eq!(s.output(), 100);
}

#[test]
fn target_at_exact_reach_is_accepted() {
    let mut s = Server::start();
    s.world.look_at(ALICE, s.generator, MAX_TARGET_DISTANCE);
    assert!(matches!(
        s.run(ALICE, &[]),
        CommandOutcome::Toggled(ToggleOutcome::Applied { level: 200, .. })
    ));
}

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

#[test]
fn custom_level_needs_elevated_permission() {
    let mut s = Server::start();
    s.world.look_at(BOB, s.generator, 1.0);
    s.run(BOB, &["750"]);
    assert_eq!(s.output(), 200);
}

#[test]
fn custom_level_with_elevated_permission() {
    let mut s = Server::start();
    s.world.look_at(ALICE, s.generator, 1.0);
    s.run(ALICE, &["750"]);
    assert_eq!(s.output(), 750);
    assert_eq!(s.plugin.context().store().get(s.generator), Some(750));
}

#[test]
fn non_numeric_argument_uses_standard_level() {
    let mut s = Server::start();
    s.world.look_at(ALICE, s.generator, 1.0);
    s.run(ALICE, &["max"]);
    assert_eq!(s.output(), 200);
}

#[test]
fn extra_arguments_fall_back_to_standard_level() {
    let mut s = Server::start();
    s.world.look_at(ALICE, s.generator, 1.0);
    s.run(ALICE, &["750", "now"]);
    assert_eq!(s.output(), 200);
}

// ---------------------------------------------------------------------------
// Feedback
// ---------------------------------------------------------------------------

#[test]
fn out_of_range_is_reported_in_chat() {
    let mut s = Server::start();
    s.world.look_at(ALICE, s.generator, 1.0);
    let outcome = s.run(ALICE, &["10000"]);
    assert!(matches!(
        outcome,
        CommandOutcome::Rejected(OverrideError::OutOfRange { .. })
    ));
    assert_eq!(
        s.world.messages(ALICE),
        ["<color=orange>[Outside of range 0 - 9999]</color>".to_owned()]
    );
    assert_eq!(s.world.item_count(ALICE, TECH_PARTS), 100);
}

#[test]
fn missing_parts_are_reported_in_chat() {
    let mut s = Server::start();
    let dave = ActorId(10);
    s.world.add_player(dave);
    s.world.give_items(dave, TECH_PARTS, 9);
    s.world.grant_permission(dave, PERM_USE);
    s.world.look_at(dave, s.generator, 1.0);

    s.run(dave, &[]);
    assert_eq!(
        s.world.messages(dave),
        ["<color=orange>[10]</color> techparts required!".to_owned()]
    );
    assert_eq!(s.output(), 100);
}

#[test]
fn second_invocation_reverts_and_refunds() {
    let mut s = Server::start();
    s.world.look_at(BOB, s.generator, 1.0);
    s.run(BOB, &[]);
    assert_eq!(s.world.item_count(BOB, TECH_PARTS), 90);

    let outcome = s.run(BOB, &[]);
    assert!(matches!(
        outcome,
        CommandOutcome::Toggled(ToggleOutcome::Reverted { refunded: 10, .. })
    ));
    assert_eq!(s.output(), 100);
    assert_eq!(s.world.item_count(BOB, TECH_PARTS), 100);
    assert!(s.plugin.context().store().is_empty());
}

#[test]
fn anyone_with_use_permission_can_revert() {
    let mut s = Server::start();
    s.world.look_at(ALICE, s.generator, 1.0);
    s.run(ALICE, &["500"]);

    s.world.look_at(BOB, s.generator, 1.0);
    s.run(BOB, &[]);
    assert_eq!(s.output(), 100);
    // The refund goes to whoever reverts.
    assert_eq!(s.world.item_count(BOB, TECH_PARTS), 110);
}
