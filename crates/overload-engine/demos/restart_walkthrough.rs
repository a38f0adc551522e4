//! Walk through an override surviving a server restart.
//!
//! Run with: `cargo run --example restart_walkthrough`
//!
//! Set `RUST_LOG=debug` to see per-generator reconciliation decisions.

use overload_engine::prelude::*;

const ADMIN: ActorId = ActorId(76561198000000001);

// ---------------------------------------------------------------------------
// Scene setup
// ---------------------------------------------------------------------------

fn fresh_server() -> (SimWorld, Vec<EntityId>) {
    let mut world = SimWorld::new();
    world.add_player(ADMIN);
    world.grant_permission(ADMIN, PERM_USE);
    world.grant_permission(ADMIN, PERM_CUSTOM);
    world.give_items(ADMIN, TECH_PARTS, 50);

    let generators = (0..3)
        .map(|i| world.spawn_generator(Vec3::new(i as f32 * 4.0, 0.0, 0.0), OwnerId(ADMIN.0)))
        .collect();
    (world, generators)
}

fn describe(world: &SimWorld, generators: &[EntityId]) {
    for &g in generators {
        match world.output(g) {
            Ok(output) => println!(
                "  {g}: output {output:>5}, markers {}, pickup {}",
                world.children(g, MARKER_PREFAB).len(),
                world.pickup_enabled(g).unwrap_or(false)
            ),
            Err(_) => println!("  {g}: destroyed"),
        }
    }
}

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let root = std::env::temp_dir().join("overload-restart-walkthrough");
    if root.exists() {
        std::fs::remove_dir_all(&root)?;
    }
    let paths = OverloadPaths::under(&root);

    // -- first run ----------------------------------------------------------

    let (mut world, generators) = fresh_server();
    let mut plugin = OverloadPlugin::init(&mut world, &paths)?;
    plugin.on_server_initialized(&mut world);

    world.look_at(ADMIN, generators[0], 2.0);
    plugin.handle_command(&mut world, ADMIN, &[]);
    world.look_at(ADMIN, generators[1], 2.0);
    plugin.handle_command(&mut world, ADMIN, &["1500"]);
    world.look_at(ADMIN, generators[2], 2.0);
    plugin.handle_command(&mut world, ADMIN, &["640"]);

    println!("after overrides:");
    describe(&world, &generators);

    // Generator 2 is raided before the next save.
    world.despawn(generators[2]);

    plugin.on_server_save();
    let save = world.capture_snapshot()?;
    plugin.unload()?;
    println!("server saved (hash {})", save.hash);

    // -- second run, crashed presentation ------------------------------------

    let mut world = SimWorld::restore_from_snapshot(&save)?;
    // The host came back without the override presentation on generator 0.
    remove_markers(&mut world, generators[0]);
    world.set_output(generators[0], DEFAULT_GENERATOR_OUTPUT)?;

    let mut plugin = OverloadPlugin::init(&mut world, &paths)?;
    if let Some(report) = plugin.on_server_initialized(&mut world) {
        println!(
            "reconciled: pruned {:?}, reapplied {:?}, skipped {:?}, failed {}",
            report.pruned,
            report.reapplied,
            report.skipped,
            report.failed.len()
        );
    }

    println!("after restart:");
    describe(&world, &generators);
    println!(
        "admin holds {} {}",
        world.item_count(ADMIN, TECH_PARTS),
        plugin.context().config().resource
    );

    plugin.unload()?;
    Ok(())
}
