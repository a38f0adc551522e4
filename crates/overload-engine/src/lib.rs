//! Overload Engine -- generator power overrides that survive restarts.
//!
//! This crate builds on [`overload_host`] and [`overload_store`] to provide
//! the override logic: an actor-driven apply/revert controller, a boot-time
//! reconciler that brings the live world back in line with the saved
//! overrides, the `/overload` command and the plugin lifecycle around them.
//!
//! # Quick Start
//!
//! ```
//! use overload_engine::prelude::*;
//!
//! let dir = std::env::temp_dir().join("overload-doc-quickstart");
//! # let _ = std::fs::remove_dir_all(&dir);
//! let paths = OverloadPaths::under(&dir);
//!
//! let mut world = SimWorld::new();
//! let alice = ActorId(1);
//! world.add_player(alice);
//! world.grant_permission(alice, PERM_USE);
//! world.give_items(alice, TECH_PARTS, 10);
//!
//! let generator = world.spawn_generator(Vec3::default(), OwnerId(1));
//! world.look_at(alice, generator, 2.0);
//!
//! let mut plugin = OverloadPlugin::init(&mut world, &paths).unwrap();
//! plugin.on_server_initialized(&mut world);
//!
//! plugin.handle_command(&mut world, alice, &[]);
//! assert_eq!(world.output(generator).unwrap(), 200);
//!
//! plugin.unload().unwrap();
//! # let _ = std::fs::remove_dir_all(&dir);
//! ```

#![deny(unsafe_code)]

pub mod command;
pub mod config;
pub mod context;
pub mod controller;
pub mod error;
pub mod plugin;
pub mod reconciler;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the host crate for convenience.
pub use overload_host;

/// Re-export the store crate for convenience.
pub use overload_store;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    pub use overload_host::prelude::*;
    pub use overload_store::prelude::*;

    pub use crate::command::{
        find_target, parse_requested_level, rejection_message, run_command, CommandOutcome,
        COMMAND_NAME, MAX_TARGET_DISTANCE, PERM_CUSTOM, PERM_USE,
    };
    pub use crate::config::OverloadConfig;
    pub use crate::context::OverloadContext;
    pub use crate::controller::{
        apply_override, remove_markers, resolve_level, Generator, GeneratorState,
        OverrideController, ToggleOutcome,
    };
    pub use crate::error::{ConfigError, OverrideError};
    pub use crate::plugin::{OverloadPaths, OverloadPlugin, PLUGIN_NAME};
    pub use crate::reconciler::{ReconcileReport, Reconciler};
}
