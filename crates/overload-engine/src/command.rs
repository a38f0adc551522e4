//! The `/overload` chat command.
//!
//! The host dispatches the command with the raw argument list. Gating
//! happens here, before the controller is involved:
//!
//! - Without [`PERM_USE`] the command is silently ignored.
//! - The actor must be looking at a small generator no further than
//!   [`MAX_TARGET_DISTANCE`] away; anything else is silently ignored.
//! - A custom level is only read with exactly one argument and
//!   [`PERM_CUSTOM`]. An argument that is not an integer counts as `0`,
//!   which selects the standard level.
//!
//! Refusals the actor can act on (range, payment) are reported in chat.

use overload_host::entity::EntityId;
use overload_host::host::{Host, Simulation, Targeting};
use overload_host::identity::ActorId;

use crate::context::OverloadContext;
use crate::controller::{Generator, OverrideController, ToggleOutcome};
use crate::error::OverrideError;

/// Chat command name.
pub const COMMAND_NAME: &str = "overload";

/// Required to use the command at all.
pub const PERM_USE: &str = "overload.use";

/// Required to pass a custom level.
pub const PERM_CUSTOM: &str = "overload.custom";

/// Farthest a targeted generator may be from the actor's eyes.
pub const MAX_TARGET_DISTANCE: f32 = 5.0;

/// What a command invocation ended in.
#[derive(Debug)]
pub enum CommandOutcome {
    /// The actor lacks [`PERM_USE`].
    Denied,
    /// The actor is not looking at a generator within reach.
    NoTarget,
    /// The generator was flipped.
    Toggled(ToggleOutcome),
    /// The controller refused the request.
    Rejected(OverrideError),
}

/// Read the requested custom level from the command arguments.
///
/// Returns `None` when the standard level should be used.
pub fn parse_requested_level(args: &[&str], may_customize: bool) -> Option<i32> {
    match args {
        [arg] if may_customize => {
            let level = arg.trim().parse::<i32>().unwrap_or(0);
            (level != 0).then_some(level)
        }
        _ => None,
    }
}

/// Find the generator the actor is looking at, if it is close enough.
pub fn find_target<H: Simulation + Targeting + ?Sized>(host: &H, actor: ActorId) -> Option<Generator> {
    let hit = host.view_target(actor)?;
    if hit.distance > MAX_TARGET_DISTANCE {
        return None;
    }
    Generator::resolve(host, hit.entity).ok()
}

/// Chat text for a refusal the actor should hear about.
pub fn rejection_message(error: &OverrideError) -> Option<String> {
    match error {
        OverrideError::OutOfRange { max, .. } => {
            Some(format!("<color=orange>[Outside of range 0 - {max}]</color>"))
        }
        OverrideError::InsufficientResources {
            resource, required, ..
        } => Some(format!(
            "<color=orange>[{required}]</color> {resource} required!"
        )),
        _ => None,
    }
}

/// Handle one `/overload` invocation from `actor`.
pub fn run_command<H: Host + ?Sized>(
    ctx: &mut OverloadContext,
    host: &mut H,
    actor: ActorId,
    args: &[&str],
) -> CommandOutcome {
    if !host.has_permission(actor, PERM_USE) {
        tracing::debug!(actor = %actor, "overload command without permission");
        return CommandOutcome::Denied;
    }

    let Some(generator) = find_target(&*host, actor) else {
        return CommandOutcome::NoTarget;
    };

    let may_customize = host.has_permission(actor, PERM_CUSTOM);
    let requested = parse_requested_level(args, may_customize);

    match OverrideController::new(ctx).toggle(host, actor, generator, requested) {
        Ok(outcome) => CommandOutcome::Toggled(outcome),
        Err(e) => {
            if let Some(text) = rejection_message(&e) {
                host.send_message(actor, &text);
            }
            log_rejection(actor, generator.id(), &e);
            CommandOutcome::Rejected(e)
        }
    }
}

fn log_rejection(actor: ActorId, entity: EntityId, error: &OverrideError) {
    match error {
        OverrideError::OutOfRange { .. } | OverrideError::InsufficientResources { .. } => {
            tracing::debug!(actor = %actor, entity = %entity, error = %error, "override refused");
        }
        _ => tracing::warn!(actor = %actor, entity = %entity, error = %error, "override failed"),
    }
}
