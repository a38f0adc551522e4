//! Error types for override requests and configuration loading.

use std::path::PathBuf;

use overload_host::entity::EntityId;
use overload_host::HostError;

/// Why an override request was refused.
///
/// Every variant leaves the generator, the actor's inventory and the store
/// exactly as they were before the request.
#[derive(Debug, thiserror::Error)]
pub enum OverrideError {
    /// A custom level outside `0..=max` was requested.
    #[error("requested level {requested} is outside of range 0 - {max}")]
    OutOfRange { requested: i32, max: i32 },

    /// The actor cannot pay for the override.
    #[error("{required} {resource} required, {available} available")]
    InsufficientResources {
        resource: String,
        required: u32,
        available: u32,
    },

    /// The marker could not be created. The charge has been refunded.
    #[error("could not create marker for generator {entity}: {source}")]
    MarkerCreation {
        entity: EntityId,
        #[source]
        source: HostError,
    },

    /// The target exists but is not a generator.
    #[error("entity {entity} is not a generator")]
    NotAGenerator { entity: EntityId },

    /// The host rejected an entity access (usually: the entity is gone).
    #[error(transparent)]
    Host(#[from] HostError),
}

/// Errors produced while loading or writing the configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Filesystem access failed.
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration could not be serialized.
    #[error("failed to serialize config: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The values are self-contradictory.
    #[error("invalid config: {0}")]
    Invalid(String),
}
