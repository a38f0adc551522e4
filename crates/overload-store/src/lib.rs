//! Overload Store - persisted generator overrides.
//!
//! This crate holds the authoritative override map and its durable copy.
//!
//! # Modules
//!
//! - [`store`]: In-memory `entity id -> power level` map with orphan pruning.
//! - [`data_file`]: Whole-document JSON persistence with atomic replace and
//!   forgiving load.

#![deny(unsafe_code)]

use std::path::PathBuf;

pub mod data_file;
pub mod store;

/// Errors produced while persisting or reading override data.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem access failed.
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The store could not be serialized.
    #[error("failed to serialize override data: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The file exists but is not a valid override document.
    #[error("failed to parse override data {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::data_file::DataFile;
    pub use crate::store::{OverrideRecord, OverrideStore};
    pub use crate::StoreError;
}
