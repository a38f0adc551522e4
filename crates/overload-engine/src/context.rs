//! Process-wide override state.
//!
//! The [`OverloadContext`] bundles the session configuration, the
//! authoritative [`OverrideStore`] and the [`DataFile`] it is persisted to.
//! It is created once by the plugin after config and data have been loaded,
//! handed to the controller and reconciler by reference, and torn down with
//! a final flush when the plugin unloads. There is no global copy.

use overload_store::data_file::DataFile;
use overload_store::store::OverrideStore;
use overload_store::StoreError;

use crate::config::OverloadConfig;

/// Configuration + override store + persistence target.
#[derive(Debug)]
pub struct OverloadContext {
    config: OverloadConfig,
    store: OverrideStore,
    data_file: DataFile,
}

impl OverloadContext {
    /// Assemble a context from already-loaded parts.
    pub fn new(config: OverloadConfig, store: OverrideStore, data_file: DataFile) -> Self {
        Self {
            config,
            store,
            data_file,
        }
    }

    pub fn config(&self) -> &OverloadConfig {
        &self.config
    }

    pub fn store(&self) -> &OverrideStore {
        &self.store
    }

    pub(crate) fn store_mut(&mut self) -> &mut OverrideStore {
        &mut self.store
    }

    pub fn data_file(&self) -> &DataFile {
        &self.data_file
    }

    /// Write the store after a mutation.
    ///
    /// A failed write is logged and otherwise ignored: the in-memory store
    /// stays authoritative and the next save or checkpoint retries.
    /// Returns whether the write succeeded.
    pub fn persist(&self) -> bool {
        match self.data_file.save(&self.store) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "failed to persist override data");
                false
            }
        }
    }

    /// Explicit checkpoint requested by the host.
    pub fn checkpoint(&self) -> Result<(), StoreError> {
        self.data_file.save(&self.store)
    }

    /// Forget every override and persist the empty store.
    pub fn clear_overrides(&mut self) {
        let dropped = self.store.len();
        self.store.clear();
        self.persist();
        tracing::info!(dropped, "cleared override data");
    }

    /// Flush, then release the context.
    pub fn teardown(self) -> Result<(), StoreError> {
        self.data_file.save(&self.store)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
