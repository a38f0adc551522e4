//! Durable storage for the [`OverrideStore`].
//!
//! A [`DataFile`] is one JSON document named after the plugin inside the
//! host's data directory. Every save replaces the whole document: the new
//! contents are written to a sibling temp file which is then renamed over
//! the target, so a crash mid-write leaves either the old or the new file,
//! never a torn one.
//!
//! Loading is forgiving. A missing or unparseable file yields an empty store
//! and a warning, because losing overrides is preferable to refusing to boot.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::store::OverrideStore;
use crate::StoreError;

/// A named, whole-document JSON file holding an [`OverrideStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFile {
    path: PathBuf,
}

impl DataFile {
    /// The data file `<dir>/<name>.json`.
    pub fn new(dir: impl AsRef<Path>, name: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{name}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Write an empty store if no file exists yet.
    pub fn ensure_exists(&self) -> Result<(), StoreError> {
        if self.exists() {
            return Ok(());
        }
        tracing::info!(path = %self.path.display(), "creating empty data file");
        self.save(&OverrideStore::new())
    }

    /// Read the store, distinguishing "missing" from "broken".
    ///
    /// Returns `Ok(None)` if the file does not exist.
    pub fn try_load(&self) -> Result<Option<OverrideStore>, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        let store = serde_json::from_slice::<OverrideStore>(&bytes).map_err(|source| {
            StoreError::Parse {
                path: self.path.clone(),
                source,
            }
        })?;
        Ok(Some(store))
    }

    /// Read the store; never fails.
    ///
    /// Missing data is an empty store. Unreadable or corrupt data is logged
    /// and also treated as an empty store.
    pub fn load(&self) -> OverrideStore {
        match self.try_load() {
            Ok(Some(store)) => {
                tracing::info!(
                    path = %self.path.display(),
                    overrides = store.len(),
                    "loaded override data"
                );
                store
            }
            Ok(None) => OverrideStore::new(),
            Err(e) => {
                tracing::warn!(error = %e, "override data unreadable, starting with an empty store");
                OverrideStore::new()
            }
        }
    }

    /// Atomically replace the file with `store`.
    pub fn save(&self, store: &OverrideStore) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let bytes = serde_json::to_vec_pretty(store).map_err(StoreError::Serialize)?;
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, bytes).map_err(|source| StoreError::Io {
            path: temp_path.clone(),
            source,
        })?;
        fs::rename(&temp_path, &self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        tracing::trace!(path = %self.path.display(), overrides = store.len(), "saved override data");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
