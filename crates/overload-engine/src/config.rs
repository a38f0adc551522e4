//! Plugin configuration.
//!
//! [`OverloadConfig`] is read once when the plugin initializes and is
//! read-only afterwards. It lives as pretty JSON next to the other plugin
//! configs. A missing file is created with defaults; a file that does not
//! parse is replaced by defaults (with a warning). Individual missing fields
//! fall back to their defaults. Older files using the long labelled keys
//! (`"Power Level : "` and friends) are still accepted.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// OverloadConfig
// ---------------------------------------------------------------------------

/// Session-wide override parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverloadConfig {
    /// Output of an untouched generator. Must mirror the host's default.
    #[serde(alias = "Default Power Level : ")]
    pub default_level: i32,
    /// Level applied when no custom level is requested.
    #[serde(alias = "Power Level : ")]
    pub standard_level: i32,
    /// Highest custom level an elevated actor may request.
    #[serde(alias = "Max Custom Power Level : ")]
    pub max_custom_level: i32,
    /// Items charged per override.
    #[serde(alias = "Upgrade Cost : ")]
    pub cost: u32,
    /// Item short name charged.
    #[serde(alias = "Upgrade Parts : ")]
    pub resource: String,
    /// Give the cost back when an override is reverted.
    #[serde(alias = "Refund Parts : ")]
    pub refund_on_revert: bool,
}

impl Default for OverloadConfig {
    /// Defaults to 100 -> 200 for 10 techparts, custom levels up to 9999,
    /// refunds on.
    fn default() -> Self {
        Self {
            default_level: 100,
            standard_level: 200,
            max_custom_level: 9999,
            cost: 10,
            resource: "techparts".to_owned(),
            refund_on_revert: true,
        }
    }
}

impl OverloadConfig {
    /// Check the values for contradictions.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_custom_level < 0 {
            return Err(ConfigError::Invalid(format!(
                "max_custom_level must be >= 0, got {}",
                self.max_custom_level
            )));
        }
        if self.standard_level == self.default_level {
            return Err(ConfigError::Invalid(format!(
                "standard_level ({}) must differ from default_level",
                self.standard_level
            )));
        }
        if self.resource.trim().is_empty() {
            return Err(ConfigError::Invalid("resource must not be empty".to_owned()));
        }
        Ok(())
    }

    /// Load the config at `path`, creating or repairing it with defaults.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors other than "not found", and when the loaded values
    /// do not pass [`validate`](Self::validate).
    pub fn load_or_init(path: &Path) -> Result<Self, ConfigError> {
        let config = match fs::read(path) {
            Ok(bytes) => match serde_json::from_slice::<OverloadConfig>(&bytes) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "config unreadable, writing defaults"
                    );
                    let config = OverloadConfig::default();
                    config.save(path)?;
                    config
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no config found, writing defaults");
                let config = OverloadConfig::default();
                config.save(path)?;
                config
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Write the config as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
