//! Plugin lifecycle: init, host hooks, command entry, unload.
//!
//! The host drives an [`OverloadPlugin`] through these calls, in order:
//!
//! 1. [`OverloadPlugin::init`] registers permissions, loads the data file and
//!    config and builds the [`OverloadContext`].
//! 2. [`OverloadPlugin::on_server_initialized`] runs reconciliation once all
//!    entities are loaded.
//! 3. [`OverloadPlugin::handle_command`], [`OverloadPlugin::on_server_save`]
//!    and [`OverloadPlugin::on_new_save`] while the server runs.
//! 4. [`OverloadPlugin::unload`] flushes the store.

use std::path::{Path, PathBuf};

use overload_host::host::{Host, Permissions, Simulation};
use overload_host::identity::ActorId;
use overload_store::data_file::DataFile;

use crate::command::{run_command, CommandOutcome, COMMAND_NAME, PERM_CUSTOM, PERM_USE};
use crate::config::OverloadConfig;
use crate::context::OverloadContext;
use crate::reconciler::{ReconcileReport, Reconciler};

/// Name used for the config and data files.
pub const PLUGIN_NAME: &str = "Overload";

/// Where the plugin keeps its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverloadPaths {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl OverloadPaths {
    /// Config and data side by side under `root`.
    pub fn under(root: &Path) -> Self {
        Self {
            config_dir: root.join("config"),
            data_dir: root.join("data"),
        }
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(format!("{PLUGIN_NAME}.json"))
    }
}

/// A loaded plugin instance.
#[derive(Debug)]
pub struct OverloadPlugin {
    ctx: OverloadContext,
    reconciled: bool,
}

impl OverloadPlugin {
    /// Load config and data and register permissions.
    ///
    /// A missing or corrupt data file starts an empty store. A config that
    /// cannot be read or written, or that fails validation, aborts init.
    pub fn init<P: Permissions + ?Sized>(
        host: &mut P,
        paths: &OverloadPaths,
    ) -> Result<Self, anyhow::Error> {
        host.register_permission(PERM_USE);
        host.register_permission(PERM_CUSTOM);

        let data_file = DataFile::new(&paths.data_dir, PLUGIN_NAME);
        if let Err(e) = data_file.ensure_exists() {
            tracing::warn!(path = %data_file.path().display(), error = %e, "could not create data file");
        }
        let store = data_file.load();

        let config_path = paths.config_file();
        let config = OverloadConfig::load_or_init(&config_path).map_err(|e| {
            anyhow::anyhow!("failed to load config {}: {e}", config_path.display())
        })?;

        tracing::info!(
            overrides = store.len(),
            standard_level = config.standard_level,
            cost = config.cost,
            resource = %config.resource,
            command = COMMAND_NAME,
            "overload plugin initialized"
        );
        Ok(Self {
            ctx: OverloadContext::new(config, store, data_file),
            reconciled: false,
        })
    }

    /// Host finished loading the world: reconcile once.
    ///
    /// Later calls are ignored and return `None`.
    pub fn on_server_initialized<S: Simulation + ?Sized>(
        &mut self,
        host: &mut S,
    ) -> Option<ReconcileReport> {
        if self.reconciled {
            tracing::debug!("reconciliation already ran");
            return None;
        }
        self.reconciled = true;
        Some(self.reconcile(host))
    }

    /// Run a reconciliation pass regardless of earlier ones.
    pub fn reconcile<S: Simulation + ?Sized>(&mut self, host: &mut S) -> ReconcileReport {
        Reconciler::new(&mut self.ctx).run(host)
    }

    /// Host save signal.
    pub fn on_server_save(&self) {
        if let Err(e) = self.ctx.checkpoint() {
            tracing::warn!(error = %e, "override checkpoint failed");
        }
    }

    /// The host started a fresh world; every saved id is meaningless now.
    pub fn on_new_save(&mut self) {
        self.ctx.clear_overrides();
    }

    /// `/overload` from `actor`.
    pub fn handle_command<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        actor: ActorId,
        args: &[&str],
    ) -> CommandOutcome {
        run_command(&mut self.ctx, host, actor, args)
    }

    pub fn context(&self) -> &OverloadContext {
        &self.ctx
    }

    /// Flush and drop.
    pub fn unload(self) -> Result<(), anyhow::Error> {
        let path = self.ctx.data_file().path().to_path_buf();
        self.ctx
            .teardown()
            .map_err(|e| anyhow::anyhow!("failed to flush {}: {e}", path.display()))?;
        tracing::info!("overload plugin unloaded");
        Ok(())
    }
}
