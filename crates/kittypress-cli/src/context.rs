//! Wiring shared by the pipeline commands
//!
//! Loads the configuration and builds the adapters every command needs: the
//! local scoped storage (with its persisted grants), the archiver engine and
//! the pending-save store.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use kittypress_core::config::Config;
use kittypress_core::ports::IStatusSink;
use kittypress_core::usecases::{
    CompressUseCase, DecompressUseCase, DeferredSaveCoordinator, PipelineSettings, TreeMirror,
};
use kittypress_engine::CommandEngine;
use kittypress_storage::{GrantStore, LocalScopedStorage};
use tracing::{debug, info};

use crate::output::{Output, OutputFormat};
use crate::state::{PendingStore, GRANTS_FILE};

/// Resolves the config file location from the global `--config` flag
pub fn config_path(flag: Option<&Path>) -> PathBuf {
    flag.map(Path::to_path_buf)
        .unwrap_or_else(Config::default_path)
}

/// Global flags every command receives
#[derive(Debug, Clone)]
pub struct Invocation {
    pub format: OutputFormat,
    pub quiet: bool,
    pub config_path: PathBuf,
}

impl Invocation {
    pub fn load_context(&self) -> Result<AppContext> {
        AppContext::load(&self.config_path)
    }

    pub fn output(&self) -> Output {
        Output::new(self.format, self.quiet)
    }

    pub fn status_sink(&self) -> Arc<dyn IStatusSink> {
        Arc::new(ConsoleStatusSink(self.output()))
    }
}

/// Status sink printing progress lines to stderr
pub struct ConsoleStatusSink(Output);

impl IStatusSink for ConsoleStatusSink {
    fn status(&self, message: &str) {
        debug!(status = %message, "Pipeline status");
        self.0.progress(message);
    }
}

/// Loaded configuration plus the adapters built from it
pub struct AppContext {
    pub settings: PipelineSettings,
    pub storage: Arc<LocalScopedStorage>,
    pub engine: Arc<CommandEngine>,
    pub pending: PendingStore,
}

impl AppContext {
    /// Loads the configuration at `path` and opens the storage volume
    ///
    /// A missing config file falls back to defaults; an unreadable or invalid
    /// one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            Config::load(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?
        } else {
            debug!(config_path = %path.display(), "No configuration file, using defaults");
            Config::default()
        };

        let errors = config.validate();
        if !errors.is_empty() {
            let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
            anyhow::bail!("Invalid configuration: {}", messages.join("; "));
        }

        Self::from_config(&config)
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let settings = PipelineSettings::from_config(config);
        let state_dir = Config::expand_path(&config.storage.state_dir);
        let root = Config::expand_path(&config.storage.root);

        let grants = GrantStore::load(&state_dir.join(GRANTS_FILE))
            .context("Failed to load folder grants")?;
        let storage = LocalScopedStorage::open(&root, &settings.primary_authority, grants)
            .context("Failed to open storage volume")?;
        let engine = CommandEngine::new(&config.engine.program);

        info!(
            root = %storage.root().display(),
            state_dir = %state_dir.display(),
            engine = %config.engine.program,
            "KittyPress context ready"
        );

        Ok(Self {
            settings,
            storage: Arc::new(storage),
            engine: Arc::new(engine),
            pending: PendingStore::new(&state_dir),
        })
    }

    pub fn compress_usecase(&self, status: Arc<dyn IStatusSink>) -> CompressUseCase {
        CompressUseCase::new(
            self.storage.clone(),
            self.engine.clone(),
            status,
            self.settings.clone(),
        )
    }

    pub fn decompress_usecase(&self, status: Arc<dyn IStatusSink>) -> DecompressUseCase {
        DecompressUseCase::new(
            self.storage.clone(),
            self.engine.clone(),
            status,
            self.settings.clone(),
        )
    }

    pub fn tree_mirror(&self) -> TreeMirror {
        TreeMirror::new(self.storage.clone(), self.settings.mime_type.clone())
    }

    /// Restores the coordinator from the pending-save record
    pub fn coordinator(&self) -> Result<DeferredSaveCoordinator> {
        Ok(DeferredSaveCoordinator::new(self.pending.load()?))
    }

    /// Persists whatever the coordinator still holds
    pub fn persist(&self, coordinator: DeferredSaveCoordinator) -> Result<()> {
        self.pending.store(coordinator.into_pending().as_ref())
    }
}
