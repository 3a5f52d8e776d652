//! Archive Pipeline Client
//!
//! Thin wrapper around the compression engine port that derives archive
//! names and turns the engine's raw result signals into [`PipelineError`]s.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info};

use crate::domain::errors::{EngineOperation, PipelineError};
use crate::domain::input::InputItem;
use crate::domain::naming::{base_name_for, fallback_base_name};
use crate::ports::{ICompressionEngine, IScopedStorage};

/// Returns true if `name` is one plain path segment (no `..`, root or separator)
fn is_single_entry(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Client for the external compression engine
pub struct ArchivePipelineClient {
    engine: Arc<dyn ICompressionEngine>,
    storage: Arc<dyn IScopedStorage>,
}

impl ArchivePipelineClient {
    pub fn new(engine: Arc<dyn ICompressionEngine>, storage: Arc<dyn IScopedStorage>) -> Self {
        Self { engine, storage }
    }

    /// Base name of the archive produced for a selection starting with `first`
    ///
    /// Uses the item's display name, or the provider's name for it. Files
    /// lose their last extension, folders keep their full name. Falls back
    /// to `archive_<millis>` when no usable name exists.
    pub async fn archive_base_name(&self, first: Option<&InputItem>) -> String {
        let Some(item) = first else {
            return fallback_base_name(Utc::now());
        };

        let name = match item.display_name() {
            Some(name) => Some(name.to_string()),
            None => match self.storage.stat(item.reference()).await {
                Ok(Some(info)) => info.name,
                _ => item.reference().id().file_name().map(str::to_string),
            },
        };

        name.and_then(|n| base_name_for(&n, item.kind()))
            .unwrap_or_else(|| fallback_base_name(Utc::now()))
    }

    /// Runs the engine over `staged` and writes the archive to `output`
    ///
    /// # Errors
    ///
    /// [`PipelineError::EngineFailure`] when the engine returns a non-zero code.
    pub async fn compress(&self, staged: &[PathBuf], output: &Path) -> Result<(), PipelineError> {
        debug!(inputs = staged.len(), output = %output.display(), "Invoking compression engine");
        let code = self.engine.compress(staged, output).await;
        if code != 0 {
            error!(code, output = %output.display(), "Compression engine failed");
            return Err(PipelineError::EngineFailure {
                operation: EngineOperation::Compress,
            });
        }
        info!(output = %output.display(), "Archive created");
        Ok(())
    }

    /// Extracts `archive` into `output_dir` and returns the extracted root entry
    ///
    /// # Errors
    ///
    /// - [`PipelineError::EngineFailure`] when the engine reports no root entry
    /// - [`PipelineError::ExtractionIncomplete`] when the reported entry does not
    ///   exist or is not a plain name directly inside `output_dir`
    pub async fn decompress(
        &self,
        archive: &Path,
        output_dir: &Path,
    ) -> Result<PathBuf, PipelineError> {
        debug!(archive = %archive.display(), "Invoking decompression engine");
        let Some(root_name) = self.engine.decompress(archive, output_dir).await else {
            error!(archive = %archive.display(), "Decompression engine failed");
            return Err(PipelineError::EngineFailure {
                operation: EngineOperation::Decompress,
            });
        };

        let root = output_dir.join(&root_name);
        let exists = is_single_entry(&root_name)
            && tokio::fs::try_exists(&root).await.unwrap_or(false);
        if !exists {
            error!(expected = %root.display(), "Engine reported an entry that does not exist");
            return Err(PipelineError::ExtractionIncomplete { expected: root });
        }

        info!(root = %root.display(), "Archive extracted");
        Ok(root)
    }
}
