//! Staging Stager use case
//!
//! Materializes every selected input as a local copy inside a staging area
//! so the compression engine can work on plain paths.
//!
//! ## Design Notes
//!
//! - Folder trees are copied with an explicit worklist, not recursion.
//! - Every path segment goes through [`sanitize_segment`]; entries without
//!   a name fall back to `folder`, `dir` or `file`.
//! - The first failing item aborts the step. Partially staged entries stay
//!   on disk for the cache eviction policy to clean up.
//! - Inputs with the same sanitized name share one staged path. The later
//!   one overwrites the earlier copy, a warning is logged and the path is
//!   reported once.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::domain::errors::{PipelineError, StorageError};
use crate::domain::input::{InputItem, InputSelection};
use crate::domain::naming::{
    sanitize_or, FALLBACK_DIR_NAME, FALLBACK_FILE_NAME, FALLBACK_FOLDER_NAME,
};
use crate::domain::newtypes::DocumentRef;
use crate::ports::IScopedStorage;

fn staging_error(err: impl std::fmt::Display) -> PipelineError {
    PipelineError::StagingIo(err.to_string())
}

/// Use case copying selected inputs into a staging area
pub struct StageInputsUseCase {
    storage: Arc<dyn IScopedStorage>,
}

impl StageInputsUseCase {
    /// Creates a new StageInputsUseCase reading from `storage`
    pub fn new(storage: Arc<dyn IScopedStorage>) -> Self {
        Self { storage }
    }

    /// Copies every input of `selection` into `staging_root`
    ///
    /// Returns the absolute staged paths: folders first in selection order,
    /// then files in selection order, each path listed once. An empty
    /// selection yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::StagingIo`] if any input cannot be read or
    /// written locally.
    pub async fn stage(
        &self,
        selection: &InputSelection,
        staging_root: &Path,
    ) -> Result<Vec<PathBuf>, PipelineError> {
        tokio::fs::create_dir_all(staging_root)
            .await
            .map_err(staging_error)?;

        let mut staged = Vec::with_capacity(selection.len());
        let mut seen = HashSet::new();
        for item in selection.staging_order() {
            let path = if item.is_folder() {
                self.stage_folder(item, staging_root).await?
            } else {
                self.stage_file(item, staging_root).await?
            };
            if !seen.insert(path.clone()) {
                warn!(
                    input = %item.reference(),
                    staged = %path.display(),
                    "Staged name collides with an earlier input; later copy wins"
                );
                continue;
            }
            debug!(input = %item.reference(), staged = %path.display(), "Staged input");
            staged.push(path);
        }

        info!(
            count = staged.len(),
            root = %staging_root.display(),
            "Staging complete"
        );
        Ok(staged)
    }

    async fn display_name(&self, item: &InputItem) -> Option<String> {
        if let Some(name) = item.display_name() {
            return Some(name.to_string());
        }
        match self.storage.stat(item.reference()).await {
            Ok(Some(info)) => info.name,
            _ => item.reference().id().file_name().map(str::to_string),
        }
    }

    async fn stage_file(
        &self,
        item: &InputItem,
        staging_root: &Path,
    ) -> Result<PathBuf, PipelineError> {
        let name = sanitize_or(self.display_name(item).await.as_deref(), FALLBACK_FILE_NAME);
        let out = staging_root.join(name);
        self.copy_file(item.reference(), &out).await?;
        Ok(out)
    }

    async fn stage_folder(
        &self,
        item: &InputItem,
        staging_root: &Path,
    ) -> Result<PathBuf, PipelineError> {
        let name = sanitize_or(
            self.display_name(item).await.as_deref(),
            FALLBACK_FOLDER_NAME,
        );
        let dest = staging_root.join(name);
        tokio::fs::create_dir_all(&dest)
            .await
            .map_err(staging_error)?;
        self.copy_tree(item.reference(), &dest).await?;
        Ok(dest)
    }

    /// Copies the tree at `source` into the existing directory `dest`
    ///
    /// A source that turns out to be a single file is copied inside `dest`.
    async fn copy_tree(&self, source: &DocumentRef, dest: &Path) -> Result<(), PipelineError> {
        let root = self
            .storage
            .stat(source)
            .await
            .map_err(staging_error)?
            .ok_or_else(|| staging_error(StorageError::NotFound(source.to_string())))?;

        if !root.is_directory {
            let name = sanitize_or(root.name.as_deref(), FALLBACK_FILE_NAME);
            return self.copy_file(source, &dest.join(name)).await;
        }

        let mut pending = vec![(source.clone(), dest.to_path_buf())];
        while let Some((dir, local_dir)) = pending.pop() {
            let children = self
                .storage
                .list_children(&dir)
                .await
                .map_err(staging_error)?;
            for child in children {
                if child.is_directory {
                    let sub = local_dir.join(sanitize_or(child.name.as_deref(), FALLBACK_DIR_NAME));
                    tokio::fs::create_dir_all(&sub)
                        .await
                        .map_err(staging_error)?;
                    pending.push((child.reference, sub));
                } else {
                    let out =
                        local_dir.join(sanitize_or(child.name.as_deref(), FALLBACK_FILE_NAME));
                    self.copy_file(&child.reference, &out).await?;
                }
            }
        }
        Ok(())
    }

    async fn copy_file(&self, source: &DocumentRef, out: &Path) -> Result<(), PipelineError> {
        let mut reader = self
            .storage
            .open_read(source)
            .await
            .map_err(staging_error)?;
        let mut file = tokio::fs::File::create(out)
            .await
            .map_err(staging_error)?;
        let bytes = tokio::io::copy(&mut reader, &mut file)
            .await
            .map_err(staging_error)?;
        file.flush().await.map_err(staging_error)?;
        debug!(source = %source, bytes, "Copied input file");
        Ok(())
    }
}
