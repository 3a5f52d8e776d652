//! Tree Mirror
//!
//! Reconciles a local file or directory tree into a destination folder of
//! the scoped storage provider.
//!
//! ## Design Notes
//!
//! - Overwrite policy is delete-then-create: an existing same-named file is
//!   deleted before the new one is created and streamed. Re-running a mirror
//!   with unchanged inputs yields the same destination tree, but a run is not
//!   atomic.
//! - Directories are find-or-create and never duplicated. An existing file
//!   occupying a directory name aborts the run.
//! - The walk is worklist-based and sorted by name, so writes happen in a
//!   deterministic order, parents before children.
//! - The first failure aborts the remaining walk; entries written so far
//!   stay in place.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use crate::domain::errors::{PipelineError, StorageError};
use crate::domain::naming::{sanitize_or, FALLBACK_DIR_NAME, FALLBACK_FILE_NAME};
use crate::domain::newtypes::DocumentRef;
use crate::ports::IScopedStorage;

/// What a mirror run wrote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MirrorSummary {
    pub files_written: usize,
    pub directories_created: usize,
}

/// Writes local files and trees into destination folders
pub struct TreeMirror {
    storage: Arc<dyn IScopedStorage>,
    mime_type: String,
}

fn local_error(path: &Path, err: std::io::Error) -> PipelineError {
    PipelineError::MirrorWrite(format!("{}: {err}", path.display()))
}

fn entry_name(path: &Path, fallback: &str) -> String {
    let name = path.file_name().map(|n| n.to_string_lossy());
    sanitize_or(name.as_deref(), fallback)
}

impl TreeMirror {
    pub fn new(storage: Arc<dyn IScopedStorage>, mime_type: impl Into<String>) -> Self {
        Self {
            storage,
            mime_type: mime_type.into(),
        }
    }

    /// The provider this mirror writes to
    pub fn storage(&self) -> &Arc<dyn IScopedStorage> {
        &self.storage
    }

    /// Copies the local file `local` into `folder` as `name`
    ///
    /// Any existing entry named `name` is deleted first.
    ///
    /// # Errors
    ///
    /// [`PipelineError::PermissionDenied`] when the provider rejects a write
    /// for lack of a grant, [`PipelineError::MirrorWrite`] otherwise.
    #[instrument(skip(self, local, folder), fields(folder = %folder))]
    pub async fn copy_file_into(
        &self,
        local: &Path,
        folder: &DocumentRef,
        name: &str,
    ) -> Result<DocumentRef, PipelineError> {
        let mut source = tokio::fs::File::open(local)
            .await
            .map_err(|e| local_error(local, e))?;

        self.replace_file(&mut source, folder, name)
            .await
            .map_err(PipelineError::from_destination_write)
    }

    async fn replace_file(
        &self,
        source: &mut tokio::fs::File,
        folder: &DocumentRef,
        name: &str,
    ) -> Result<DocumentRef, StorageError> {
        if let Some(existing) = self.storage.find_by_name(folder, name).await? {
            debug!(name, "Deleting existing destination entry");
            self.storage.delete(&existing.reference).await?;
        }

        let created = self
            .storage
            .create_file(folder, &self.mime_type, name)
            .await?
            .ok_or_else(|| StorageError::Refused(format!("could not create file {name}")))?;

        let mut writer = self.storage.open_write(&created).await?;
        let bytes = tokio::io::copy(source, &mut writer).await?;
        writer.shutdown().await?;
        debug!(name, bytes, "Wrote destination file");
        Ok(created)
    }

    /// Mirrors `local_root` into `destination`
    ///
    /// A single file is copied under its own (sanitized) name. For a
    /// directory, its contents are reproduced directly under `destination`.
    #[instrument(skip(self, destination), fields(destination = %destination, root = %local_root.display()))]
    pub async fn mirror(
        &self,
        local_root: &Path,
        destination: &DocumentRef,
    ) -> Result<MirrorSummary, PipelineError> {
        let metadata = tokio::fs::metadata(local_root)
            .await
            .map_err(|e| local_error(local_root, e))?;

        let mut summary = MirrorSummary::default();
        if metadata.is_file() {
            let name = entry_name(local_root, FALLBACK_FILE_NAME);
            self.copy_file_into(local_root, destination, &name).await?;
            summary.files_written = 1;
            info!(name = %name, "Mirrored single file");
            return Ok(summary);
        }

        let mut folders: HashMap<Vec<String>, DocumentRef> = HashMap::new();
        folders.insert(Vec::new(), destination.clone());

        // (local directory, sanitized segments relative to local_root)
        let mut pending = vec![(local_root.to_path_buf(), Vec::<String>::new())];
        while let Some((dir, segments)) = pending.pop() {
            let mut entries = Vec::new();
            let mut read_dir = tokio::fs::read_dir(&dir)
                .await
                .map_err(|e| local_error(&dir, e))?;
            while let Some(entry) = read_dir
                .next_entry()
                .await
                .map_err(|e| local_error(&dir, e))?
            {
                entries.push(entry.path());
            }
            entries.sort();

            let mut subdirs = Vec::new();
            for path in entries {
                let file_type = tokio::fs::metadata(&path)
                    .await
                    .map_err(|e| local_error(&path, e))?;
                if file_type.is_dir() {
                    let mut sub = segments.clone();
                    sub.push(entry_name(&path, FALLBACK_DIR_NAME));
                    self.ensure_folder(&sub, &mut folders, &mut summary)
                        .await
                        .map_err(PipelineError::from_destination_write)?;
                    subdirs.push((path, sub));
                } else {
                    let folder = self
                        .ensure_folder(&segments, &mut folders, &mut summary)
                        .await
                        .map_err(PipelineError::from_destination_write)?;
                    let name = entry_name(&path, FALLBACK_FILE_NAME);
                    self.copy_file_into(&path, &folder, &name).await?;
                    summary.files_written += 1;
                }
            }
            // Reverse so the stack pops subdirectories in name order.
            pending.extend(subdirs.into_iter().rev());
        }

        info!(
            files = summary.files_written,
            directories = summary.directories_created,
            "Mirrored tree"
        );
        Ok(summary)
    }

    /// Walks `segments` below the destination, creating missing folders
    async fn ensure_folder(
        &self,
        segments: &[String],
        folders: &mut HashMap<Vec<String>, DocumentRef>,
        summary: &mut MirrorSummary,
    ) -> Result<DocumentRef, StorageError> {
        if let Some(found) = folders.get(segments) {
            return Ok(found.clone());
        }

        let mut depth = segments.len();
        while !folders.contains_key(&segments[..depth]) {
            depth -= 1;
        }
        let mut current = folders[&segments[..depth]].clone();

        for end in depth + 1..=segments.len() {
            let name = &segments[end - 1];
            current = match self.storage.find_by_name(&current, name).await? {
                Some(info) if info.is_directory => info.reference.as_tree(),
                Some(_) => {
                    warn!(name = %name, "A file occupies the directory name");
                    return Err(StorageError::Refused(format!(
                        "{name} exists and is not a directory"
                    )));
                }
                None => {
                    let created = self
                        .storage
                        .create_directory(&current, name)
                        .await?
                        .ok_or_else(|| {
                            StorageError::Refused(format!("could not create directory {name}"))
                        })?;
                    summary.directories_created += 1;
                    debug!(name = %name, "Created destination directory");
                    created.as_tree()
                }
            };
            folders.insert(segments[..end].to_vec(), current.clone());
        }
        Ok(current)
    }
}
