//! Decompress use case
//!
//! Copies an archive into the local cache, extracts it, and mirrors the
//! extracted tree into the folder containing the archive. Permission
//! problems defer the save; any other mirror failure ends the run.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::domain::errors::PipelineError;
use crate::domain::naming::sanitize_segment;
use crate::domain::newtypes::DocumentRef;
use crate::domain::pending::PendingSave;
use crate::ports::{ICompressionEngine, IScopedStorage, IStatusSink};

use super::archive_pipeline::ArchivePipelineClient;
use super::deferred_save::DeferredSaveCoordinator;
use super::mirror_tree::TreeMirror;
use super::report::OperationReport;
use super::resolve_destination::DestinationResolver;
use super::settings::PipelineSettings;

fn staging_error(err: impl std::fmt::Display) -> PipelineError {
    PipelineError::StagingIo(err.to_string())
}

/// Use case extracting one archive into the folder that contains it
pub struct DecompressUseCase {
    storage: Arc<dyn IScopedStorage>,
    pipeline: ArchivePipelineClient,
    resolver: DestinationResolver,
    mirror: TreeMirror,
    status: Arc<dyn IStatusSink>,
    settings: PipelineSettings,
}

impl DecompressUseCase {
    pub fn new(
        storage: Arc<dyn IScopedStorage>,
        engine: Arc<dyn ICompressionEngine>,
        status: Arc<dyn IStatusSink>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            pipeline: ArchivePipelineClient::new(engine, Arc::clone(&storage)),
            resolver: DestinationResolver::new(
                Arc::clone(&storage),
                settings.primary_authority.clone(),
            ),
            mirror: TreeMirror::new(Arc::clone(&storage), settings.mime_type.clone()),
            storage,
            status,
            settings,
        }
    }

    /// Runs the decompress pipeline for `archive`
    pub async fn run(
        &self,
        archive: &DocumentRef,
        coordinator: &mut DeferredSaveCoordinator,
    ) -> OperationReport {
        let report = match self.try_run(archive, coordinator).await {
            Ok(report) => report,
            Err(e) => {
                warn!(archive = %archive, error = %e, "Decompress failed");
                OperationReport::failed(e)
            }
        };
        self.status.status(&report.message);
        report
    }

    async fn try_run(
        &self,
        archive: &DocumentRef,
        coordinator: &mut DeferredSaveCoordinator,
    ) -> Result<OperationReport, PipelineError> {
        let name = self.archive_name(archive).await;
        let millis = Utc::now().timestamp_millis();
        let local_archive = self
            .settings
            .cache_dir
            .join(format!("in_{millis}_{}", sanitize_segment(&name)));
        self.fetch(archive, &local_archive).await?;

        let out_dir = self.settings.cache_dir.join(format!("out_{millis}"));
        tokio::fs::create_dir_all(&out_dir)
            .await
            .map_err(staging_error)?;

        self.status.status("Running decompress...");
        let root = self.pipeline.decompress(&local_archive, &out_dir).await?;

        let parent = self.resolver.resolve_parent(archive).await;
        let write = match &parent {
            Some(folder) => self.mirror.mirror(&root, folder).await.map(|_| ()),
            None => Err(PipelineError::DestinationUnresolved),
        };

        match write {
            Ok(()) => {
                info!(archive = %archive, "Extracted files saved next to the archive");
                Ok(OperationReport::saved("Saved to folder."))
            }
            Err(e) if e.is_recoverable() => {
                let message = match &e {
                    PipelineError::DestinationUnresolved => "Pick folder to save extracted files",
                    _ => "Grant permission to save files",
                };
                warn!(archive = %archive, error = %e, "Extracted files save deferred");
                let deferred = coordinator.defer(PendingSave::extracted(root, parent));
                Ok(OperationReport::awaiting(
                    deferred.request,
                    deferred.superseded,
                    message,
                ))
            }
            Err(e) => Err(e),
        }
    }

    async fn archive_name(&self, archive: &DocumentRef) -> String {
        let known = match self.storage.stat(archive).await {
            Ok(Some(info)) => info.name,
            _ => None,
        };
        known
            .or_else(|| archive.id().file_name().map(str::to_string))
            .unwrap_or_else(|| format!("archive.{}", self.settings.extension))
    }

    /// Copies the archive into the local cache
    async fn fetch(&self, archive: &DocumentRef, local: &Path) -> Result<(), PipelineError> {
        if let Some(dir) = local.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(staging_error)?;
        }
        let mut reader = self
            .storage
            .open_read(archive)
            .await
            .map_err(staging_error)?;
        let mut file = tokio::fs::File::create(local)
            .await
            .map_err(staging_error)?;
        let bytes = tokio::io::copy(&mut reader, &mut file)
            .await
            .map_err(staging_error)?;
        file.flush().await.map_err(staging_error)?;
        debug!(archive = %archive, local = %local.display(), bytes, "Fetched archive");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::domain::errors::EngineOperation;
    use crate::domain::newtypes::DocumentId;
    use crate::testing::{FakeEngine, MemoryStorage, RecordingSink, AUTHORITY};
    use crate::usecases::report::Outcome;

    struct Harness {
        storage: MemoryStorage,
        engine: Arc<FakeEngine>,
        sink: Arc<RecordingSink>,
        usecase: DecompressUseCase,
        cache: TempDir,
    }

    fn harness(engine: FakeEngine) -> Harness {
        let storage = MemoryStorage::new();
        let engine = Arc::new(engine);
        let sink = Arc::new(RecordingSink::default());
        let cache = TempDir::new().unwrap();
        let settings = PipelineSettings {
            cache_dir: cache.path().to_path_buf(),
            extension: "kitty".to_string(),
            mime_type: "application/octet-stream".to_string(),
            primary_authority: AUTHORITY.to_string(),
        };
        let usecase = DecompressUseCase::new(
            Arc::new(storage.clone()),
            engine.clone(),
            sink.clone(),
            settings,
        );
        Harness {
            storage,
            engine,
            sink,
            usecase,
            cache,
        }
    }

    #[tokio::test]
    async fn extracts_next_to_archive() {
        let h = harness(FakeEngine::new());
        let archive = h.storage.add_file("Download/a.kitty", b"KITTY");
        let mut coordinator = DeferredSaveCoordinator::new(None);

        let report = h.usecase.run(&archive, &mut coordinator).await;

        assert_eq!(report.outcome, Outcome::Saved);
        assert_eq!(report.message, "Saved to folder.");
        assert_eq!(h.storage.read("Download/a.txt").unwrap(), b"alpha");
        assert_eq!(h.storage.read("Download/sub/b.txt").unwrap(), b"beta");
        assert_eq!(
            h.sink.messages(),
            ["Running decompress...", "Saved to folder."]
        );

        let calls = h.engine.calls();
        let (op, inputs, out_dir) = &calls[0];
        assert_eq!(op, "decompress");
        let local = inputs[0].file_name().unwrap().to_string_lossy().into_owned();
        assert!(local.starts_with("in_") && local.ends_with("_a.kitty"));
        assert!(out_dir.starts_with(h.cache.path()));
        assert!(out_dir
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("out_"));
    }

    #[tokio::test]
    async fn engine_failure_is_reported() {
        let h = harness(FakeEngine::new().with_root(None, false));
        let archive = h.storage.add_file("a.kitty", b"KITTY");
        let mut coordinator = DeferredSaveCoordinator::new(None);

        let report = h.usecase.run(&archive, &mut coordinator).await;
        assert_eq!(
            report.outcome,
            Outcome::Failed(PipelineError::EngineFailure {
                operation: EngineOperation::Decompress
            })
        );
        assert_eq!(report.message, "Decompress failed.");
    }

    #[tokio::test]
    async fn missing_root_is_incomplete_and_skips_mirror() {
        let h = harness(FakeEngine::new().with_root(Some("ghost"), false));
        let archive = h.storage.add_file("a.kitty", b"KITTY");
        let mut coordinator = DeferredSaveCoordinator::new(None);

        let report = h.usecase.run(&archive, &mut coordinator).await;
        assert!(matches!(
            report.outcome,
            Outcome::Failed(PipelineError::ExtractionIncomplete { .. })
        ));
        assert_eq!(report.message, "Extraction incomplete.");
        assert!(h.storage.ops().is_empty());
    }

    #[tokio::test]
    async fn locked_folder_defers_with_suggestion() {
        let h = harness(FakeEngine::new());
        let archive = h.storage.add_file("Locked/a.kitty", b"KITTY");
        h.storage.lock_tree("Locked");
        let mut coordinator = DeferredSaveCoordinator::new(None);

        let report = h.usecase.run(&archive, &mut coordinator).await;
        assert_eq!(report.message, "Grant permission to save files");
        let request = report.permission_request().unwrap();
        assert_eq!(
            request.initial_folder.as_ref().unwrap().id().as_str(),
            "primary:Locked"
        );
        assert_eq!(request.target_name, "KittyPress_out");

        let folder = request.initial_folder.clone().unwrap();
        let outcome = coordinator.resume(&folder, &h.usecase.mirror).await;
        assert_eq!(outcome.status_message(), "Saved → KittyPress_out");
        assert_eq!(h.storage.read("Locked/sub/b.txt").unwrap(), b"beta");
    }

    #[tokio::test]
    async fn unknown_parent_asks_for_folder() {
        let h = harness(FakeEngine::new());
        h.storage.set_parent_queries(false);
        h.storage.add_file("a.kitty", b"KITTY");
        let archive = DocumentRef::document("media", DocumentId::new("primary:a.kitty").unwrap());
        let mut coordinator = DeferredSaveCoordinator::new(None);

        let report = h.usecase.run(&archive, &mut coordinator).await;
        assert_eq!(report.message, "Pick folder to save extracted files");
        assert!(coordinator.pending().is_some());
    }

    #[tokio::test]
    async fn non_permission_mirror_failure_is_not_deferred() {
        let h = harness(FakeEngine::new());
        let archive = h.storage.add_file("Download/a.kitty", b"KITTY");
        h.storage.add_file("Download/sub", b"in the way");
        let mut coordinator = DeferredSaveCoordinator::new(None);

        let report = h.usecase.run(&archive, &mut coordinator).await;
        assert!(matches!(
            report.outcome,
            Outcome::Failed(PipelineError::MirrorWrite(_))
        ));
        assert!(report.message.starts_with("Error: "));
        assert!(coordinator.pending().is_none());
    }

    #[tokio::test]
    async fn unreadable_archive_is_staging_error() {
        let h = harness(FakeEngine::new());
        let missing =
            DocumentRef::document(AUTHORITY, DocumentId::new("primary:gone.kitty").unwrap());
        let mut coordinator = DeferredSaveCoordinator::new(None);

        let report = h.usecase.run(&missing, &mut coordinator).await;
        assert!(matches!(
            report.outcome,
            Outcome::Failed(PipelineError::StagingIo(_))
        ));
        assert!(h.engine.calls().is_empty());
    }
}
