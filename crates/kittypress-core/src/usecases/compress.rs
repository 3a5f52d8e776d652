//! Compress use case
//!
//! Orchestrates one compress run: stage the selection, run the engine,
//! then write the archive next to the first selected input or defer the
//! save until the user grants a folder.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::domain::errors::PipelineError;
use crate::domain::input::InputSelection;
use crate::domain::naming::archive_file_name;
use crate::domain::pending::PendingSave;
use crate::ports::{ICompressionEngine, IScopedStorage, IStatusSink};

use super::archive_pipeline::ArchivePipelineClient;
use super::deferred_save::DeferredSaveCoordinator;
use super::mirror_tree::TreeMirror;
use super::report::OperationReport;
use super::resolve_destination::DestinationResolver;
use super::settings::PipelineSettings;
use super::stage_inputs::StageInputsUseCase;

/// Use case compressing a selection into one archive
pub struct CompressUseCase {
    stager: StageInputsUseCase,
    pipeline: ArchivePipelineClient,
    resolver: DestinationResolver,
    mirror: TreeMirror,
    status: Arc<dyn IStatusSink>,
    settings: PipelineSettings,
}

impl CompressUseCase {
    pub fn new(
        storage: Arc<dyn IScopedStorage>,
        engine: Arc<dyn ICompressionEngine>,
        status: Arc<dyn IStatusSink>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            stager: StageInputsUseCase::new(Arc::clone(&storage)),
            pipeline: ArchivePipelineClient::new(engine, Arc::clone(&storage)),
            resolver: DestinationResolver::new(
                Arc::clone(&storage),
                settings.primary_authority.clone(),
            ),
            mirror: TreeMirror::new(storage, settings.mime_type.clone()),
            status,
            settings,
        }
    }

    /// Runs the compress pipeline for `selection`
    ///
    /// Every failure is turned into the report; the final status line is
    /// also sent to the status sink.
    pub async fn run(
        &self,
        selection: &InputSelection,
        coordinator: &mut DeferredSaveCoordinator,
    ) -> OperationReport {
        self.status.status("Preparing to compress...");
        let report = match self.try_run(selection, coordinator).await {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, "Compress failed");
                OperationReport::failed(e)
            }
        };
        self.status.status(&report.message);
        report
    }

    async fn try_run(
        &self,
        selection: &InputSelection,
        coordinator: &mut DeferredSaveCoordinator,
    ) -> Result<OperationReport, PipelineError> {
        let millis = Utc::now().timestamp_millis();
        let staging_root = self.settings.cache_dir.join(format!("inputs_{millis}"));

        let staged = self.stager.stage(selection, &staging_root).await?;
        if staged.is_empty() {
            return Err(PipelineError::NoInputSelected);
        }

        let base = self.pipeline.archive_base_name(selection.first()).await;
        let name = archive_file_name(&base, &self.settings.extension);
        let output: PathBuf = self.settings.cache_dir.join(&name);

        self.pipeline.compress(&staged, &output).await?;

        let parent = match selection.destination_anchor() {
            Some(anchor) => self.resolver.resolve_parent(anchor.reference()).await,
            None => None,
        };

        let write = match &parent {
            Some(folder) => self
                .mirror
                .copy_file_into(&output, folder, &name)
                .await
                .map(|_| ()),
            None => Err(PipelineError::DestinationUnresolved),
        };

        match write {
            Ok(()) => {
                info!(name = %name, "Archive saved next to the first input");
                Ok(OperationReport::saved(format!("Archive saved: {name}")))
            }
            Err(e) => {
                // Any failed write is retried through a folder grant.
                let message = match &e {
                    PipelineError::DestinationUnresolved => "Choose folder to save archive",
                    _ => "Grant access to save archive",
                };
                warn!(name = %name, error = %e, "Archive save deferred");
                let deferred = coordinator.defer(PendingSave::archive(output, name, parent));
                Ok(OperationReport::awaiting(
                    deferred.request,
                    deferred.superseded,
                    message,
                ))
            }
        }
    }
}
