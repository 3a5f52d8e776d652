//! Use cases (interactors) for KittyPress
//!
//! This module contains the application use cases that orchestrate
//! domain entities and port interfaces. Use cases are thin coordinators
//! that delegate business rules to domain methods and I/O to ports.
//!
//! ## Use Cases
//!
//! - [`StageInputsUseCase`] - Copies selected inputs into a staging area
//! - [`ArchivePipelineClient`] - Engine invocation and archive naming
//! - [`DestinationResolver`] - Parent folder inference and lookup
//! - [`TreeMirror`] - Writes local files and trees into destination folders
//! - [`DeferredSaveCoordinator`] - Single-slot deferred save and resume
//! - [`CompressUseCase`] / [`DecompressUseCase`] - Pipeline orchestration

pub mod archive_pipeline;
pub mod compress;
pub mod decompress;
pub mod deferred_save;
pub mod mirror_tree;
pub mod report;
pub mod resolve_destination;
pub mod settings;
pub mod stage_inputs;

pub use archive_pipeline::ArchivePipelineClient;
pub use compress::CompressUseCase;
pub use decompress::DecompressUseCase;
pub use deferred_save::{DeferOutcome, DeferredSaveCoordinator, ResumeOutcome};
pub use mirror_tree::{MirrorSummary, TreeMirror};
pub use report::{OperationReport, Outcome, ReportView};
pub use resolve_destination::DestinationResolver;
pub use settings::PipelineSettings;
pub use stage_inputs::StageInputsUseCase;
