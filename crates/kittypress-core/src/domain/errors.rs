//! Domain error types
//!
//! This module defines the error vocabulary shared by the core:
//! - [`DomainError`] for validation failures of domain values
//! - [`StorageError`] for failures reported by a scoped storage provider
//! - [`PipelineError`] for the failures a compress/decompress run can end with

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while constructing or validating domain values
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid document identifier (expected `<volume>:<relative/path>`)
    #[error("Invalid document id: {0}")]
    InvalidDocumentId(String),

    /// Invalid document reference string
    #[error("Invalid document reference: {0}")]
    InvalidReference(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

/// Errors reported by a scoped storage provider
///
/// Every provider operation may fail because write access to the tree has
/// not been granted, because the addressed entry vanished, or because the
/// provider declined the request for its own reasons.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The caller holds no (write) permission for the addressed tree
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The addressed entry does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The provider declined the request
    #[error("Provider refused: {0}")]
    Refused(String),

    /// An I/O error occurred while talking to the provider
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Returns true if the failure is a missing permission grant
    pub fn is_permission_denied(&self) -> bool {
        match self {
            StorageError::PermissionDenied(_) => true,
            StorageError::Io(e) => e.kind() == std::io::ErrorKind::PermissionDenied,
            _ => false,
        }
    }
}

/// Which engine call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineOperation {
    Compress,
    Decompress,
}

impl std::fmt::Display for EngineOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineOperation::Compress => write!(f, "compress"),
            EngineOperation::Decompress => write!(f, "decompress"),
        }
    }
}

/// Failures a compress or decompress pipeline run can end with
///
/// All variants are caught at the orchestration boundary and turned into a
/// single status line (see [`PipelineError::status_message`]). Only
/// [`PipelineError::DestinationUnresolved`] and
/// [`PipelineError::PermissionDenied`] are recoverable, through the deferred
/// save path.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// Nothing was selected, or every selected input was empty
    #[error("No input selected")]
    NoInputSelected,

    /// Copy failure while materializing an input in the staging area
    #[error("Failed to stage input: {0}")]
    StagingIo(String),

    /// The engine returned a non-zero code (compress) or no root entry (decompress)
    #[error("Compression engine {operation} failed")]
    EngineFailure {
        /// The engine call that failed
        operation: EngineOperation,
    },

    /// The engine reported success but its expected output is absent
    #[error("Extraction incomplete: {} does not exist", expected.display())]
    ExtractionIncomplete {
        /// The root entry the engine claimed to have created
        expected: PathBuf,
    },

    /// No writable destination folder could be determined
    #[error("No destination folder could be determined")]
    DestinationUnresolved,

    /// A write to a resolved destination was rejected
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// A step of the destination reconciliation failed
    #[error("Failed to write destination: {0}")]
    MirrorWrite(String),
}

impl PipelineError {
    /// Returns true if the failure is recovered by asking the user for a folder
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PipelineError::DestinationUnresolved | PipelineError::PermissionDenied(_)
        )
    }

    /// Maps a storage failure during destination writes to the pipeline taxonomy
    pub fn from_destination_write(err: StorageError) -> Self {
        if err.is_permission_denied() {
            PipelineError::PermissionDenied(err.to_string())
        } else {
            PipelineError::MirrorWrite(err.to_string())
        }
    }

    /// Human-readable status line shown to the user
    pub fn status_message(&self) -> String {
        match self {
            PipelineError::NoInputSelected => "No input selected.".to_string(),
            PipelineError::EngineFailure {
                operation: EngineOperation::Compress,
            } => "Compression failed.".to_string(),
            PipelineError::EngineFailure {
                operation: EngineOperation::Decompress,
            } => "Decompress failed.".to_string(),
            PipelineError::ExtractionIncomplete { .. } => "Extraction incomplete.".to_string(),
            PipelineError::DestinationUnresolved => "Choose a destination folder".to_string(),
            PipelineError::PermissionDenied(_) => "Grant access to the destination".to_string(),
            PipelineError::StagingIo(detail) | PipelineError::MirrorWrite(detail) => {
                format!("Error: {detail}")
            }
        }
    }
}
