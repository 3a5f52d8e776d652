//! Deferred save records
//!
//! A [`PendingSave`] holds an artifact that was produced locally but could
//! not be written to its destination yet, because no writable folder was
//! known or the write was rejected. It survives the pause while the user is
//! asked to grant access to a folder, and is serializable so a caller can
//! persist it across processes.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::newtypes::{DocumentRef, RequestToken};

/// The locally produced payload waiting for a destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PendingArtifact {
    /// A compressed archive to copy into the folder under `name`
    Archive {
        /// Local path of the produced archive
        path: PathBuf,
        /// Final name in the destination folder
        name: String,
    },
    /// An extracted file or directory tree to mirror into the folder
    ExtractedTree {
        /// Local path of the extracted root entry
        root: PathBuf,
    },
}

impl PendingArtifact {
    /// Name the artifact will appear under (for trees, the extracted root name)
    pub fn target_name(&self) -> String {
        match self {
            PendingArtifact::Archive { name, .. } => name.clone(),
            PendingArtifact::ExtractedTree { root } => root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }

    /// Local path of the payload
    pub fn local_path(&self) -> &Path {
        match self {
            PendingArtifact::Archive { path, .. } => path,
            PendingArtifact::ExtractedTree { root } => root,
        }
    }
}

/// An artifact awaiting a folder grant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSave {
    token: RequestToken,
    artifact: PendingArtifact,
    /// Folder the picker should open at (the destination that was rejected)
    suggested_folder: Option<DocumentRef>,
    deferred_at: DateTime<Utc>,
}

impl PendingSave {
    /// Creates a pending save with a fresh request token
    pub fn new(artifact: PendingArtifact, suggested_folder: Option<DocumentRef>) -> Self {
        Self {
            token: RequestToken::new(),
            artifact,
            suggested_folder,
            deferred_at: Utc::now(),
        }
    }

    /// A produced archive waiting to be saved as `name`
    pub fn archive(
        path: impl Into<PathBuf>,
        name: impl Into<String>,
        suggested_folder: Option<DocumentRef>,
    ) -> Self {
        Self::new(
            PendingArtifact::Archive {
                path: path.into(),
                name: name.into(),
            },
            suggested_folder,
        )
    }

    /// An extracted tree waiting to be mirrored
    pub fn extracted(root: impl Into<PathBuf>, suggested_folder: Option<DocumentRef>) -> Self {
        Self::new(
            PendingArtifact::ExtractedTree { root: root.into() },
            suggested_folder,
        )
    }

    pub fn token(&self) -> RequestToken {
        self.token
    }

    pub fn artifact(&self) -> &PendingArtifact {
        &self.artifact
    }

    pub fn suggested_folder(&self) -> Option<&DocumentRef> {
        self.suggested_folder.as_ref()
    }

    pub fn deferred_at(&self) -> DateTime<Utc> {
        self.deferred_at
    }

    /// The folder-pick request the caller must present for this save
    pub fn permission_request(&self) -> PermissionRequest {
        PermissionRequest {
            token: self.token,
            initial_folder: self.suggested_folder.clone(),
            target_name: self.artifact.target_name(),
        }
    }
}

/// Continuation token handed to the caller when a save is deferred
///
/// The caller shows a folder picker (opened at `initial_folder` when known)
/// and delivers the chosen folder back to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRequest {
    pub token: RequestToken,
    pub initial_folder: Option<DocumentRef>,
    pub target_name: String,
}

/// Lifecycle of the single deferred-save slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveState {
    /// Nothing has been deferred
    #[default]
    Idle,
    /// A save waits for the user to grant a folder
    AwaitingPermission,
    /// The last pending save was written to the granted folder
    Resolved,
    /// The last pending save was replaced by a newer one before resolving
    Superseded,
}

impl std::fmt::Display for SaveState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveState::Idle => write!(f, "idle"),
            SaveState::AwaitingPermission => write!(f, "awaiting_permission"),
            SaveState::Resolved => write!(f, "resolved"),
            SaveState::Superseded => write!(f, "superseded"),
        }
    }
}
