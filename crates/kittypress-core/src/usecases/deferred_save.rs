//! Deferred Save Coordinator
//!
//! Owns the single slot for an artifact that could not be written yet and
//! resumes the write once the user grants access to a folder.
//!
//! ## Design Notes
//!
//! - The slot is an explicit value: callers restore it with
//!   [`DeferredSaveCoordinator::new`] and take it back with
//!   [`DeferredSaveCoordinator::into_pending`] to persist it between runs.
//! - Deferring while a save is pending replaces it (last write wins). The
//!   replaced save is returned in [`DeferOutcome::superseded`] and logged.
//! - The slot is cleared after every resume attempt, successful or not.
//! - [`DeferredSaveCoordinator::resume_request`] checks the request token, so
//!   a grant answering a superseded request never writes the newer save.

use tracing::{error, info, warn};

use crate::domain::errors::PipelineError;
use crate::domain::newtypes::{DocumentRef, RequestToken};
use crate::domain::pending::{PendingArtifact, PendingSave, PermissionRequest, SaveState};

use super::mirror_tree::TreeMirror;

/// Result of deferring a save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferOutcome {
    /// The folder-pick request to present to the user
    pub request: PermissionRequest,
    /// A previously pending save that was dropped
    pub superseded: Option<PendingSave>,
    /// Final state of the slot's previous occupant: [`SaveState::Superseded`]
    /// when a pending save was dropped, otherwise the coordinator's state
    /// before this defer
    pub previous_state: SaveState,
}

/// Result of delivering a granted folder to the coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeOutcome {
    /// No save was pending; the grant was only recorded
    NothingPending,
    /// The pending artifact was written to the folder
    Resolved { name: String },
    /// Writing the pending artifact failed; the save is dropped
    Failed { name: String, error: PipelineError },
    /// The grant answered a request that is no longer pending; nothing was written
    Stale { token: RequestToken },
}

impl ResumeOutcome {
    /// Human-readable status line shown to the user
    pub fn status_message(&self) -> String {
        match self {
            ResumeOutcome::NothingPending => "Folder access granted.".to_string(),
            ResumeOutcome::Resolved { name } => format!("Saved → {name}"),
            ResumeOutcome::Failed { name, .. } => format!("Failed to save → {name}"),
            ResumeOutcome::Stale { .. } => {
                "Folder access granted; that request is no longer pending.".to_string()
            }
        }
    }
}

/// Single-slot coordinator for deferred saves
#[derive(Debug, Default)]
pub struct DeferredSaveCoordinator {
    slot: Option<PendingSave>,
    state: SaveState,
}

impl DeferredSaveCoordinator {
    /// Restores a coordinator from a previously persisted slot
    pub fn new(pending: Option<PendingSave>) -> Self {
        let state = if pending.is_some() {
            SaveState::AwaitingPermission
        } else {
            SaveState::Idle
        };
        Self {
            slot: pending,
            state,
        }
    }

    /// The save waiting for a folder grant, if any
    pub fn pending(&self) -> Option<&PendingSave> {
        self.slot.as_ref()
    }

    /// Hands back the slot for persistence
    pub fn into_pending(self) -> Option<PendingSave> {
        self.slot
    }

    /// State of the most recent save handled by this coordinator
    pub fn state(&self) -> SaveState {
        self.state
    }

    /// Records `save` as pending, replacing any earlier pending save
    pub fn defer(&mut self, save: PendingSave) -> DeferOutcome {
        let request = save.permission_request();
        let superseded = self.slot.replace(save);
        let previous_state = if superseded.is_some() {
            SaveState::Superseded
        } else {
            self.state
        };

        if let Some(old) = &superseded {
            warn!(
                token = %old.token(),
                target = %old.artifact().target_name(),
                state = %SaveState::Superseded,
                "Pending save replaced before it was resolved"
            );
        }
        info!(
            token = %request.token,
            target = %request.target_name,
            initial_folder = ?request.initial_folder.as_ref().map(ToString::to_string),
            "Save deferred until a folder is granted"
        );

        self.state = SaveState::AwaitingPermission;
        DeferOutcome {
            request,
            superseded,
            previous_state,
        }
    }

    /// Resumes the save identified by `token`
    ///
    /// The grant on `folder` is always taken. When the pending save carries a
    /// different token (or nothing is pending) the slot is left untouched and
    /// [`ResumeOutcome::Stale`] is returned.
    pub async fn resume_request(
        &mut self,
        token: RequestToken,
        folder: &DocumentRef,
        mirror: &TreeMirror,
    ) -> ResumeOutcome {
        if self.slot.as_ref().map(PendingSave::token) == Some(token) {
            return self.resume(folder, mirror).await;
        }

        if let Err(e) = mirror.storage().take_persistable_permission(folder).await {
            warn!(folder = %folder, error = %e, "Could not persist folder permission");
        }
        warn!(
            token = %token,
            pending = ?self.slot.as_ref().map(|s| s.token().to_string()),
            "Grant answers a request that is no longer pending"
        );
        ResumeOutcome::Stale { token }
    }

    /// Writes the pending artifact into the granted `folder`
    ///
    /// Takes the persistable permission on `folder` first. Archives are
    /// copied with delete-then-create; extracted payloads go through the
    /// [`TreeMirror`].
    pub async fn resume(&mut self, folder: &DocumentRef, mirror: &TreeMirror) -> ResumeOutcome {
        if let Err(e) = mirror.storage().take_persistable_permission(folder).await {
            warn!(folder = %folder, error = %e, "Could not persist folder permission");
        }

        let Some(pending) = self.slot.take() else {
            return ResumeOutcome::NothingPending;
        };
        let name = pending.artifact().target_name();

        let result = match pending.artifact() {
            PendingArtifact::Archive { path, name } => mirror
                .copy_file_into(path, folder, name)
                .await
                .map(|_| ()),
            PendingArtifact::ExtractedTree { root } => {
                mirror.mirror(root, folder).await.map(|_| ())
            }
        };

        match result {
            Ok(()) => {
                info!(token = %pending.token(), folder = %folder, name = %name, "Pending save resolved");
                self.state = SaveState::Resolved;
                ResumeOutcome::Resolved { name }
            }
            Err(error) => {
                error!(
                    token = %pending.token(),
                    folder = %folder,
                    name = %name,
                    error = %error,
                    "Pending save failed"
                );
                self.state = SaveState::Idle;
                ResumeOutcome::Failed { name, error }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tempfile::TempDir;

    use super::*;
    use crate::testing::MemoryStorage;

    fn archive_on_disk(tmp: &TempDir, name: &str) -> std::path::PathBuf {
        let path = tmp.path().join(name);
        std::fs::write(&path, b"KITTY").unwrap();
        path
    }

    #[test]
    fn new_coordinator_is_idle() {
        let coordinator = DeferredSaveCoordinator::new(None);
        assert_eq!(coordinator.state(), SaveState::Idle);
        assert!(coordinator.pending().is_none());
    }

    #[test]
    fn restored_slot_awaits_permission() {
        let save = PendingSave::archive("/cache/a.kitty", "a.kitty", None);
        let coordinator = DeferredSaveCoordinator::new(Some(save.clone()));
        assert_eq!(coordinator.state(), SaveState::AwaitingPermission);
        assert_eq!(coordinator.into_pending(), Some(save));
    }

    #[test]
    fn defer_returns_request_for_the_save() {
        let mut coordinator = DeferredSaveCoordinator::new(None);
        let save = PendingSave::archive("/cache/a.kitty", "a.kitty", None);
        let token = save.token();

        let outcome = coordinator.defer(save);
        assert_eq!(outcome.request.token, token);
        assert_eq!(outcome.request.target_name, "a.kitty");
        assert!(outcome.superseded.is_none());
        assert_eq!(outcome.previous_state, SaveState::Idle);
        assert_eq!(coordinator.state(), SaveState::AwaitingPermission);
    }

    #[test]
    fn second_defer_supersedes_the_first() {
        let mut coordinator = DeferredSaveCoordinator::new(None);
        let first = PendingSave::archive("/cache/a.kitty", "a.kitty", None);
        let second = PendingSave::archive("/cache/b.kitty", "b.kitty", None);

        coordinator.defer(first.clone());
        let outcome = coordinator.defer(second.clone());

        assert_eq!(outcome.superseded, Some(first));
        assert_eq!(outcome.previous_state, SaveState::Superseded);
        assert_eq!(coordinator.pending(), Some(&second));
    }

    #[tokio::test]
    async fn resume_without_pending_save_only_grants() {
        let storage = MemoryStorage::new();
        let folder = storage.add_dir("Download");
        let mirror = TreeMirror::new(Arc::new(storage.clone()), "application/octet-stream");

        let mut coordinator = DeferredSaveCoordinator::new(None);
        let outcome = coordinator.resume(&folder, &mirror).await;

        assert_eq!(outcome, ResumeOutcome::NothingPending);
        assert_eq!(storage.granted(), vec!["primary:Download".to_string()]);
    }

    #[tokio::test]
    async fn resume_writes_pending_archive_and_clears_slot() {
        let storage = MemoryStorage::new();
        let folder = storage.add_dir("Locked");
        storage.lock_tree("Locked");
        let mirror = TreeMirror::new(Arc::new(storage.clone()), "application/octet-stream");
        let tmp = TempDir::new().unwrap();
        let path = archive_on_disk(&tmp, "a.kitty");

        let mut coordinator = DeferredSaveCoordinator::new(None);
        coordinator.defer(PendingSave::archive(path, "a.kitty", Some(folder.clone())));
        let outcome = coordinator.resume(&folder, &mirror).await;

        assert_eq!(
            outcome,
            ResumeOutcome::Resolved {
                name: "a.kitty".to_string()
            }
        );
        assert_eq!(outcome.status_message(), "Saved → a.kitty");
        assert_eq!(storage.read("Locked/a.kitty").unwrap(), b"KITTY");
        assert_eq!(coordinator.state(), SaveState::Resolved);
        assert!(coordinator.pending().is_none());
    }

    #[tokio::test]
    async fn resume_mirrors_extracted_tree() {
        let storage = MemoryStorage::new();
        let folder = storage.add_dir("Out");
        let mirror = TreeMirror::new(Arc::new(storage.clone()), "application/octet-stream");
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("KittyPress_Docs");
        std::fs::create_dir_all(root.join("Docs")).unwrap();
        std::fs::write(root.join("Docs/b.txt"), b"beta").unwrap();

        let mut coordinator = DeferredSaveCoordinator::new(None);
        coordinator.defer(PendingSave::extracted(&root, None));
        let outcome = coordinator.resume(&folder, &mirror).await;

        assert!(matches!(outcome, ResumeOutcome::Resolved { .. }));
        assert_eq!(storage.read("Out/Docs/b.txt").unwrap(), b"beta");
    }

    #[tokio::test]
    async fn failed_resume_still_clears_slot() {
        let storage = MemoryStorage::new();
        let folder = storage.add_dir("Download");
        storage.set_refuse_creates(true);
        let mirror = TreeMirror::new(Arc::new(storage.clone()), "application/octet-stream");
        let tmp = TempDir::new().unwrap();
        let path = archive_on_disk(&tmp, "a.kitty");

        let mut coordinator = DeferredSaveCoordinator::new(None);
        coordinator.defer(PendingSave::archive(path, "a.kitty", None));
        let outcome = coordinator.resume(&folder, &mirror).await;

        assert!(matches!(outcome, ResumeOutcome::Failed { .. }));
        assert_eq!(outcome.status_message(), "Failed to save → a.kitty");
        assert!(coordinator.pending().is_none());
        assert_eq!(coordinator.state(), SaveState::Idle);
    }

    #[tokio::test]
    async fn grant_for_superseded_request_is_stale() {
        let storage = MemoryStorage::new();
        let folder = storage.add_dir("Download");
        let mirror = TreeMirror::new(Arc::new(storage.clone()), "application/octet-stream");
        let tmp = TempDir::new().unwrap();
        let first = archive_on_disk(&tmp, "a.kitty");
        let second = archive_on_disk(&tmp, "b.kitty");

        let mut coordinator = DeferredSaveCoordinator::new(None);
        let old = coordinator
            .defer(PendingSave::archive(first, "a.kitty", None))
            .request;
        let new = coordinator
            .defer(PendingSave::archive(second, "b.kitty", None))
            .request;

        let outcome = coordinator.resume_request(old.token, &folder, &mirror).await;
        assert_eq!(outcome, ResumeOutcome::Stale { token: old.token });
        assert!(storage.read("Download/b.kitty").is_none());
        assert_eq!(coordinator.pending().map(PendingSave::token), Some(new.token));
        assert_eq!(storage.granted(), vec!["primary:Download".to_string()]);

        let outcome = coordinator.resume_request(new.token, &folder, &mirror).await;
        assert_eq!(
            outcome,
            ResumeOutcome::Resolved {
                name: "b.kitty".to_string()
            }
        );
        assert_eq!(storage.read("Download/b.kitty").unwrap(), b"KITTY");
    }

    #[tokio::test]
    async fn grant_with_token_but_nothing_pending_is_stale() {
        let storage = MemoryStorage::new();
        let folder = storage.add_dir("Download");
        let mirror = TreeMirror::new(Arc::new(storage.clone()), "application/octet-stream");

        let mut coordinator = DeferredSaveCoordinator::new(None);
        let token = RequestToken::new();
        let outcome = coordinator.resume_request(token, &folder, &mirror).await;
        assert_eq!(outcome, ResumeOutcome::Stale { token });
        assert_eq!(coordinator.state(), SaveState::Idle);
    }
}
