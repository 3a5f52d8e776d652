//! Pending-save record kept between CLI invocations
//!
//! A deferred save outlives the command that produced it: `compress` or
//! `decompress` stores it here and `grant` picks it up again.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use kittypress_core::domain::PendingSave;
use tracing::debug;

pub const PENDING_FILE: &str = "pending.json";
pub const GRANTS_FILE: &str = "grants.json";

/// JSON file holding at most one pending save
#[derive(Debug, Clone)]
pub struct PendingStore {
    path: PathBuf,
}

impl PendingStore {
    pub fn new(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join(PENDING_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored pending save; a missing file means nothing is pending
    pub fn load(&self) -> Result<Option<PendingSave>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("cannot read {}", self.path.display()))
            }
        };
        let pending: Option<PendingSave> = serde_json::from_str(&content)
            .with_context(|| format!("invalid pending-save file {}", self.path.display()))?;
        Ok(pending)
    }

    /// Replaces the stored record; `None` removes the file
    pub fn store(&self, pending: Option<&PendingSave>) -> Result<()> {
        let Some(pending) = pending else {
            return match std::fs::remove_file(&self.path) {
                Ok(()) => {
                    debug!(path = %self.path.display(), "Cleared pending save");
                    Ok(())
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => {
                    Err(e).with_context(|| format!("cannot remove {}", self.path.display()))
                }
            };
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
        let body = serde_json::to_string_pretty(pending)?;
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, body)
            .with_context(|| format!("cannot write {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("cannot replace {}", self.path.display()))?;
        debug!(path = %self.path.display(), token = %pending.token(), "Stored pending save");
        Ok(())
    }
}
