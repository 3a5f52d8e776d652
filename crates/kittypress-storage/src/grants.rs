//! Folder write grants
//!
//! A grant names a folder tree the user allowed KittyPress to write into.
//! Grants cover the whole subtree below the folder. They can be persisted
//! to a JSON file so a later process keeps the permission.
//!
//! ## Design Notes
//!
//! - Saves go through a temporary file plus rename so a crash never leaves
//!   a truncated grants file behind.
//! - A missing grants file is an empty grant set, not an error.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use kittypress_core::domain::newtypes::DocumentId;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// On-disk shape of the grants file
#[derive(Debug, Default, Serialize, Deserialize)]
struct GrantsFile {
    grants: Vec<DocumentId>,
}

/// Returns true if `id` lies inside (or is) the tree `tree`
pub fn tree_contains(tree: &DocumentId, id: &DocumentId) -> bool {
    if tree.volume() != id.volume() {
        return false;
    }
    if tree.is_root() {
        return true;
    }
    let tree_rel = tree.relative_path();
    let rel = id.relative_path();
    rel == tree_rel
        || rel
            .strip_prefix(tree_rel)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Set of granted folder trees
#[derive(Debug, Default)]
pub struct GrantStore {
    grants: BTreeSet<DocumentId>,
    file: Option<PathBuf>,
}

impl GrantStore {
    /// Grant set that lives only in memory
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads grants from `path`; later grants are saved back to it
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let grants = match std::fs::read_to_string(path) {
            Ok(content) => {
                let file: GrantsFile = serde_json::from_str(&content)
                    .with_context(|| format!("invalid grants file {}", path.display()))?;
                file.grants.into_iter().collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeSet::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("cannot read {}", path.display()));
            }
        };
        debug!(path = %path.display(), count = grants.len(), "Loaded folder grants");
        Ok(Self {
            grants,
            file: Some(path.to_path_buf()),
        })
    }

    /// Returns true if some grant covers `id`
    pub fn covers(&self, id: &DocumentId) -> bool {
        self.grants.iter().any(|tree| tree_contains(tree, id))
    }

    /// Adds a grant; returns false if it was already present
    pub fn insert(&mut self, tree: DocumentId) -> bool {
        self.grants.insert(tree)
    }

    /// Granted trees in identifier order
    pub fn list(&self) -> Vec<DocumentId> {
        self.grants.iter().cloned().collect()
    }

    /// Writes the grant set to its file, if it has one
    pub fn save(&self) -> anyhow::Result<()> {
        let Some(path) = &self.file else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }

        let body = serde_json::to_string_pretty(&GrantsFile {
            grants: self.list(),
        })?;
        let tmp_path = {
            let mut p = path.as_os_str().to_owned();
            p.push(".tmp");
            PathBuf::from(p)
        };
        std::fs::write(&tmp_path, body)
            .with_context(|| format!("cannot write {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("cannot replace {}", path.display()))?;
        debug!(path = %path.display(), count = self.grants.len(), "Saved folder grants");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn id(s: &str) -> DocumentId {
        DocumentId::new(s).unwrap()
    }

    #[test]
    fn tree_contains_respects_segment_boundaries() {
        let tree = id("primary:Docs");
        assert!(tree_contains(&tree, &id("primary:Docs")));
        assert!(tree_contains(&tree, &id("primary:Docs/a.txt")));
        assert!(!tree_contains(&tree, &id("primary:Docs2/a.txt")));
        assert!(!tree_contains(&tree, &id("primary:a.txt")));
        assert!(!tree_contains(&tree, &id("sdcard:Docs/a.txt")));
        assert!(tree_contains(&id("primary:"), &id("primary:anything/at/all")));
    }

    #[test]
    fn covers_after_insert() {
        let mut store = GrantStore::in_memory();
        assert!(!store.covers(&id("primary:Docs/a.txt")));
        assert!(store.insert(id("primary:Docs")));
        assert!(!store.insert(id("primary:Docs")));
        assert!(store.covers(&id("primary:Docs/a.txt")));
    }

    #[test]
    fn save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state/grants.json");

        let mut store = GrantStore::load(&path).unwrap();
        assert!(store.list().is_empty());
        store.insert(id("primary:Download"));
        store.save().unwrap();

        let reloaded = GrantStore::load(&path).unwrap();
        assert_eq!(reloaded.list(), vec![id("primary:Download")]);
        assert!(!dir.path().join("state/grants.json.tmp").exists());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("grants.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(GrantStore::load(&path).is_err());
    }

    #[test]
    fn in_memory_save_is_noop() {
        let mut store = GrantStore::in_memory();
        store.insert(id("primary:"));
        store.save().unwrap();
    }
}
