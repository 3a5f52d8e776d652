//! Local scoped storage adapter (secondary/driven adapter)
//!
//! Implements [`IScopedStorage`] over a local directory that plays the role
//! of the `primary` volume: `primary:<rel>` maps to `<root>/<rel>`.
//!
//! ## Design Decisions
//!
//! - **Reads are unrestricted**: stat, listing and reading never need a grant.
//! - **Writes need a grant**: creating, deleting or opening an entry for
//!   writing fails with [`StorageError::PermissionDenied`] unless a granted
//!   tree contains it.
//! - **No path escapes**: `.`/`..` segments and foreign volumes are rejected,
//!   so a reference can never reach outside the root.
//! - **Create never overwrites**: an existing entry makes `create_*` return
//!   `Ok(None)`; callers delete first.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use anyhow::Context;
use kittypress_core::domain::errors::{DomainError, StorageError};
use kittypress_core::domain::newtypes::{DocumentId, DocumentRef, PRIMARY_VOLUME};
use kittypress_core::ports::{DocumentInfo, IScopedStorage, ReadStream, WriteStream};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::grants::GrantStore;

fn map_io(err: std::io::Error, id: &DocumentId) -> StorageError {
    match err.kind() {
        ErrorKind::NotFound => StorageError::NotFound(id.to_string()),
        ErrorKind::PermissionDenied => StorageError::PermissionDenied(id.to_string()),
        _ => StorageError::Io(err),
    }
}

/// Scoped storage over a local directory
#[derive(Debug)]
pub struct LocalScopedStorage {
    root: PathBuf,
    authority: String,
    grants: RwLock<GrantStore>,
}

impl LocalScopedStorage {
    /// Creates a storage rooted at `root` with the given grants
    ///
    /// # Errors
    ///
    /// Fails if `root` does not exist or is not a directory.
    pub fn open(
        root: impl AsRef<Path>,
        authority: impl Into<String>,
        grants: GrantStore,
    ) -> anyhow::Result<Self> {
        let root = root.as_ref();
        let root = std::fs::canonicalize(root)
            .with_context(|| format!("storage root {} is not accessible", root.display()))?;
        if !root.is_dir() {
            anyhow::bail!("storage root {} is not a directory", root.display());
        }
        info!(root = %root.display(), "Opened local scoped storage");
        Ok(Self {
            root,
            authority: authority.into(),
            grants: RwLock::new(grants),
        })
    }

    /// Canonical local directory backing the `primary` volume
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Currently granted trees
    pub async fn grants(&self) -> Vec<DocumentId> {
        self.grants.read().await.list()
    }

    fn id_for_path(&self, path: &Path) -> Result<DocumentId, DomainError> {
        let absolute = std::fs::canonicalize(path).map_err(|e| {
            DomainError::ValidationFailed(format!("{}: {e}", path.display()))
        })?;
        let rel = absolute.strip_prefix(&self.root).map_err(|_| {
            DomainError::ValidationFailed(format!(
                "{} is outside the storage root {}",
                absolute.display(),
                self.root.display()
            ))
        })?;

        let segments: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        DocumentId::new(format!("{PRIMARY_VOLUME}:{}", segments.join("/")))
    }

    /// Single-item reference for an existing local path below the root
    pub fn document_for_path(&self, path: &Path) -> Result<DocumentRef, DomainError> {
        Ok(DocumentRef::document(
            self.authority.clone(),
            self.id_for_path(path)?,
        ))
    }

    /// Tree reference for an existing local directory below the root
    pub fn tree_for_path(&self, path: &Path) -> Result<DocumentRef, DomainError> {
        Ok(DocumentRef::tree(
            self.authority.clone(),
            self.id_for_path(path)?,
        ))
    }

    /// Local path behind a reference of this storage, if it maps to one
    pub fn local_path(&self, reference: &DocumentRef) -> Option<PathBuf> {
        if reference.authority() != self.authority {
            return None;
        }
        self.path_for(reference.id()).ok()
    }

    /// Local path addressed by `id`
    fn path_for(&self, id: &DocumentId) -> Result<PathBuf, StorageError> {
        if id.volume() != PRIMARY_VOLUME {
            return Err(StorageError::NotFound(id.to_string()));
        }
        let rel = Path::new(id.relative_path());
        if !rel.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(StorageError::Refused(format!(
                "{id} is not a plain relative path"
            )));
        }
        Ok(self.root.join(rel))
    }

    async fn check_writable(&self, id: &DocumentId) -> Result<(), StorageError> {
        if self.grants.read().await.covers(id) {
            Ok(())
        } else {
            Err(StorageError::PermissionDenied(format!(
                "no folder grant covers {id}"
            )))
        }
    }

    fn child_id(parent: &DocumentRef, name: &str) -> Result<DocumentId, StorageError> {
        if name.is_empty() || name == "." || name == ".." || name.contains('/') {
            return Err(StorageError::Refused(format!("invalid entry name {name:?}")));
        }
        Ok(parent.id().child(name))
    }

    fn reference(&self, id: DocumentId, is_directory: bool) -> DocumentRef {
        if is_directory {
            DocumentRef::tree(self.authority.clone(), id)
        } else {
            DocumentRef::document(self.authority.clone(), id)
        }
    }

    async fn info(&self, id: &DocumentId) -> Result<Option<DocumentInfo>, StorageError> {
        let path = self.path_for(id)?;
        match tokio::fs::metadata(&path).await {
            Ok(metadata) => Ok(Some(DocumentInfo {
                reference: self.reference(id.clone(), metadata.is_dir()),
                name: path.file_name().map(|n| n.to_string_lossy().into_owned()),
                is_directory: metadata.is_dir(),
            })),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(map_io(e, id)),
        }
    }
}

#[async_trait::async_trait]
impl IScopedStorage for LocalScopedStorage {
    #[instrument(skip(self), fields(id = %reference.id()))]
    async fn stat(&self, reference: &DocumentRef) -> Result<Option<DocumentInfo>, StorageError> {
        self.info(reference.id()).await
    }

    #[instrument(skip(self), fields(id = %parent.id()))]
    async fn list_children(
        &self,
        parent: &DocumentRef,
    ) -> Result<Vec<DocumentInfo>, StorageError> {
        let path = self.path_for(parent.id())?;
        let mut read_dir = tokio::fs::read_dir(&path)
            .await
            .map_err(|e| map_io(e, parent.id()))?;

        let mut children = Vec::new();
        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| map_io(e, parent.id()))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            let is_directory = entry
                .file_type()
                .await
                .map_err(|e| map_io(e, parent.id()))?
                .is_dir();
            children.push(DocumentInfo {
                reference: self.reference(parent.id().child(&name), is_directory),
                name: Some(name),
                is_directory,
            });
        }
        children.sort_by(|a, b| a.name.cmp(&b.name));
        debug!(count = children.len(), "Listed children");
        Ok(children)
    }

    #[instrument(skip(self), fields(parent = %parent.id()))]
    async fn find_by_name(
        &self,
        parent: &DocumentRef,
        name: &str,
    ) -> Result<Option<DocumentInfo>, StorageError> {
        let id = Self::child_id(parent, name)?;
        self.info(&id).await
    }

    #[instrument(skip(self), fields(parent = %parent.id()))]
    async fn create_file(
        &self,
        parent: &DocumentRef,
        mime_type: &str,
        name: &str,
    ) -> Result<Option<DocumentRef>, StorageError> {
        let id = Self::child_id(parent, name)?;
        self.check_writable(&id).await?;
        let path = self.path_for(&id)?;

        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(_) => {
                debug!(id = %id, mime_type, "Created file");
                Ok(Some(self.reference(id, false)))
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!(id = %id, "File already exists, not created");
                Ok(None)
            }
            Err(e) => Err(map_io(e, &id)),
        }
    }

    #[instrument(skip(self), fields(parent = %parent.id()))]
    async fn create_directory(
        &self,
        parent: &DocumentRef,
        name: &str,
    ) -> Result<Option<DocumentRef>, StorageError> {
        let id = Self::child_id(parent, name)?;
        self.check_writable(&id).await?;
        let path = self.path_for(&id)?;

        match tokio::fs::create_dir(&path).await {
            Ok(()) => {
                debug!(id = %id, "Created directory");
                Ok(Some(self.reference(id, true)))
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(None),
            Err(e) => Err(map_io(e, &id)),
        }
    }

    #[instrument(skip(self), fields(id = %reference.id()))]
    async fn delete(&self, reference: &DocumentRef) -> Result<(), StorageError> {
        let id = reference.id();
        self.check_writable(id).await?;
        if id.is_root() {
            return Err(StorageError::Refused("cannot delete the volume root".into()));
        }
        let path = self.path_for(id)?;

        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| map_io(e, id))?;
        let removed = if metadata.is_dir() {
            tokio::fs::remove_dir_all(&path).await
        } else {
            tokio::fs::remove_file(&path).await
        };
        removed.map_err(|e| map_io(e, id))?;
        debug!("Deleted entry");
        Ok(())
    }

    #[instrument(skip(self), fields(id = %reference.id()))]
    async fn open_read(&self, reference: &DocumentRef) -> Result<ReadStream, StorageError> {
        let path = self.path_for(reference.id())?;
        let file = tokio::fs::File::open(&path)
            .await
            .map_err(|e| map_io(e, reference.id()))?;
        Ok(Box::new(file))
    }

    #[instrument(skip(self), fields(id = %reference.id()))]
    async fn open_write(&self, reference: &DocumentRef) -> Result<WriteStream, StorageError> {
        self.check_writable(reference.id()).await?;
        let path = self.path_for(reference.id())?;
        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&path)
            .await
            .map_err(|e| map_io(e, reference.id()))?;
        Ok(Box::new(file))
    }

    #[instrument(skip(self), fields(id = %reference.id()))]
    async fn get_parent(
        &self,
        reference: &DocumentRef,
    ) -> Result<Option<DocumentRef>, StorageError> {
        let id = reference.id();
        if id.is_root() {
            return Ok(None);
        }
        let parent_rel = match id.relative_path().rsplit_once('/') {
            Some((parent, _)) => parent,
            None => "",
        };
        let parent = DocumentId::new(format!("{}:{parent_rel}", id.volume()))
            .map_err(|e| StorageError::Refused(e.to_string()))?;

        match self.info(&parent).await? {
            Some(info) if info.is_directory => Ok(Some(self.reference(parent, true))),
            _ => Ok(None),
        }
    }

    #[instrument(skip(self), fields(id = %tree.id()))]
    async fn take_persistable_permission(&self, tree: &DocumentRef) -> Result<(), StorageError> {
        match self.info(tree.id()).await? {
            Some(info) if info.is_directory => {}
            Some(_) => {
                return Err(StorageError::Refused(format!(
                    "{} is not a folder",
                    tree.id()
                )))
            }
            None => return Err(StorageError::NotFound(tree.id().to_string())),
        }

        let mut grants = self.grants.write().await;
        if grants.insert(tree.id().clone()) {
            info!(tree = %tree.id(), "Folder write access granted");
        }
        grants
            .save()
            .map_err(|e| StorageError::Io(std::io::Error::other(format!("{e:#}"))))?;
        Ok(())
    }
}
