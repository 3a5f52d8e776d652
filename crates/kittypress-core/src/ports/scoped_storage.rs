//! Scoped storage port (driven/secondary port)
//!
//! This module defines the interface to a permission-scoped storage
//! provider. Files and folders are addressed by opaque [`DocumentRef`]s
//! issued by the provider, never by literal local paths.
//!
//! ## Design Notes
//!
//! - Uses [`StorageError`] so callers can tell a missing permission grant
//!   apart from other failures; the deferred save path depends on it.
//! - Byte streams are boxed tokio `AsyncRead`/`AsyncWrite` objects so the
//!   core copies content without buffering whole files.
//! - `create_*` return `Ok(None)` when the provider declines to create the
//!   entry without raising an error.

use tokio::io::{AsyncRead, AsyncWrite};

use crate::domain::errors::StorageError;
use crate::domain::newtypes::DocumentRef;

/// Readable byte stream opened on a provider entry
pub type ReadStream = Box<dyn AsyncRead + Send + Unpin>;

/// Writable byte stream opened on a provider entry
pub type WriteStream = Box<dyn AsyncWrite + Send + Unpin>;

/// Metadata of a provider entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    /// Reference addressing the entry
    pub reference: DocumentRef,
    /// Display name, if the provider knows one
    pub name: Option<String>,
    /// Whether the entry is a directory
    pub is_directory: bool,
}

/// Port trait for permission-scoped storage
///
/// ## Implementation Notes
///
/// - Write operations (`create_*`, `delete`, `open_write`) fail with
///   [`StorageError::PermissionDenied`] when the caller holds no grant for
///   the enclosing tree.
/// - `get_parent` returns `Ok(None)` when the provider cannot or will not
///   name a parent.
/// - `list_children` returns entries in a stable order.
#[async_trait::async_trait]
pub trait IScopedStorage: Send + Sync {
    /// Metadata of the addressed entry, `None` if it does not exist
    async fn stat(&self, reference: &DocumentRef) -> Result<Option<DocumentInfo>, StorageError>;

    /// Direct children of a directory
    async fn list_children(&self, parent: &DocumentRef)
        -> Result<Vec<DocumentInfo>, StorageError>;

    /// Direct child named `name`, if any
    async fn find_by_name(
        &self,
        parent: &DocumentRef,
        name: &str,
    ) -> Result<Option<DocumentInfo>, StorageError>;

    /// Creates an empty file named `name` under `parent`
    async fn create_file(
        &self,
        parent: &DocumentRef,
        mime_type: &str,
        name: &str,
    ) -> Result<Option<DocumentRef>, StorageError>;

    /// Creates a directory named `name` under `parent`
    async fn create_directory(
        &self,
        parent: &DocumentRef,
        name: &str,
    ) -> Result<Option<DocumentRef>, StorageError>;

    /// Deletes the addressed entry (recursively for directories)
    async fn delete(&self, reference: &DocumentRef) -> Result<(), StorageError>;

    /// Opens the addressed file for reading
    async fn open_read(&self, reference: &DocumentRef) -> Result<ReadStream, StorageError>;

    /// Opens the addressed file for writing, truncating it
    async fn open_write(&self, reference: &DocumentRef) -> Result<WriteStream, StorageError>;

    /// Tree reference of the folder containing the addressed entry
    async fn get_parent(&self, reference: &DocumentRef)
        -> Result<Option<DocumentRef>, StorageError>;

    /// Records a persistable read/write grant for the addressed tree
    async fn take_persistable_permission(&self, tree: &DocumentRef) -> Result<(), StorageError>;
}
