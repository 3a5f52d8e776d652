//! Destination Resolver
//!
//! Finds the folder that should receive an output written next to a source
//! item.
//!
//! ## Design Notes
//!
//! Resolution is two-tiered: structural inference from the identifier
//! (no provider round-trip) first, then a provider parent query. `None`
//! means the caller must ask the user for a folder.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::newtypes::{DocumentId, DocumentRef, PRIMARY_VOLUME};
use crate::ports::IScopedStorage;

/// Resolves the parent folder of a source item
pub struct DestinationResolver {
    storage: Arc<dyn IScopedStorage>,
    primary_authority: String,
}

impl DestinationResolver {
    pub fn new(storage: Arc<dyn IScopedStorage>, primary_authority: impl Into<String>) -> Self {
        Self {
            storage,
            primary_authority: primary_authority.into(),
        }
    }

    /// Infers the parent tree from the identifier alone
    ///
    /// Applies only to `primary:<path>` identifiers issued by the primary
    /// authority. Items at the volume root resolve to `primary:`; the volume
    /// root itself has no parent.
    pub fn infer_parent(&self, source: &DocumentRef) -> Option<DocumentRef> {
        if source.authority() != self.primary_authority {
            return None;
        }
        let id = source.id();
        if id.volume() != PRIMARY_VOLUME || id.as_str().matches(':').count() != 1 || id.is_root()
        {
            return None;
        }

        let parent_path = match id.relative_path().rsplit_once('/') {
            Some((parent, _)) => parent,
            None => "",
        };
        let parent = DocumentId::new(format!("{PRIMARY_VOLUME}:{parent_path}")).ok()?;
        Some(DocumentRef::tree(source.authority(), parent))
    }

    /// Parent folder of `source`, or `None` if it cannot be determined
    pub async fn resolve_parent(&self, source: &DocumentRef) -> Option<DocumentRef> {
        if let Some(parent) = self.infer_parent(source) {
            debug!(source = %source, parent = %parent, "Inferred parent from identifier");
            return Some(parent);
        }

        match self.storage.get_parent(source).await {
            Ok(Some(parent)) => {
                debug!(source = %source, parent = %parent, "Provider returned parent");
                Some(parent)
            }
            Ok(None) => {
                debug!(source = %source, "Provider knows no parent");
                None
            }
            Err(e) => {
                warn!(source = %source, error = %e, "Parent query failed");
                None
            }
        }
    }
}
