//! Domain newtypes with validation
//!
//! This module provides strongly-typed wrappers for the opaque references a
//! scoped storage provider hands out, and for the token that identifies a
//! pending permission request.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

/// Volume name of the device's primary shared storage
pub const PRIMARY_VOLUME: &str = "primary";

// ============================================================================
// DocumentId
// ============================================================================

/// Provider-issued identifier of a file or folder: `<volume>:<relative/path>`
///
/// The relative part uses `/` separators and never starts with one. An empty
/// relative part (`primary:`) names the volume root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentId(String);

impl DocumentId {
    /// Create a new DocumentId, validating its shape
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        let Some((volume, relative)) = value.split_once(':') else {
            return Err(DomainError::InvalidDocumentId(format!(
                "missing volume separator: {value}"
            )));
        };
        if volume.is_empty() {
            return Err(DomainError::InvalidDocumentId(format!(
                "empty volume: {value}"
            )));
        }
        if relative.starts_with('/') {
            return Err(DomainError::InvalidDocumentId(format!(
                "relative part must not start with '/': {value}"
            )));
        }
        Ok(Self(value))
    }

    /// Identifier of a volume root, e.g. `primary:`
    #[must_use]
    pub fn root(volume: &str) -> Self {
        Self(format!("{volume}:"))
    }

    /// The volume part (before the first `:`)
    pub fn volume(&self) -> &str {
        self.0.split_once(':').map(|(v, _)| v).unwrap_or_default()
    }

    /// The relative path part (after the first `:`)
    pub fn relative_path(&self) -> &str {
        self.0.split_once(':').map(|(_, r)| r).unwrap_or_default()
    }

    /// Returns true if this identifier names a volume root
    pub fn is_root(&self) -> bool {
        self.relative_path().is_empty()
    }

    /// Identifier of a direct child entry named `name`
    #[must_use]
    pub fn child(&self, name: &str) -> Self {
        if self.is_root() {
            Self(format!("{}{}", self.0, name))
        } else {
            Self(format!("{}/{}", self.0, name))
        }
    }

    /// Last path segment, if any
    pub fn file_name(&self) -> Option<&str> {
        self.relative_path()
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for DocumentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for DocumentId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DocumentId> for String {
    fn from(id: DocumentId) -> Self {
        id.0
    }
}

// ============================================================================
// DocumentRef
// ============================================================================

/// Whether a reference addresses a whole folder tree or a single item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefKind {
    /// A folder tree the caller can walk and write into
    Tree,
    /// A single addressable item
    Document,
}

impl RefKind {
    fn as_str(&self) -> &'static str {
        match self {
            RefKind::Tree => "tree",
            RefKind::Document => "document",
        }
    }
}

/// Opaque addressable reference to a file or folder
///
/// Issued by a scoped storage provider, independent of any literal local
/// path. Displays as `<authority>/<tree|document>/<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentRef {
    authority: String,
    kind: RefKind,
    id: DocumentId,
}

impl DocumentRef {
    /// Reference to a folder tree
    pub fn tree(authority: impl Into<String>, id: DocumentId) -> Self {
        Self {
            authority: authority.into(),
            kind: RefKind::Tree,
            id,
        }
    }

    /// Reference to a single item
    pub fn document(authority: impl Into<String>, id: DocumentId) -> Self {
        Self {
            authority: authority.into(),
            kind: RefKind::Document,
            id,
        }
    }

    /// The provider authority that issued this reference
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Tree or single-item reference
    pub fn kind(&self) -> RefKind {
        self.kind
    }

    /// The provider-issued identifier
    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    /// Returns true for tree references
    pub fn is_tree(&self) -> bool {
        self.kind == RefKind::Tree
    }

    /// Single-item reference to a direct child named `name`
    #[must_use]
    pub fn child(&self, name: &str) -> Self {
        Self::document(self.authority.clone(), self.id.child(name))
    }

    /// The same identifier addressed as a tree
    #[must_use]
    pub fn as_tree(&self) -> Self {
        Self::tree(self.authority.clone(), self.id.clone())
    }
}

impl Display for DocumentRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.authority, self.kind.as_str(), self.id)
    }
}

impl FromStr for DocumentRef {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (authority, rest) = s
            .split_once('/')
            .ok_or_else(|| DomainError::InvalidReference(s.to_string()))?;
        if authority.is_empty() {
            return Err(DomainError::InvalidReference(s.to_string()));
        }

        let (kind, id) = if let Some(id) = rest.strip_prefix("tree/") {
            (RefKind::Tree, id)
        } else if let Some(id) = rest.strip_prefix("document/") {
            (RefKind::Document, id)
        } else {
            return Err(DomainError::InvalidReference(s.to_string()));
        };

        Ok(Self {
            authority: authority.to_string(),
            kind,
            id: DocumentId::new(id)?,
        })
    }
}

// ============================================================================
// RequestToken
// ============================================================================

/// Identifies one outstanding folder-permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestToken(Uuid);

impl RequestToken {
    /// Create a new random RequestToken
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID value
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestToken {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RequestToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RequestToken {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| DomainError::ValidationFailed(format!("Invalid request token: {e}")))
    }
}
