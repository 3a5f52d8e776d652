//! User-picked inputs and the ordered selection built from them
//!
//! The selection keeps three views: the current file pick, the folders picked
//! so far, and a unified ordered list where the most recently (re)selected
//! item is last. The first element of the ordered list decides the base name
//! of the produced archive.

use serde::{Deserialize, Serialize};

use super::newtypes::DocumentRef;

/// Whether an input is a single file or a whole folder tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    File,
    FolderTree,
}

/// A user-selected input, immutable once selected
///
/// Identity is the [`DocumentRef`]; two items with the same reference are
/// the same input regardless of their display names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputItem {
    reference: DocumentRef,
    kind: InputKind,
    display_name: Option<String>,
}

impl InputItem {
    /// A single-file input
    pub fn file(reference: DocumentRef, display_name: Option<String>) -> Self {
        Self {
            reference,
            kind: InputKind::File,
            display_name,
        }
    }

    /// A folder-tree input
    pub fn folder(reference: DocumentRef, display_name: Option<String>) -> Self {
        Self {
            reference,
            kind: InputKind::FolderTree,
            display_name,
        }
    }

    pub fn reference(&self) -> &DocumentRef {
        &self.reference
    }

    pub fn kind(&self) -> InputKind {
        self.kind
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn is_folder(&self) -> bool {
        self.kind == InputKind::FolderTree
    }

    fn same_identity(&self, other: &InputItem) -> bool {
        self.reference == other.reference
    }
}

/// Input Normalizer: de-duplicated, order-preserving selection of inputs
///
/// ## Ordering
///
/// Selecting an item that is already present moves it to the end instead of
/// duplicating it ("last (re)selected wins"). A file pick replaces the whole
/// file subset, but files from an earlier pick keep their place in the
/// ordered view and can still decide the archive name and destination.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputSelection {
    files: Vec<InputItem>,
    folders: Vec<InputItem>,
    ordered: Vec<InputItem>,
}

impl InputSelection {
    /// Creates an empty selection
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a multi-file pick
    ///
    /// An empty pick is ignored (the user dismissed the picker).
    pub fn select_files(&mut self, items: Vec<InputItem>) {
        if items.is_empty() {
            return;
        }

        let mut picked: Vec<InputItem> = Vec::with_capacity(items.len());
        for item in items {
            picked.retain(|p| !p.same_identity(&item));
            picked.push(item);
        }

        self.files = picked;

        // Files of earlier picks stay in the ordered view; only the new pick
        // moves to the end.
        self.ordered
            .retain(|o| !self.files.iter().any(|f| f.same_identity(o)));
        self.ordered.extend(self.files.iter().cloned());
    }

    /// Records a single folder pick, moving it to the end if already present
    pub fn select_folder(&mut self, item: InputItem) {
        self.folders.retain(|f| !f.same_identity(&item));
        self.ordered.retain(|o| !o.same_identity(&item));
        self.folders.push(item.clone());
        self.ordered.push(item);
    }

    /// Current file pick
    pub fn files(&self) -> &[InputItem] {
        &self.files
    }

    /// Folders picked so far, oldest first
    pub fn folders(&self) -> &[InputItem] {
        &self.folders
    }

    /// Unified selection in last-selected-wins order
    pub fn ordered(&self) -> &[InputItem] {
        &self.ordered
    }

    /// First element of the ordered selection
    pub fn first(&self) -> Option<&InputItem> {
        self.ordered.first()
    }

    /// Returns true if nothing is selected
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Number of distinct selected inputs
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// Inputs in staging order: folders first, then files
    pub fn staging_order(&self) -> impl Iterator<Item = &InputItem> {
        self.folders.iter().chain(self.files.iter())
    }

    /// The item whose parent folder receives the produced archive
    ///
    /// Falls back from the first ordered item to the first file, then to the
    /// first folder.
    pub fn destination_anchor(&self) -> Option<&InputItem> {
        self.ordered
            .first()
            .or_else(|| self.files.first())
            .or_else(|| self.folders.first())
    }
}
