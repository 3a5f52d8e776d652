//! Compress command - Pack files and folders into one archive
//!
//! Provides the `kittypress compress` CLI command which:
//! 1. Turns the path arguments into an input selection
//! 2. Runs the compress pipeline
//! 3. Saves the archive next to the first input, or records a pending save

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use kittypress_core::domain::{InputItem, InputSelection};
use kittypress_storage::LocalScopedStorage;
use tracing::info;

use super::print_report;
use crate::context::Invocation;

/// Compress files and folders into a single archive
#[derive(Debug, Args)]
pub struct CompressCommand {
    /// Files and folders to compress; all files count as one pick
    #[arg(required = true, value_name = "PATH")]
    pub paths: Vec<PathBuf>,
}

impl CompressCommand {
    pub async fn execute(&self, invocation: &Invocation) -> Result<()> {
        let out = invocation.output();
        let ctx = invocation.load_context()?;

        let selection = build_selection(&ctx.storage, &self.paths)?;
        let folders = selection.folders().len();
        let files = selection.files().len();
        if files > 0 {
            out.info(&format!("Selected {files} file(s)"));
        }
        if folders > 0 {
            out.info(&format!("Selected {folders} folder(s)"));
        }
        info!(files, folders, "Compressing selection");

        let mut coordinator = ctx.coordinator()?;
        let report = ctx
            .compress_usecase(invocation.status_sink())
            .run(&selection, &mut coordinator)
            .await;
        ctx.persist(coordinator)?;

        print_report(&report, &ctx.storage, invocation.output())
    }
}

/// Builds the selection the way a picker session would
///
/// Each directory is a folder pick. All file arguments form one multi-file
/// pick, made at the position of the first file argument.
pub(crate) fn build_selection(
    storage: &LocalScopedStorage,
    paths: &[PathBuf],
) -> Result<InputSelection> {
    let mut files = Vec::new();
    let mut file_pick_at = None;
    let mut folders = Vec::new();

    for path in paths {
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("Cannot access {}", path.display()))?;
        if metadata.is_dir() {
            let tree = storage
                .tree_for_path(path)
                .with_context(|| format!("Cannot select {}", path.display()))?;
            folders.push(InputItem::folder(tree, None));
        } else {
            let doc = storage
                .document_for_path(path)
                .with_context(|| format!("Cannot select {}", path.display()))?;
            file_pick_at.get_or_insert(folders.len());
            files.push(InputItem::file(doc, None));
        }
    }

    let mut selection = InputSelection::new();
    let file_pick_at = file_pick_at.unwrap_or(folders.len());
    for (index, folder) in folders.into_iter().enumerate() {
        if index == file_pick_at {
            selection.select_files(std::mem::take(&mut files));
        }
        selection.select_folder(folder);
    }
    selection.select_files(files);
    Ok(selection)
}
