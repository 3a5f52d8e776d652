//! Decompress command - Extract an archive next to itself

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use super::print_report;
use crate::context::Invocation;

/// Extract an archive into the folder that contains it
#[derive(Debug, Args)]
pub struct DecompressCommand {
    /// Archive to extract
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,
}

impl DecompressCommand {
    pub async fn execute(&self, invocation: &Invocation) -> Result<()> {
        let ctx = invocation.load_context()?;

        let archive = ctx
            .storage
            .document_for_path(&self.archive)
            .with_context(|| format!("Cannot select {}", self.archive.display()))?;
        info!(archive = %archive, "Decompressing archive");

        let mut coordinator = ctx.coordinator()?;
        let report = ctx
            .decompress_usecase(invocation.status_sink())
            .run(&archive, &mut coordinator)
            .await;
        ctx.persist(coordinator)?;

        print_report(&report, &ctx.storage, invocation.output())
    }
}
