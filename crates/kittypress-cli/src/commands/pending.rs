//! Pending command - Show the save waiting for a folder grant

use anyhow::{Context, Result};
use clap::Args;
use kittypress_core::domain::PendingArtifact;

use super::describe;
use crate::context::Invocation;

/// Show the save waiting for a folder grant
#[derive(Debug, Args)]
pub struct PendingCommand {}

impl PendingCommand {
    pub async fn execute(&self, invocation: &Invocation) -> Result<()> {
        let out = invocation.output();
        let ctx = invocation.load_context()?;
        let pending = ctx.pending.load()?;

        if invocation.format.is_json() {
            let json = serde_json::to_value(&pending)
                .context("Failed to serialize pending save to JSON")?;
            out.json(&serde_json::json!({
                "record": ctx.pending.path().display().to_string(),
                "pending": json,
            }));
            return Ok(());
        }

        let Some(save) = pending else {
            out.success("No pending save");
            return Ok(());
        };

        let kind = match save.artifact() {
            PendingArtifact::Archive { .. } => "archive",
            PendingArtifact::ExtractedTree { .. } => "extracted files",
        };
        out.warn(&format!(
            "Waiting for a folder grant: {} ({kind})",
            save.artifact().target_name()
        ));
        out.field("Request token", save.token());
        out.info(&format!(
            "Local copy: {}",
            save.artifact().local_path().display()
        ));
        if let Some(folder) = save.suggested_folder() {
            out.field("Suggested folder", describe(&ctx.storage, folder));
        }
        out.info(&format!(
            "Deferred at: {}",
            save.deferred_at().format("%Y-%m-%d %H:%M:%S UTC")
        ));
        out.info(&format!(
            "Run 'kittypress grant <FOLDER> --token {}' to save it",
            save.token()
        ));
        Ok(())
    }
}
