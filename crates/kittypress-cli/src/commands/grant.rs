//! Grant command - Allow writes into a folder and finish the pending save
//!
//! Provides the `kittypress grant` CLI command which:
//! 1. Records a persistent write grant for the folder
//! 2. Writes the pending archive or extracted files into it, if any
//! 3. Clears the pending-save record

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use kittypress_core::domain::RequestToken;
use kittypress_core::usecases::ResumeOutcome;
use tracing::info;

use crate::context::Invocation;

/// Grant write access to a folder and resume the pending save
#[derive(Debug, Args)]
pub struct GrantCommand {
    /// Folder to allow writes into
    #[arg(value_name = "FOLDER")]
    pub folder: PathBuf,

    /// Only resume the save deferred with this request token
    #[arg(long, value_name = "TOKEN")]
    pub token: Option<RequestToken>,
}

impl GrantCommand {
    pub async fn execute(&self, invocation: &Invocation) -> Result<()> {
        let out = invocation.output();
        let ctx = invocation.load_context()?;

        if !self.folder.is_dir() {
            out.error(&format!("Not a folder: {}", self.folder.display()));
            return Ok(());
        }
        let folder = ctx
            .storage
            .tree_for_path(&self.folder)
            .with_context(|| format!("Cannot grant {}", self.folder.display()))?;

        let mut coordinator = ctx.coordinator()?;
        info!(folder = %folder, pending = coordinator.pending().is_some(), "Granting folder");
        let mirror = ctx.tree_mirror();
        let outcome = match self.token {
            Some(token) => coordinator.resume_request(token, &folder, &mirror).await,
            None => coordinator.resume(&folder, &mirror).await,
        };
        ctx.persist(coordinator)?;

        let message = outcome.status_message();
        if invocation.format.is_json() {
            let (result, name, error) = match &outcome {
                ResumeOutcome::NothingPending => ("granted", None, None),
                ResumeOutcome::Resolved { name } => ("saved", Some(name.clone()), None),
                ResumeOutcome::Failed { name, error } => {
                    ("failed", Some(name.clone()), Some(error.to_string()))
                }
                ResumeOutcome::Stale { token } => {
                    ("stale", None, Some(format!("request {token} is not pending")))
                }
            };
            let json = serde_json::json!({
                "folder": self.folder.display().to_string(),
                "outcome": result,
                "name": name,
                "message": message,
                "error": error,
            });
            out.json(&json);
            return Ok(());
        }

        match &outcome {
            ResumeOutcome::Failed { error, .. } => {
                out.error(&message);
                out.info(&error.to_string());
            }
            ResumeOutcome::Stale { .. } => out.warn(&message),
            _ => out.success(&message),
        }
        Ok(())
    }
}
