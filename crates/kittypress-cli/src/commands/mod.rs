pub mod completions;
pub mod compress;
pub mod config;
pub mod decompress;
pub mod grant;
pub mod pending;

use anyhow::{Context, Result};
use kittypress_core::domain::DocumentRef;
use kittypress_core::usecases::{OperationReport, Outcome, ReportView};
use kittypress_storage::LocalScopedStorage;

use crate::output::Output;

/// Human-readable location of a reference: its local path when it has one
pub(crate) fn describe(storage: &LocalScopedStorage, reference: &DocumentRef) -> String {
    storage
        .local_path(reference)
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| reference.to_string())
}

/// Prints the result of a compress or decompress run
pub(crate) fn print_report(
    report: &OperationReport,
    storage: &LocalScopedStorage,
    out: Output,
) -> Result<()> {
    if out.is_json() {
        let json = serde_json::to_value(ReportView::from(report))
            .context("Failed to serialize report to JSON")?;
        out.json(&json);
        return Ok(());
    }

    if let Some(old) = &report.superseded {
        out.warn(&format!(
            "Dropped earlier pending save of {}",
            old.artifact().target_name()
        ));
    }

    match &report.outcome {
        Outcome::Saved => out.success(&report.message),
        Outcome::AwaitingPermission(request) => {
            out.warn(&report.message);
            if let Some(folder) = &request.initial_folder {
                out.field("Suggested folder", describe(storage, folder));
            }
            out.info(&format!(
                "Run 'kittypress grant <FOLDER> --token {}' to save {}",
                request.token, request.target_name
            ));
        }
        Outcome::Failed(_) => out.error(&report.message),
    }
    Ok(())
}
