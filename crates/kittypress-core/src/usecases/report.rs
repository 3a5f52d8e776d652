//! User-visible result of a pipeline run

use serde::Serialize;

use crate::domain::errors::PipelineError;
use crate::domain::pending::{PendingSave, PermissionRequest};

/// How a compress or decompress run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The output was written to its destination
    Saved,
    /// The output waits for the user to grant a folder
    AwaitingPermission(PermissionRequest),
    /// The run failed
    Failed(PipelineError),
}

/// Single result of a pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationReport {
    pub outcome: Outcome,
    /// Status line shown to the user
    pub message: String,
    /// An earlier pending save dropped by this run
    pub superseded: Option<PendingSave>,
}

impl OperationReport {
    pub fn saved(message: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Saved,
            message: message.into(),
            superseded: None,
        }
    }

    pub fn awaiting(
        request: PermissionRequest,
        superseded: Option<PendingSave>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            outcome: Outcome::AwaitingPermission(request),
            message: message.into(),
            superseded,
        }
    }

    pub fn failed(error: PipelineError) -> Self {
        Self {
            message: error.status_message(),
            outcome: Outcome::Failed(error),
            superseded: None,
        }
    }

    /// Returns true if the run ended with an error
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, Outcome::Failed(_))
    }

    /// Pending permission request, if the run was deferred
    pub fn permission_request(&self) -> Option<&PermissionRequest> {
        match &self.outcome {
            Outcome::AwaitingPermission(request) => Some(request),
            _ => None,
        }
    }
}

/// Serializable view of a report for machine-readable output
#[derive(Debug, Serialize)]
pub struct ReportView<'a> {
    pub outcome: &'static str,
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<&'a PermissionRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub superseded: Option<String>,
}

impl<'a> From<&'a OperationReport> for ReportView<'a> {
    fn from(report: &'a OperationReport) -> Self {
        let (outcome, request, error) = match &report.outcome {
            Outcome::Saved => ("saved", None, None),
            Outcome::AwaitingPermission(request) => ("awaiting_permission", Some(request), None),
            Outcome::Failed(error) => ("failed", None, Some(error.to_string())),
        };
        Self {
            outcome,
            message: &report.message,
            request,
            error,
            superseded: report
                .superseded
                .as_ref()
                .map(|s| s.artifact().target_name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_report_uses_status_message() {
        let report = OperationReport::failed(PipelineError::NoInputSelected);
        assert_eq!(report.message, "No input selected.");
        assert!(report.is_failure());
        assert!(report.permission_request().is_none());
    }

    #[test]
    fn report_view_serializes_outcome() {
        let save = PendingSave::archive("/cache/a.kitty", "a.kitty", None);
        let report = OperationReport::awaiting(
            save.permission_request(),
            None,
            "Choose folder to save archive",
        );
        let json = serde_json::to_value(ReportView::from(&report)).unwrap();
        assert_eq!(json["outcome"], "awaiting_permission");
        assert_eq!(json["request"]["target_name"], "a.kitty");
        assert!(json.get("error").is_none());
    }
}
