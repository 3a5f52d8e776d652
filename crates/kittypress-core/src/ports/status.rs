//! Status sink port
//!
//! Receives the user-visible status lines of a pipeline run: progress lines
//! while it runs and the final message when it ends.

/// Port trait for user-visible status updates
pub trait IStatusSink: Send + Sync {
    /// Shows `message` as the current status
    fn status(&self, message: &str);
}

/// Status sink that discards every message
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStatusSink;

impl IStatusSink for NullStatusSink {
    fn status(&self, _message: &str) {}
}
