//! Feedback Recorder Port - append-only sink for answer feedback.

use async_trait::async_trait;

use crate::domain::feedback::FeedbackRecord;

#[async_trait]
pub trait FeedbackRecorder: Send + Sync {
    /// Appends one record. Records are never updated or removed.
    async fn record(&self, record: &FeedbackRecord) -> Result<(), FeedbackError>;
}

/// Errors from feedback persistence.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FeedbackError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    /// No recorder is configured.
    #[error("feedback collection is disabled")]
    Disabled,
}
