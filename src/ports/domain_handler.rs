//! Domain Handler Port - per-domain subtask processing.

use async_trait::async_trait;

use crate::domain::dispatch::DomainResult;
use crate::domain::foundation::RequestId;
use crate::domain::memory::ComposedMemory;
use crate::domain::routing::Subtask;

/// Read-only context handed to a handler.
#[derive(Debug, Clone, Copy)]
pub struct HandlerContext<'a> {
    pub request_id: RequestId,
    pub memory: &'a ComposedMemory,
    /// Summary of attached media, if any.
    pub multimodal_summary: Option<&'a str>,
}

/// Processes subtasks for one registered domain.
///
/// Returning `Err` and panicking are both contained by the dispatcher and
/// turned into a failed `DomainResult` for this subtask only.
#[async_trait]
pub trait DomainHandler: Send + Sync {
    /// Short name used in logs and traces.
    fn name(&self) -> &str;

    async fn process(
        &self,
        subtask: &Subtask,
        context: HandlerContext<'_>,
    ) -> Result<DomainResult, HandlerError>;
}

/// Handler failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HandlerError {
    #[error("inference failed: {0}")]
    Inference(String),

    #[error("invalid task: {0}")]
    InvalidTask(String),

    #[error("{0}")]
    Other(String),
}

impl From<crate::ports::InferenceError> for HandlerError {
    fn from(err: crate::ports::InferenceError) -> Self {
        HandlerError::Inference(err.to_string())
    }
}
