//! Multimodal Analyzer Port - turns attached media into a text summary.

use async_trait::async_trait;

use crate::domain::orchestration::MultimodalInput;

#[async_trait]
pub trait MultimodalAnalyzer: Send + Sync {
    /// One-paragraph description of the input, used for routing and as
    /// extra handler context.
    async fn summarize(&self, input: &MultimodalInput) -> Result<String, AnalyzerError>;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalyzerError {
    #[error("unsupported input: {0}")]
    Unsupported(String),

    #[error("analysis failed: {0}")]
    Failed(String),
}
