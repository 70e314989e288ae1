//! Content Classifier Port - safety screening of prompts.

use async_trait::async_trait;

/// Classifier decision for one prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SafetyVerdict {
    Safe,
    /// `reason` is for operators; it is not shown to users.
    Unsafe { reason: String },
}

impl SafetyVerdict {
    pub fn is_safe(&self) -> bool {
        matches!(self, SafetyVerdict::Safe)
    }
}

#[async_trait]
pub trait ContentClassifier: Send + Sync {
    async fn classify(&self, prompt: &str) -> Result<SafetyVerdict, ClassifierError>;

    /// Masks flagged spans before text is persisted. Identity by default.
    fn sanitize(&self, text: &str) -> String {
        text.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassifierError {
    #[error("classifier unavailable: {0}")]
    Unavailable(String),
}
