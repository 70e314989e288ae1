//! Routing Strategy Ports - domain detection and task decomposition.
//!
//! Strategies return raw labels; the domain router validates them against
//! the registered set and applies fallbacks.

use async_trait::async_trait;

use crate::domain::memory::ComposedMemory;
use crate::domain::routing::DomainTag;

/// What a detector sees.
#[derive(Debug, Clone, Copy)]
pub struct DetectionInput<'a> {
    pub prompt: &'a str,
    pub memory: &'a ComposedMemory,
    pub multimodal_summary: Option<&'a str>,
    /// Registered domains, `General` included.
    pub registered: &'a [DomainTag],
}

/// A scored domain label proposed by a detector.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainCandidate {
    pub label: String,
    pub score: f32,
}

impl DomainCandidate {
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// One piece of a decomposed prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct DecomposedPart {
    pub content: String,
    /// Domain label suggested for this part, if the strategy has one.
    pub domain_hint: Option<String>,
}

impl DecomposedPart {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            domain_hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.domain_hint = Some(hint.into());
        self
    }
}

#[async_trait]
pub trait DomainDetector: Send + Sync {
    /// Candidate labels, in any order. Empty means "no signal".
    async fn detect(&self, input: DetectionInput<'_>) -> Result<Vec<DomainCandidate>, RoutingError>;
}

#[async_trait]
pub trait TaskDecomposer: Send + Sync {
    async fn decompose(
        &self,
        prompt: &str,
        domain: DomainTag,
        memory: &ComposedMemory,
    ) -> Result<Vec<DecomposedPart>, RoutingError>;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RoutingError {
    #[error("inference failed: {0}")]
    Inference(String),

    #[error("unparseable output: {0}")]
    Unparseable(String),
}

impl From<crate::ports::InferenceError> for RoutingError {
    fn from(err: crate::ports::InferenceError) -> Self {
        RoutingError::Inference(err.to_string())
    }
}
