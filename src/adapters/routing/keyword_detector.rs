//! Keyword-scoring domain detector.
//!
//! Scores the prompt (plus any media summary) against fixed keyword tables.
//! Makes no inference calls.

use async_trait::async_trait;

use crate::domain::routing::rules::score_domains;
use crate::ports::{DetectionInput, DomainCandidate, DomainDetector, RoutingError};

#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordDetector;

impl KeywordDetector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DomainDetector for KeywordDetector {
    async fn detect(&self, input: DetectionInput<'_>) -> Result<Vec<DomainCandidate>, RoutingError> {
        let text = match input.multimodal_summary {
            Some(summary) => format!("{}\n{}", input.prompt, summary),
            None => input.prompt.to_string(),
        };

        Ok(score_domains(&text)
            .into_iter()
            .filter(|(tag, _)| input.registered.contains(tag))
            .map(|(tag, score)| DomainCandidate::new(tag.as_str(), score as f32))
            .collect())
    }
}
