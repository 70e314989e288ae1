//! Model-backed domain detector.
//!
//! Asks the inference provider for a single domain label given the
//! registered domains and the recent conversation.

use async_trait::async_trait;
use std::fmt::Write;
use std::sync::Arc;

use crate::ports::{
    DetectionInput, DomainCandidate, DomainDetector, InferenceProvider, InferenceRequest,
    RoutingError,
};

const SYSTEM_PROMPT: &str = "You classify user requests. Reply with exactly one domain name \
from the list and nothing else.";

/// Turns of history shown to the model.
const HISTORY_TURNS: usize = 5;

pub struct InferenceDetector {
    provider: Arc<dyn InferenceProvider>,
}

impl InferenceDetector {
    pub fn new(provider: Arc<dyn InferenceProvider>) -> Self {
        Self { provider }
    }

    fn build_prompt(input: &DetectionInput<'_>) -> String {
        let mut prompt = String::from("Domains:\n");
        for tag in input.registered {
            let _ = writeln!(prompt, "- {}: {}", tag, tag.description());
        }

        let context = input.memory.render_context(HISTORY_TURNS);
        if !context.is_empty() {
            let _ = write!(prompt, "\n{}", context);
        }
        if let Some(summary) = input.multimodal_summary {
            let _ = writeln!(prompt, "\nAttached media: {}", summary);
        }

        let _ = write!(prompt, "\nRequest: {}\nDomain:", input.prompt);
        prompt
    }
}

#[async_trait]
impl DomainDetector for InferenceDetector {
    async fn detect(&self, input: DetectionInput<'_>) -> Result<Vec<DomainCandidate>, RoutingError> {
        let request = InferenceRequest::new(Self::build_prompt(&input))
            .with_system_prompt(SYSTEM_PROMPT)
            .with_max_tokens(8)
            .deterministic();

        let response = self.provider.infer(request).await?;
        let label = response.text.trim();
        if label.is_empty() {
            return Err(RoutingError::Unparseable("empty label".to_string()));
        }

        Ok(vec![DomainCandidate::new(label, 1.0)])
    }
}
