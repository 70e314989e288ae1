//! ResponseAggregator - merges subtask results into one answer.
//!
//! Parts appear in subtask order. Every failed part is acknowledged in the
//! text with a short note that never includes internal error detail.

use serde_json::json;
use std::fmt::Write;
use std::sync::Arc;

use crate::config::AggregationMode;
use crate::domain::dispatch::{DispatchFailure, DomainResult};
use crate::domain::memory::ComposedMemory;
use crate::domain::orchestration::{FinalResponse, PartSummary};
use crate::domain::routing::{DomainTag, Subtask};
use crate::domain::trace::RequestScope;
use crate::ports::{InferenceProvider, InferenceRequest};

const ALL_FAILED: &str = "Sorry, I couldn't complete any part of your request. Please try again.";

const SYNTHESIS_PROMPT: &str = "Combine the numbered partial answers into one coherent reply to \
the user's request. Keep every fact and code block from the parts, keep their order and do not \
add new claims.";

pub struct ResponseAggregator {
    mode: AggregationMode,
    provider: Option<Arc<dyn InferenceProvider>>,
}

fn failure_note(index: usize, failure: Option<&DispatchFailure>) -> String {
    let why = match failure {
        Some(DispatchFailure::Timeout) => "it took too long",
        Some(DispatchFailure::Cancelled) => "the request was cancelled",
        _ => "an error occurred",
    };
    format!("[Part {} of your request could not be completed: {}.]", index + 1, why)
}

impl ResponseAggregator {
    /// Deterministic concatenation; never calls a model.
    pub fn template() -> Self {
        Self {
            mode: AggregationMode::Template,
            provider: None,
        }
    }

    /// Model synthesis at temperature 0 for multi-part answers.
    pub fn inference(provider: Arc<dyn InferenceProvider>) -> Self {
        Self {
            mode: AggregationMode::Inference,
            provider: Some(provider),
        }
    }

    pub fn mode(&self) -> AggregationMode {
        self.mode
    }

    pub async fn aggregate(
        &self,
        prompt: &str,
        domain: DomainTag,
        subtasks: &[Subtask],
        results: &[DomainResult],
        memory: &ComposedMemory,
        scope: &RequestScope,
    ) -> FinalResponse {
        let parts: Vec<PartSummary> = subtasks
            .iter()
            .zip(results)
            .map(|(subtask, result)| PartSummary {
                subtask_id: subtask.id(),
                domain: subtask.domain(),
                success: result.success,
                error: result.error.clone(),
            })
            .collect();

        let succeeded = results.iter().filter(|r| r.success).count();
        let text = if succeeded == 0 {
            ALL_FAILED.to_string()
        } else if results.len() == 1 {
            results[0].text().unwrap_or_default().to_string()
        } else {
            match &self.provider {
                Some(provider) if self.mode == AggregationMode::Inference => {
                    match self.synthesize(provider.as_ref(), prompt, results, memory).await {
                        Ok(text) => Self::append_notes(text, results),
                        Err(e) => {
                            scope.warn(format!("aggregation synthesis failed, concatenating: {}", e));
                            Self::concatenate(results)
                        }
                    }
                }
                _ => Self::concatenate(results),
            }
        };

        scope.record(
            "aggregator.merged",
            json!({
                "mode": format!("{:?}", self.mode).to_lowercase(),
                "parts": parts.len(),
                "failed": parts.len() - succeeded,
            }),
        );

        FinalResponse { text, domain, parts }
    }

    /// Successful outputs in order, with a note in place of each failure.
    fn concatenate(results: &[DomainResult]) -> String {
        results
            .iter()
            .enumerate()
            .map(|(i, r)| match r.text() {
                Some(text) => text.trim().to_string(),
                None => failure_note(i, r.error.as_ref()),
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn append_notes(mut text: String, results: &[DomainResult]) -> String {
        for (i, r) in results.iter().enumerate().filter(|(_, r)| !r.success) {
            let _ = write!(text, "\n\n{}", failure_note(i, r.error.as_ref()));
        }
        text
    }

    async fn synthesize(
        &self,
        provider: &dyn InferenceProvider,
        prompt: &str,
        results: &[DomainResult],
        memory: &ComposedMemory,
    ) -> Result<String, crate::ports::InferenceError> {
        let mut body = memory.render_context(2);
        let _ = writeln!(body, "User request: {}\n", prompt);
        for (i, r) in results.iter().enumerate() {
            if let Some(text) = r.text() {
                let _ = writeln!(body, "Part {}:\n{}\n", i + 1, text.trim());
            }
        }

        let request = InferenceRequest::new(body)
            .with_system_prompt(SYNTHESIS_PROMPT)
            .deterministic();
        Ok(provider.infer(request).await?.text)
    }
}
