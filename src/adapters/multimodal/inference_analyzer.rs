//! Inference-backed multimodal analyzer.
//!
//! Text attachments are summarized locally by truncation. Other kinds are
//! described by the inference provider from their MIME type and payload
//! excerpt.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::orchestration::{MultimodalInput, MultimodalKind};
use crate::ports::{AnalyzerError, InferenceProvider, InferenceRequest, MultimodalAnalyzer};

/// Characters of attachment payload forwarded to the model.
const MAX_EXCERPT_CHARS: usize = 2_000;
/// Characters kept from text attachments.
const MAX_TEXT_SUMMARY_CHARS: usize = 500;

const SYSTEM_PROMPT: &str = "Describe the attachment in one short paragraph, focusing on what a \
user might be asking about it.";

pub struct InferenceMultimodalAnalyzer {
    provider: Arc<dyn InferenceProvider>,
}

impl InferenceMultimodalAnalyzer {
    pub fn new(provider: Arc<dyn InferenceProvider>) -> Self {
        Self { provider }
    }
}

fn kind_label(kind: MultimodalKind) -> &'static str {
    match kind {
        MultimodalKind::Text => "text",
        MultimodalKind::Image => "image",
        MultimodalKind::Audio => "audio",
        MultimodalKind::Video => "video",
        MultimodalKind::Document => "document",
    }
}

fn excerpt(data: &str, max_chars: usize) -> String {
    match data.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &data[..cut]),
        None => data.to_string(),
    }
}

#[async_trait]
impl MultimodalAnalyzer for InferenceMultimodalAnalyzer {
    async fn summarize(&self, input: &MultimodalInput) -> Result<String, AnalyzerError> {
        if input.data.trim().is_empty() {
            return Err(AnalyzerError::Unsupported("empty attachment".to_string()));
        }

        if input.kind == MultimodalKind::Text {
            return Ok(format!(
                "Text attachment: {}",
                excerpt(input.data.trim(), MAX_TEXT_SUMMARY_CHARS)
            ));
        }

        let prompt = format!(
            "Kind: {}\nMIME type: {}\nPayload excerpt:\n{}",
            kind_label(input.kind),
            input.mime_type.as_deref().unwrap_or("unknown"),
            excerpt(&input.data, MAX_EXCERPT_CHARS)
        );
        let request = InferenceRequest::new(prompt)
            .with_system_prompt(SYSTEM_PROMPT)
            .with_max_tokens(200);

        let response = self
            .provider
            .infer(request)
            .await
            .map_err(|e| AnalyzerError::Failed(e.to_string()))?;

        Ok(format!("{} attachment: {}", kind_label(input.kind), response.text.trim()))
    }
}
