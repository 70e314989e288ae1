//! Single-call domain handler.
//!
//! Sends the subtask to the inference provider under a domain-specific
//! system prompt. Serves mathematics, vocabulary, grammar and general
//! requests, and is the fallback for domains with no registered handler.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::dispatch::DomainResult;
use crate::domain::routing::{DomainTag, Subtask};
use crate::ports::{
    DomainHandler, HandlerContext, HandlerError, InferenceProvider, InferenceRequest,
};

/// Conversation turns included in the prompt.
const CONTEXT_TURNS: usize = 5;

pub struct InferenceHandler {
    name: String,
    system_prompt: String,
    provider: Arc<dyn InferenceProvider>,
    /// `Some(0.0)` requests deterministic mode.
    temperature: Option<f32>,
}

impl InferenceHandler {
    pub fn new(
        name: impl Into<String>,
        system_prompt: impl Into<String>,
        provider: Arc<dyn InferenceProvider>,
    ) -> Self {
        Self {
            name: name.into(),
            system_prompt: system_prompt.into(),
            provider,
            temperature: None,
        }
    }

    /// Handler preconfigured with the system prompt for `domain`.
    pub fn for_domain(domain: DomainTag, provider: Arc<dyn InferenceProvider>) -> Self {
        Self::new(domain.as_str(), system_prompt_for(domain), provider)
    }

    /// Request temperature 0 and a fixed seed.
    pub fn deterministic(mut self, enabled: bool) -> Self {
        self.temperature = enabled.then_some(0.0);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    fn build_prompt(subtask: &Subtask, context: &HandlerContext<'_>) -> String {
        let mut prompt = context.memory.render_context(CONTEXT_TURNS);
        if let Some(summary) = context.multimodal_summary {
            prompt.push_str("Attached media: ");
            prompt.push_str(summary);
            prompt.push('\n');
        }
        if !prompt.is_empty() {
            prompt.push('\n');
        }
        prompt.push_str(subtask.content());
        prompt
    }
}

pub(crate) fn system_prompt_for(domain: DomainTag) -> &'static str {
    match domain {
        DomainTag::Mathematics => {
            "You are a careful mathematics tutor. Show the key steps, then state the final answer on its own line."
        }
        DomainTag::Vocabulary => {
            "You explain words. Give the definition, part of speech, an example sentence and close synonyms."
        }
        DomainTag::Grammar => {
            "You are a grammar assistant. Give the corrected text first, then list each change briefly."
        }
        DomainTag::Coding => {
            "You are a senior software engineer. Answer precisely and put code in fenced blocks."
        }
        DomainTag::General => "You are a helpful assistant. Answer clearly and concisely.",
    }
}

#[async_trait]
impl DomainHandler for InferenceHandler {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(
        &self,
        subtask: &Subtask,
        context: HandlerContext<'_>,
    ) -> Result<DomainResult, HandlerError> {
        let mut request = InferenceRequest::new(Self::build_prompt(subtask, &context))
            .with_system_prompt(self.system_prompt.as_str());
        match self.temperature {
            Some(t) if t == 0.0 => request = request.deterministic(),
            Some(t) => request = request.with_temperature(t),
            None => {}
        }

        let response = self.provider.infer(request).await?;
        Ok(DomainResult::ok(response.text))
    }
}
