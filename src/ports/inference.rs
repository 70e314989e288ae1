//! Inference Provider Port - text generation and embeddings.
//!
//! Everything the orchestrator needs from a language model: one-shot
//! completions (`infer`) and embedding vectors (`embed`). Implementations
//! must be callable concurrently from dispatch fan-out.
//!
//! # Example
//!
//! ```ignore
//! let request = InferenceRequest::new("Summarize this")
//!     .with_system_prompt("You are terse.")
//!     .deterministic();
//! let response = provider.infer(request).await?;
//! ```

use async_trait::async_trait;

/// Port for language model interactions.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Generate a completion for the request.
    async fn infer(&self, request: InferenceRequest) -> Result<InferenceResponse, InferenceError>;

    /// Embed text into a vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, InferenceError>;

    /// Provider information (name, model).
    fn provider_info(&self) -> ProviderInfo;
}

/// Request for a completion.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceRequest {
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub max_tokens: Option<u32>,
    /// 0.0 = deterministic.
    pub temperature: Option<f32>,
    /// Fixed seed for providers that support replayable sampling.
    pub seed: Option<u64>,
}

/// Seed used by `InferenceRequest::deterministic`.
pub const DETERMINISTIC_SEED: u64 = 7;

impl InferenceRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: None,
            max_tokens: None,
            temperature: None,
            seed: None,
        }
    }

    /// Sets the system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Sets the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Sets the temperature.
    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    /// Temperature 0 with a fixed seed.
    pub fn deterministic(mut self) -> Self {
        self.temperature = Some(0.0);
        self.seed = Some(DETERMINISTIC_SEED);
        self
    }
}

/// Completion result.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceResponse {
    pub text: String,
    pub model: String,
}

/// Provider metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderInfo {
    /// Provider name (e.g., "openai", "mock").
    pub name: String,
    /// Completion model identifier.
    pub model: String,
    /// Length of vectors returned by `embed`.
    pub embedding_dimensions: usize,
}

impl ProviderInfo {
    pub fn new(name: impl Into<String>, model: impl Into<String>, embedding_dimensions: usize) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            embedding_dimensions,
        }
    }
}

/// Inference provider errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InferenceError {
    /// Rate limited by provider.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds until retry is allowed.
        retry_after_secs: u32,
    },

    /// Provider is unavailable.
    #[error("provider unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// API key or authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Network error during request.
    #[error("network error: {0}")]
    Network(String),

    /// Failed to parse provider response.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid request configuration.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Request timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout {
        /// Configured timeout.
        timeout_secs: u32,
    },
}

impl InferenceError {
    /// Creates a rate limited error.
    pub fn rate_limited(retry_after_secs: u32) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Returns true if the request may succeed when retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Unavailable { .. } | Self::Network(_) | Self::Timeout { .. }
        )
    }
}
