//! OpenAI-compatible Provider - `InferenceProvider` over the chat completions
//! and embeddings endpoints.
//!
//! Works with any server exposing the OpenAI REST shape (OpenAI, vLLM,
//! Ollama's compatibility layer, ...).
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAIConfig::new(api_key)
//!     .with_model("gpt-4o-mini")
//!     .with_base_url("http://localhost:11434/v1");
//!
//! let provider = OpenAIProvider::new(config)?;
//! ```

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;

use crate::config::InferenceConfig;
use crate::ports::{
    InferenceError, InferenceProvider, InferenceRequest, InferenceResponse, ProviderInfo,
};

/// Configuration for the OpenAI-compatible provider.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Completion model.
    pub model: String,
    /// Embedding model.
    pub embedding_model: String,
    /// Requested embedding length.
    pub embedding_dimensions: usize,
    /// Base URL for the API (default: https://api.openai.com/v1).
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retries on transient failures.
    pub max_retries: u32,
}

impl OpenAIConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            embedding_dimensions: 768,
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(60),
            max_retries: 3,
        }
    }

    /// Builds a provider configuration from application settings.
    pub fn from_settings(settings: &InferenceConfig) -> Self {
        let api_key = settings
            .api_key
            .as_ref()
            .map(|k| k.expose_secret().clone())
            .unwrap_or_default();
        Self::new(api_key)
            .with_model(settings.model.clone())
            .with_embedding_model(settings.embedding_model.clone(), settings.embedding_dimensions)
            .with_base_url(settings.base_url.clone())
            .with_timeout(settings.timeout())
            .with_max_retries(settings.max_retries)
    }

    /// Sets the completion model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the embedding model and vector length.
    pub fn with_embedding_model(mut self, model: impl Into<String>, dimensions: usize) -> Self {
        self.embedding_model = model.into();
        self.embedding_dimensions = dimensions;
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the maximum retry count.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// OpenAI-compatible API provider implementation.
pub struct OpenAIProvider {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIProvider {
    /// Creates a new provider with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` if the HTTP client cannot be built.
    pub fn new(config: OpenAIConfig) -> Result<Self, InferenceError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| InferenceError::InvalidRequest(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    fn embeddings_url(&self) -> String {
        format!("{}/embeddings", self.config.base_url)
    }

    fn to_chat_request(&self, request: &InferenceRequest) -> ChatRequest {
        let mut messages = Vec::new();

        if let Some(ref prompt) = request.system_prompt {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: prompt.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: request.prompt.clone(),
        });

        ChatRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            seed: request.seed,
        }
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
            .header("Content-Type", "application/json")
    }

    fn map_send_error(&self, e: reqwest::Error) -> InferenceError {
        if e.is_timeout() {
            InferenceError::Timeout {
                timeout_secs: self.config.timeout.as_secs() as u32,
            }
        } else if e.is_connect() {
            InferenceError::network(format!("Connection failed: {}", e))
        } else {
            InferenceError::network(e.to_string())
        }
    }

    /// Parses the API response status and handles errors.
    async fn handle_response_status(&self, response: Response) -> Result<Response, InferenceError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 | 403 => Err(InferenceError::AuthenticationFailed),
            429 => Err(InferenceError::rate_limited(Self::parse_retry_after(&error_body))),
            400 | 404 | 422 => Err(InferenceError::InvalidRequest(error_body)),
            500..=599 => Err(InferenceError::unavailable(format!(
                "Server error {}: {}",
                status, error_body
            ))),
            _ => Err(InferenceError::network(format!(
                "Unexpected status {}: {}",
                status, error_body
            ))),
        }
    }

    /// Parses "try again in Xs" from an error body, defaulting to 30 seconds.
    fn parse_retry_after(error_body: &str) -> u32 {
        let message = serde_json::from_str::<serde_json::Value>(error_body)
            .ok()
            .and_then(|v| v.get("error")?.get("message")?.as_str().map(str::to_string));

        message
            .as_deref()
            .and_then(|s| {
                let rest = &s[s.find("try again in ")? + 13..];
                let end = rest.find(|c: char| !c.is_ascii_digit())?;
                rest[..end].parse::<u32>().ok()
            })
            .unwrap_or(30)
    }

    async fn try_infer(&self, request: &InferenceRequest) -> Result<InferenceResponse, InferenceError> {
        let response = self
            .authorized(self.client.post(self.completions_url()))
            .json(&self.to_chat_request(request))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let response = self.handle_response_status(response).await?;

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::parse(format!("Failed to parse response: {}", e)))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| InferenceError::parse("No choices in response"))?;

        Ok(InferenceResponse {
            text: choice.message.content,
            model: parsed.model,
        })
    }

    async fn try_embed(&self, text: &str) -> Result<Vec<f32>, InferenceError> {
        let body = EmbeddingRequest {
            model: self.config.embedding_model.clone(),
            input: text.to_string(),
            dimensions: Some(self.config.embedding_dimensions),
        };
        let response = self
            .authorized(self.client.post(self.embeddings_url()))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let response = self.handle_response_status(response).await?;

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::parse(format!("Failed to parse embedding: {}", e)))?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| InferenceError::parse("No embedding in response"))
    }

    /// Runs `attempt` with exponential backoff (1s, 2s, 4s, ...) on retryable errors.
    async fn with_retries<T, F, Fut>(&self, mut attempt: F) -> Result<T, InferenceError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, InferenceError>>,
    {
        let mut retry_count = 0;
        loop {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && retry_count < self.config.max_retries => {
                    tracing::debug!(error = %err, retry_count, "retrying inference call");
                    sleep(Duration::from_secs(1 << retry_count.min(5))).await;
                    retry_count += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[async_trait]
impl InferenceProvider for OpenAIProvider {
    async fn infer(&self, request: InferenceRequest) -> Result<InferenceResponse, InferenceError> {
        self.with_retries(|| self.try_infer(&request)).await
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, InferenceError> {
        self.with_retries(|| self.try_embed(text)).await
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("openai", &self.config.model, self.config.embedding_dimensions)
    }
}

// ----- OpenAI API Types -----

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: String,
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    model: String,
    input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}
