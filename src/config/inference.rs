//! Inference provider configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Inference provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct InferenceConfig {
    /// Which provider backs inference and embeddings
    #[serde(default)]
    pub provider: InferenceBackend,

    /// API key for the OpenAI-compatible provider
    pub api_key: Option<Secret<String>>,

    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Completion model
    #[serde(default = "default_model")]
    pub model: String,

    /// Embedding model
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Length of embedding vectors
    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: usize,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries on retryable failures
    #[serde(default = "default_retries")]
    pub max_retries: u32,

    /// Sampling temperature for handlers; 0 selects deterministic mode
    #[serde(default)]
    pub temperature: f32,

    /// Summarize attached media with the provider; when off, attachments
    /// are ignored with a warning
    #[serde(default = "default_multimodal_enabled")]
    pub multimodal_enabled: bool,
}

/// Inference backend type
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InferenceBackend {
    /// Offline scripted provider
    #[default]
    Mock,
    /// OpenAI-compatible HTTP API
    OpenAI,
}

impl InferenceConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check if an API key is configured
    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_ref()
            .is_some_and(|k| !k.expose_secret().is_empty())
    }

    /// Whether handlers should request deterministic completions
    pub fn is_deterministic(&self) -> bool {
        self.temperature == 0.0
    }

    /// Validate inference configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.provider == InferenceBackend::OpenAI && !self.has_api_key() {
            return Err(ValidationError::MissingRequired("INFERENCE__API_KEY"));
        }
        if self.embedding_dimensions == 0 {
            return Err(ValidationError::MustBePositive("inference.embedding_dimensions"));
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ValidationError::OutOfRange("inference.temperature"));
        }
        Ok(())
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            provider: InferenceBackend::default(),
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            embedding_model: default_embedding_model(),
            embedding_dimensions: default_embedding_dimensions(),
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
            temperature: 0.0,
            multimodal_enabled: default_multimodal_enabled(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_embedding_dimensions() -> usize {
    768
}

fn default_timeout() -> u64 {
    60
}

fn default_retries() -> u32 {
    3
}

fn default_multimodal_enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inference_config_defaults() {
        let config = InferenceConfig::default();
        assert_eq!(config.provider, InferenceBackend::Mock);
        assert_eq!(config.embedding_dimensions, 768);
        assert_eq!(config.timeout(), Duration::from_secs(60));
        assert!(config.is_deterministic());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_openai_requires_api_key() {
        let config = InferenceConfig {
            provider: InferenceBackend::OpenAI,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("INFERENCE__API_KEY"))
        );

        let config = InferenceConfig {
            provider: InferenceBackend::OpenAI,
            api_key: Some(Secret::new("sk-test".to_string())),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_backend_deserialization() {
        let config: InferenceConfig =
            serde_json::from_str(r#"{"provider":"openai","api_key":"sk-x"}"#).unwrap();
        assert_eq!(config.provider, InferenceBackend::OpenAI);
        assert!(config.has_api_key());
    }
}
