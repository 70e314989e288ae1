//! Mock Inference Provider for tests and offline runs.
//!
//! # Features
//!
//! - Rule-based responses matched by prompt substring (order independent,
//!   so concurrent subtasks get stable answers)
//! - A queue of fallback responses consumed in order
//! - Deterministic bag-of-words embeddings, overridable per text
//! - Simulated delays and error injection
//! - Separate call tracking for `infer` and `embed`
//!
//! # Example
//!
//! ```ignore
//! let provider = MockInferenceProvider::new()
//!     .respond_when("time complexity", "O(1)")
//!     .with_embedding("hello", vec![1.0, 0.0]);
//! ```

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    InferenceError, InferenceProvider, InferenceRequest, InferenceResponse, ProviderInfo,
};

/// Embedding length used when none is configured.
pub const MOCK_EMBEDDING_DIMENSIONS: usize = 64;

/// A configured mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a successful completion.
    Success(String),
    /// Return an error.
    Error(InferenceError),
}

#[derive(Debug, Clone)]
struct MockRule {
    needle: String,
    response: MockResponse,
}

/// Mock inference provider.
#[derive(Debug, Clone)]
pub struct MockInferenceProvider {
    rules: Arc<Mutex<Vec<MockRule>>>,
    queue: Arc<Mutex<VecDeque<MockResponse>>>,
    embeddings: Arc<Mutex<HashMap<String, Vec<f32>>>>,
    embed_error: Arc<Mutex<Option<InferenceError>>>,
    info: ProviderInfo,
    delay: Duration,
    calls: Arc<Mutex<Vec<InferenceRequest>>>,
    embed_calls: Arc<Mutex<Vec<String>>>,
}

impl Default for MockInferenceProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockInferenceProvider {
    /// Creates a new mock provider with default settings.
    pub fn new() -> Self {
        Self {
            rules: Arc::new(Mutex::new(Vec::new())),
            queue: Arc::new(Mutex::new(VecDeque::new())),
            embeddings: Arc::new(Mutex::new(HashMap::new())),
            embed_error: Arc::new(Mutex::new(None)),
            info: ProviderInfo::new("mock", "mock-model-1", MOCK_EMBEDDING_DIMENSIONS),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
            embed_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Answers `response` whenever the prompt or system prompt contains `needle`.
    ///
    /// Rules are checked in registration order before the queue.
    pub fn respond_when(self, needle: impl Into<String>, response: impl Into<String>) -> Self {
        self.rules.lock().push(MockRule {
            needle: needle.into(),
            response: MockResponse::Success(response.into()),
        });
        self
    }

    /// Fails whenever the prompt contains `needle`.
    pub fn fail_when(self, needle: impl Into<String>, error: InferenceError) -> Self {
        self.rules.lock().push(MockRule {
            needle: needle.into(),
            response: MockResponse::Error(error),
        });
        self
    }

    /// Adds a successful response to the queue.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.queue
            .lock()
            .push_back(MockResponse::Success(content.into()));
        self
    }

    /// Adds an error response to the queue.
    pub fn with_error(self, error: InferenceError) -> Self {
        self.queue.lock().push_back(MockResponse::Error(error));
        self
    }

    /// Pins the embedding returned for `text`.
    pub fn with_embedding(self, text: impl Into<String>, embedding: Vec<f32>) -> Self {
        self.embeddings.lock().insert(text.into(), embedding);
        self
    }

    /// Makes every `embed` call fail.
    pub fn with_embed_error(self, error: InferenceError) -> Self {
        *self.embed_error.lock() = Some(error);
        self
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Returns the number of `infer` calls made.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Returns the number of `embed` calls made.
    pub fn embed_count(&self) -> usize {
        self.embed_calls.lock().len()
    }

    /// Returns all recorded `infer` requests.
    pub fn get_calls(&self) -> Vec<InferenceRequest> {
        self.calls.lock().clone()
    }

    /// Clears the call history.
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
        self.embed_calls.lock().clear();
    }

    fn next_response(&self, request: &InferenceRequest) -> MockResponse {
        let matched = self
            .rules
            .lock()
            .iter()
            .find(|rule| {
                request.prompt.contains(&rule.needle)
                    || request
                        .system_prompt
                        .as_deref()
                        .is_some_and(|s| s.contains(&rule.needle))
            })
            .map(|rule| rule.response.clone());
        if let Some(response) = matched {
            return response;
        }

        self.queue.lock().pop_front().unwrap_or_else(|| {
            let preview: String = request.prompt.chars().take(80).collect();
            MockResponse::Success(format!("Mock response to: {}", preview))
        })
    }

    /// Hashed bag-of-words vector, L2-normalized.
    fn hashed_embedding(&self, text: &str) -> Vec<f32> {
        let dims = self.info.embedding_dimensions.max(1);
        let mut vector = vec![0.0f32; dims];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            let slot = (hasher.finish() % dims as u64) as usize;
            vector[slot] += 1.0;
        }
        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

#[async_trait]
impl InferenceProvider for MockInferenceProvider {
    async fn infer(&self, request: InferenceRequest) -> Result<InferenceResponse, InferenceError> {
        self.calls.lock().push(request.clone());

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match self.next_response(&request) {
            MockResponse::Success(text) => Ok(InferenceResponse {
                text,
                model: self.info.model.clone(),
            }),
            MockResponse::Error(err) => Err(err),
        }
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, InferenceError> {
        self.embed_calls.lock().push(text.to_string());

        if let Some(err) = self.embed_error.lock().clone() {
            return Err(err);
        }
        let pinned = self.embeddings.lock().get(text).cloned();
        Ok(pinned.unwrap_or_else(|| self.hashed_embedding(text)))
    }

    fn provider_info(&self) -> ProviderInfo {
        self.info.clone()
    }
}
