//! Inference Provider Adapters.
//!
//! - `MockInferenceProvider` - scripted provider for tests and offline runs
//! - `OpenAIProvider` - OpenAI-compatible HTTP API

mod mock_provider;
mod openai_provider;

pub use mock_provider::{MockInferenceProvider, MockResponse, MOCK_EMBEDDING_DIMENSIONS};
pub use openai_provider::{OpenAIConfig, OpenAIProvider};
