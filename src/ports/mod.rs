//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the orchestration engine and the outside world. Adapters implement
//! these ports.
//!
//! ## Collaborator Ports
//!
//! - `InferenceProvider` - completions and embeddings
//! - `DomainHandler` - per-domain subtask processing
//! - `MemoryRepository` - session/user/project persistence
//! - `FeedbackRecorder` - append-only answer feedback
//! - `SimilarityIndex` - vector search for the semantic cache
//!
//! ## Gate and Routing Ports
//!
//! - `ContentClassifier` - prompt safety screening
//! - `RateLimiter` - sliding-window request counting
//! - `DomainDetector`, `TaskDecomposer` - routing strategies
//! - `MultimodalAnalyzer` - attached media summaries
//!
//! ## Extension Ports
//!
//! - `Hook` - pre/post processing keyed by `HookPhase`
//! - `CodeToolkit` - lint and test support for the coding handler

mod code_toolkit;
mod content_classifier;
mod domain_handler;
mod feedback_recorder;
mod hook;
mod inference;
mod memory_repository;
mod multimodal_analyzer;
mod rate_limiter;
mod routing;
mod similarity_index;

pub use code_toolkit::{CodeToolkit, LintReport, TestReport, ToolkitError};
pub use content_classifier::{ClassifierError, ContentClassifier, SafetyVerdict};
pub use domain_handler::{DomainHandler, HandlerContext, HandlerError};
pub use feedback_recorder::{FeedbackError, FeedbackRecorder};
pub use hook::{Hook, HookArgs, HookError, HookOutcome, HookPhase};
pub use inference::{
    InferenceError, InferenceProvider, InferenceRequest, InferenceResponse, ProviderInfo,
    DETERMINISTIC_SEED,
};
pub use memory_repository::{MemoryRepository, MemoryRepositoryError};
pub use multimodal_analyzer::{AnalyzerError, MultimodalAnalyzer};
pub use rate_limiter::{RateDecision, RateLimitError, RateLimiter, WindowUsage};
pub use routing::{
    DecomposedPart, DetectionInput, DomainCandidate, DomainDetector, RoutingError, TaskDecomposer,
};
pub use similarity_index::{SimilarityIndex, SimilarityIndexError, SimilarityMatch};
