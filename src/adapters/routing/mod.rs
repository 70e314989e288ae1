//! Domain detection and decomposition strategies.
//!
//! - `KeywordDetector` / `RuleDecomposer` - deterministic, no model calls
//! - `InferenceDetector` / `InferenceDecomposer` - ask the inference provider

mod inference_decomposer;
mod inference_detector;
mod keyword_detector;
mod rule_decomposer;

pub use inference_decomposer::InferenceDecomposer;
pub use inference_detector::InferenceDetector;
pub use keyword_detector::KeywordDetector;
pub use rule_decomposer::RuleDecomposer;
