//! Multimodal analyzer adapters.

mod inference_analyzer;

pub use inference_analyzer::InferenceMultimodalAnalyzer;
