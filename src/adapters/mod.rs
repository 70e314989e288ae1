//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the orchestration engine to external systems:
//! - `inference` - OpenAI-compatible HTTP provider and a scripted mock
//! - `storage` - in-memory and JSON-file memory repositories
//! - `feedback` - JSONL and in-memory feedback logs
//! - `rate_limiter` - per-user sliding window
//! - `similarity` - brute-force cosine index
//! - `safety` - denylist content classifier
//! - `routing` - keyword/rule and inference-backed routing strategies
//! - `handlers` - domain handlers and the static code toolkit
//! - `multimodal` - inference-backed attachment summaries
//! - `hooks` - built-in cache hooks
//! - `http` - axum endpoints

pub mod feedback;
pub mod handlers;
pub mod hooks;
pub mod http;
pub mod inference;
pub mod multimodal;
pub mod rate_limiter;
pub mod routing;
pub mod safety;
pub mod similarity;
pub mod storage;
