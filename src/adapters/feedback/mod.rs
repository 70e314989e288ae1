//! Feedback Adapters
//!
//! Implementations of the FeedbackRecorder port.
//!
//! - **JsonlFeedbackLog** - one JSON line per record, one file per UTC day
//! - **InMemoryFeedbackLog** - process memory (testing/development)

mod in_memory_feedback_log;
mod jsonl_feedback_log;

pub use in_memory_feedback_log::InMemoryFeedbackLog;
pub use jsonl_feedback_log::JsonlFeedbackLog;
