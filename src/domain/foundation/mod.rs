//! Foundation module - Shared domain primitives.
//!
//! Identifiers, timestamps and validation errors used across the
//! orchestration engine.

mod errors;
mod ids;
mod timestamp;

pub use errors::{ErrorCode, ValidationError};
pub use ids::{FeedbackId, ProjectId, RequestId, SessionId, SubtaskId, UserId, MAX_ID_LENGTH};
pub use timestamp::Timestamp;
