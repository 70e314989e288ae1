//! Feedback module - explicit and implicit judgements on answers.

mod record;

pub use record::{FeedbackKind, FeedbackRecord, MAX_DETAILS_LENGTH, SUMMARY_LENGTH};
