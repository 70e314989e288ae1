//! Feedback records.
//!
//! Explicit feedback comes from users through the HTTP API. Implicit
//! feedback is written by the orchestrator itself: positive when a request
//! completes, negative when it fails critically.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{FeedbackId, RequestId, SessionId, Timestamp, UserId, ValidationError};
use crate::domain::orchestration::{OrchestrationRequest, MAX_PROMPT_LENGTH};
use crate::domain::routing::DomainTag;

/// Characters of the answer kept in `response_summary`.
pub const SUMMARY_LENGTH: usize = 200;

/// Longest accepted free-text comment.
pub const MAX_DETAILS_LENGTH: usize = 4_000;

/// What the feedback says about an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    ThumbsUp,
    ThumbsDown,
    Helpful,
    NotHelpful,
    Correct,
    Incorrect,
    /// Free-text comment in `details`.
    Detailed,
    ImplicitPositive,
    ImplicitNegative,
}

impl FeedbackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackKind::ThumbsUp => "thumbs_up",
            FeedbackKind::ThumbsDown => "thumbs_down",
            FeedbackKind::Helpful => "helpful",
            FeedbackKind::NotHelpful => "not_helpful",
            FeedbackKind::Correct => "correct",
            FeedbackKind::Incorrect => "incorrect",
            FeedbackKind::Detailed => "detailed",
            FeedbackKind::ImplicitPositive => "implicit_positive",
            FeedbackKind::ImplicitNegative => "implicit_negative",
        }
    }

    /// Written by the engine rather than a user.
    pub fn is_implicit(&self) -> bool {
        matches!(self, FeedbackKind::ImplicitPositive | FeedbackKind::ImplicitNegative)
    }
}

impl fmt::Display for FeedbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One feedback entry, stored as a single JSON line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
    pub id: FeedbackId,
    pub user_id: UserId,
    pub session_id: SessionId,
    pub recorded_at: Timestamp,
    #[serde(rename = "type")]
    pub kind: FeedbackKind,
    pub prompt: String,
    pub response_summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<DomainTag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<RequestId>,
}

fn summarize(text: &str) -> String {
    if text.chars().count() <= SUMMARY_LENGTH {
        return text.to_string();
    }
    let mut summary: String = text.chars().take(SUMMARY_LENGTH).collect();
    summary.push_str("...");
    summary
}

impl FeedbackRecord {
    /// Validated explicit feedback.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if the prompt is blank
    /// - `OutOfRange` if the prompt exceeds `MAX_PROMPT_LENGTH` characters
    pub fn new(
        user_id: UserId,
        session_id: SessionId,
        kind: FeedbackKind,
        prompt: impl Into<String>,
        response: &str,
    ) -> Result<Self, ValidationError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(ValidationError::empty_field("prompt"));
        }
        let length = prompt.chars().count();
        if length > MAX_PROMPT_LENGTH {
            return Err(ValidationError::out_of_range(
                "prompt",
                1,
                MAX_PROMPT_LENGTH as i64,
                length as i64,
            ));
        }
        Ok(Self::unchecked(user_id, session_id, kind, prompt, response))
    }

    fn unchecked(
        user_id: UserId,
        session_id: SessionId,
        kind: FeedbackKind,
        prompt: String,
        response: &str,
    ) -> Self {
        Self {
            id: FeedbackId::new(),
            user_id,
            session_id,
            recorded_at: Timestamp::now(),
            kind,
            prompt,
            response_summary: summarize(response),
            details: None,
            domain: None,
            request_id: None,
        }
    }

    /// A completed request.
    pub fn implicit_positive(
        request: &OrchestrationRequest,
        request_id: RequestId,
        answer: &str,
        domain: Option<DomainTag>,
    ) -> Self {
        let context = request.context();
        let mut record = Self::unchecked(
            context.user_id.clone(),
            context.session_id.clone(),
            FeedbackKind::ImplicitPositive,
            request.prompt().to_string(),
            answer,
        );
        record.domain = domain;
        record.request_id = Some(request_id);
        record.details = Some(match domain {
            Some(domain) => format!("answered in domain {}", domain),
            None => "answered".to_string(),
        });
        record
    }

    /// A request that failed critically. `failure` is the internal error,
    /// which stays out of the user-facing answer.
    pub fn implicit_negative(request: &OrchestrationRequest, request_id: RequestId, failure: &str) -> Self {
        let context = request.context();
        let mut record = Self::unchecked(
            context.user_id.clone(),
            context.session_id.clone(),
            FeedbackKind::ImplicitNegative,
            request.prompt().to_string(),
            &format!("orchestration error: {}", failure),
        );
        record.request_id = Some(request_id);
        record
    }

    /// Attaches a free-text comment; blank comments are dropped.
    ///
    /// # Errors
    ///
    /// `OutOfRange` if the comment exceeds `MAX_DETAILS_LENGTH` characters.
    pub fn with_details(mut self, details: impl Into<String>) -> Result<Self, ValidationError> {
        let details = details.into();
        let length = details.chars().count();
        if length > MAX_DETAILS_LENGTH {
            return Err(ValidationError::out_of_range(
                "details",
                0,
                MAX_DETAILS_LENGTH as i64,
                length as i64,
            ));
        }
        self.details = (!details.trim().is_empty()).then_some(details);
        Ok(self)
    }

    pub fn with_domain(mut self, domain: DomainTag) -> Self {
        self.domain = Some(domain);
        self
    }

    pub fn for_request(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }
}
