//! HTTP DTOs for the feedback endpoint.

use serde::{Deserialize, Serialize};

use crate::domain::feedback::{FeedbackKind, FeedbackRecord};
use crate::domain::foundation::{FeedbackId, RequestId, SessionId, UserId, ValidationError};
use crate::domain::routing::DomainTag;

/// Body of `POST /api/feedback`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub user_id: String,
    pub session_id: String,
    #[serde(rename = "type")]
    pub kind: FeedbackKind,
    pub prompt: String,
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub domain: Option<DomainTag>,
    #[serde(default)]
    pub request_id: Option<RequestId>,
}

impl FeedbackRequest {
    /// Validates the submission. Implicit kinds are reserved for the engine.
    pub fn into_record(self) -> Result<FeedbackRecord, ValidationError> {
        if self.kind.is_implicit() {
            return Err(ValidationError::invalid_format(
                "type",
                "implicit feedback cannot be submitted",
            ));
        }
        let mut record = FeedbackRecord::new(
            UserId::new(self.user_id)?,
            SessionId::new(self.session_id)?,
            self.kind,
            self.prompt,
            &self.response,
        )?;
        if let Some(details) = self.details {
            record = record.with_details(details)?;
        }
        if let Some(domain) = self.domain {
            record = record.with_domain(domain);
        }
        if let Some(request_id) = self.request_id {
            record = record.for_request(request_id);
        }
        Ok(record)
    }
}

/// Body of a successful submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponse {
    pub success: bool,
    pub id: FeedbackId,
}
