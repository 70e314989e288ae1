//! HTTP DTOs for the chat endpoints.
//!
//! These types decouple the wire format (camelCase JSON) from the domain
//! request and response types.

use serde::{Deserialize, Serialize};

use crate::application::StreamEnd;
use crate::domain::foundation::{ErrorCode, ProjectId, SessionId, UserId, ValidationError};
use crate::domain::orchestration::{
    MultimodalInput, OrchestrationRequest, OrchestrationResponse, Outcome, RequestContext,
    ResponseSource,
};
use crate::domain::routing::DomainTag;
use crate::domain::trace::TraceStep;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Body of `POST /api/chat` and `POST /api/chat/stream`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub prompt: String,
    pub context: ChatContextDto,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatContextDto {
    pub user_id: String,
    pub session_id: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub multimodal_input: Option<MultimodalInput>,
}

impl ChatRequest {
    /// Validates ids and prompt, producing the domain request.
    pub fn into_request(self) -> Result<OrchestrationRequest, ValidationError> {
        let ChatContextDto {
            user_id,
            session_id,
            project_id,
            multimodal_input,
        } = self.context;

        let mut context = RequestContext::new(UserId::new(user_id)?, SessionId::new(session_id)?);
        if let Some(project_id) = project_id {
            context = context.with_project(ProjectId::new(project_id)?);
        }
        if let Some(input) = multimodal_input {
            context = context.with_multimodal(input);
        }
        OrchestrationRequest::new(self.prompt, context)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub request_id: String,
    pub response: String,
    pub source: ResponseSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<DomainTag>,
    pub outcome: OutcomeDto,
    pub trace: Vec<TraceStep>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeDto {
    Completed,
    Rejected,
    Failed,
}

impl From<&Outcome> for OutcomeDto {
    fn from(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Completed => OutcomeDto::Completed,
            Outcome::Rejected(_) => OutcomeDto::Rejected,
            Outcome::Failed => OutcomeDto::Failed,
        }
    }
}

impl From<OrchestrationResponse> for ChatResponse {
    fn from(response: OrchestrationResponse) -> Self {
        Self {
            request_id: response.request_id.to_string(),
            outcome: OutcomeDto::from(&response.outcome),
            response: response.response,
            source: response.source,
            domain: response.domain,
            trace: response.trace,
            warnings: response.warnings,
            errors: response.errors,
        }
    }
}

/// Payload of an SSE `chunk` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkEventDto {
    pub index: usize,
    pub delta: String,
}

/// Payload of the SSE `end` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndEventDto {
    pub request_id: String,
    pub source: ResponseSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<DomainTag>,
    pub outcome: OutcomeDto,
    pub trace: Vec<TraceStep>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl From<StreamEnd> for EndEventDto {
    fn from(end: StreamEnd) -> Self {
        Self {
            request_id: end.request_id.to_string(),
            outcome: OutcomeDto::from(&end.outcome),
            source: end.source,
            domain: end.domain,
            trace: end.trace,
            warnings: end.warnings,
            errors: end.errors,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Error body for requests that never reached the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::ValidationFailed.to_string(),
            message: message.into(),
        }
    }

    pub fn disabled(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::FeatureDisabled.to_string(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::InternalError.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_request() {
        let body = r#"{
            "prompt": "hi",
            "context": {"userId": "u1", "sessionId": "s1", "projectId": "p1"}
        }"#;
        let request: ChatRequest = serde_json::from_str(body).unwrap();
        let request = request.into_request().unwrap();
        assert_eq!(request.context().user_id.as_str(), "u1");
        assert_eq!(
            request.context().project_id.as_ref().map(|p| p.as_str()),
            Some("p1")
        );
        assert!(request.context().multimodal_input.is_none());
    }

    #[test]
    fn empty_ids_are_rejected() {
        let request = ChatRequest {
            prompt: "hi".into(),
            context: ChatContextDto {
                user_id: String::new(),
                session_id: "s".into(),
                project_id: None,
                multimodal_input: None,
            },
        };
        assert!(request.into_request().is_err());
    }

    #[test]
    fn error_codes_match_taxonomy() {
        assert_eq!(ErrorResponse::bad_request("x").code, "VALIDATION_FAILED");
        assert_eq!(ErrorResponse::internal("x").code, "INTERNAL_ERROR");
    }
}
