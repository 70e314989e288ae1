//! Inbound request types.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ProjectId, SessionId, UserId, ValidationError};

/// Longest prompt accepted, in characters.
pub const MAX_PROMPT_LENGTH: usize = 32_000;

/// Kind of non-text input attached to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultimodalKind {
    Text,
    Image,
    Audio,
    Video,
    Document,
}

/// Attached media, base64 or URL in `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultimodalInput {
    pub kind: MultimodalKind,
    pub data: String,
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// Who is asking, in which session, with which optional attachments.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    pub user_id: UserId,
    pub session_id: SessionId,
    pub project_id: Option<ProjectId>,
    pub multimodal_input: Option<MultimodalInput>,
}

impl RequestContext {
    pub fn new(user_id: UserId, session_id: SessionId) -> Self {
        Self {
            user_id,
            session_id,
            project_id: None,
            multimodal_input: None,
        }
    }

    pub fn with_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn with_multimodal(mut self, input: MultimodalInput) -> Self {
        self.multimodal_input = Some(input);
        self
    }
}

/// A validated prompt plus its context.
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestrationRequest {
    prompt: String,
    context: RequestContext,
}

impl OrchestrationRequest {
    /// # Errors
    ///
    /// - `EmptyField` if the prompt is blank
    /// - `OutOfRange` if the prompt exceeds `MAX_PROMPT_LENGTH` characters
    pub fn new(prompt: impl Into<String>, context: RequestContext) -> Result<Self, ValidationError> {
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
        Ok(Self { prompt, context })
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn context(&self) -> &RequestContext {
        &self.context
    }
}
