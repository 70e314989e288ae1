//! Outbound response types.

use serde::{Deserialize, Serialize};

use super::Rejection;
use crate::domain::dispatch::DispatchFailure;
use crate::domain::foundation::{RequestId, SubtaskId};
use crate::domain::routing::DomainTag;
use crate::domain::trace::TraceStep;

/// Per-subtask summary carried on the final answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartSummary {
    pub subtask_id: SubtaskId,
    pub domain: DomainTag,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<DispatchFailure>,
}

/// The synthesized answer; also the value stored in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalResponse {
    pub text: String,
    pub domain: DomainTag,
    pub parts: Vec<PartSummary>,
}

impl FinalResponse {
    /// Subtasks that failed.
    pub fn failures(&self) -> impl Iterator<Item = &PartSummary> {
        self.parts.iter().filter(|p| !p.success)
    }
}

/// Where an answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Generated,
    Cache,
}

/// How a request ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Completed,
    Rejected(Rejection),
    Failed,
}

/// Everything returned to the caller for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestrationResponse {
    pub request_id: RequestId,
    pub response: String,
    pub source: ResponseSource,
    pub domain: Option<DomainTag>,
    pub outcome: Outcome,
    pub trace: Vec<TraceStep>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl OrchestrationResponse {
    pub fn is_completed(&self) -> bool {
        matches!(self.outcome, Outcome::Completed)
    }
}
