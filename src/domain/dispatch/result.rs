//! The uniform envelope every domain handler produces.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Why a subtask produced no output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum DispatchFailure {
    /// The handler returned an error.
    #[error("handler error: {0}")]
    Handler(String),

    /// The handler or the request ran out of time.
    #[error("timed out")]
    Timeout,

    /// The handler panicked.
    #[error("handler panicked: {0}")]
    Panicked(String),

    /// The request was cancelled before the subtask finished.
    #[error("cancelled")]
    Cancelled,
}

/// Outcome of one subtask: `{success, output, error?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainResult {
    pub success: bool,
    pub output: Option<String>,
    /// Structured payload some handlers attach (e.g. generated code and lint report).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<DispatchFailure>,
}

impl DomainResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: Some(output.into()),
            data: None,
            error: None,
        }
    }

    pub fn failed(error: DispatchFailure) -> Self {
        Self {
            success: false,
            output: None,
            data: None,
            error: Some(error),
        }
    }

    pub fn timed_out() -> Self {
        Self::failed(DispatchFailure::Timeout)
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Output text of a successful result.
    pub fn text(&self) -> Option<&str> {
        if self.success {
            self.output.as_deref()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_result_exposes_text() {
        let result = DomainResult::ok("42");
        assert!(result.success);
        assert_eq!(result.text(), Some("42"));
    }

    #[test]
    fn failed_result_has_no_text() {
        let result = DomainResult::timed_out();
        assert!(!result.success);
        assert_eq!(result.text(), None);
        assert_eq!(result.error, Some(DispatchFailure::Timeout));
    }

    #[test]
    fn failure_serializes_with_kind_tag() {
        let json = serde_json::to_value(DispatchFailure::Handler("boom".into())).unwrap();
        assert_eq!(json["kind"], "handler");
        assert_eq!(json["message"], "boom");
    }
}
