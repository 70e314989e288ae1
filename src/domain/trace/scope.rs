//! Per-request context threaded through every orchestration stage.

use parking_lot::Mutex;
use serde_json::Value;

use super::{TraceRecorder, TraceStep};
use crate::domain::foundation::RequestId;

/// Trace plus the warnings and errors collected while serving one request.
///
/// Constructed fresh for each request and dropped with it.
#[derive(Debug)]
pub struct RequestScope {
    trace: TraceRecorder,
    warnings: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

/// Everything a scope collected, taken at response time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScopeReport {
    pub trace: Vec<TraceStep>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl RequestScope {
    pub fn new(request_id: RequestId) -> Self {
        Self {
            trace: TraceRecorder::new(request_id),
            warnings: Mutex::new(Vec::new()),
            errors: Mutex::new(Vec::new()),
        }
    }

    pub fn request_id(&self) -> RequestId {
        self.trace.request_id()
    }

    pub fn trace(&self) -> &TraceRecorder {
        &self.trace
    }

    pub fn record(&self, label: impl Into<String>, detail: Value) {
        self.trace.record(label, detail);
    }

    /// Adds a recoverable problem. Logged at warn level.
    pub fn warn(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(request_id = %self.request_id(), warning = %message, "request warning");
        self.warnings.lock().push(message);
    }

    /// Adds an operator-facing error. Logged at error level.
    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!(request_id = %self.request_id(), error = %message, "request error");
        self.errors.lock().push(message);
    }

    /// Adds to the error list without logging; for failures the caller
    /// already logged at a lower level.
    pub fn push_error(&self, message: impl Into<String>) {
        self.errors.lock().push(message.into());
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().clone()
    }

    /// Drains the trace and takes the collected diagnostics.
    pub fn finish(&self) -> ScopeReport {
        ScopeReport {
            trace: self.trace.drain(),
            warnings: std::mem::take(&mut *self.warnings.lock()),
            errors: std::mem::take(&mut *self.errors.lock()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_collects_everything() {
        let scope = RequestScope::new(RequestId::new());
        scope.record("start", Value::Null);
        scope.warn("detector unavailable");
        scope.error("boom");

        let report = scope.finish();
        assert_eq!(report.trace.len(), 1);
        assert_eq!(report.warnings, vec!["detector unavailable".to_string()]);
        assert_eq!(report.errors, vec!["boom".to_string()]);
        assert!(scope.warnings().is_empty());
    }
}
