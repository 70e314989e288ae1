//! Request-scoped decision trace.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::{RequestId, Timestamp};

/// One decision point recorded while handling a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceStep {
    pub sequence: u32,
    pub label: String,
    pub detail: Value,
    pub timestamp: Timestamp,
}

impl TraceStep {
    /// Single-line rendering: `3. [2024-01-01T00:00:00.000Z] dispatch.start - {...}`.
    pub fn render(&self) -> String {
        format!(
            "{}. [{}] {} - {}",
            self.sequence, self.timestamp, self.label, self.detail
        )
    }
}

/// Append-only trace owned by exactly one request.
///
/// Stages share it by reference; `record` takes `&self` so concurrent
/// subtasks can record without owning the recorder.
#[derive(Debug)]
pub struct TraceRecorder {
    request_id: RequestId,
    steps: Mutex<Vec<TraceStep>>,
}

impl TraceRecorder {
    pub fn new(request_id: RequestId) -> Self {
        Self {
            request_id,
            steps: Mutex::new(Vec::new()),
        }
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Appends a step. Sequence numbers start at 1 and never repeat.
    pub fn record(&self, label: impl Into<String>, detail: Value) {
        let label = label.into();
        tracing::debug!(
            request_id = %self.request_id,
            step = %label,
            detail = %detail,
            "trace step"
        );

        let mut steps = self.steps.lock();
        let sequence = steps.len() as u32 + 1;
        steps.push(TraceStep {
            sequence,
            label,
            detail,
            timestamp: Timestamp::now(),
        });
    }

    /// Number of steps recorded so far.
    pub fn len(&self) -> usize {
        self.steps.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Takes every recorded step, leaving the recorder empty.
    pub fn drain(&self) -> Vec<TraceStep> {
        std::mem::take(&mut *self.steps.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn records_in_order_with_sequence_numbers() {
        let trace = TraceRecorder::new(RequestId::new());
        trace.record("gate.admit", json!({"user": "u1"}));
        trace.record("cache.miss", Value::Null);

        let steps = trace.drain();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].sequence, 1);
        assert_eq!(steps[0].label, "gate.admit");
        assert_eq!(steps[1].sequence, 2);
    }

    #[test]
    fn drain_empties_the_recorder() {
        let trace = TraceRecorder::new(RequestId::new());
        trace.record("a", Value::Null);
        assert_eq!(trace.drain().len(), 1);
        assert!(trace.is_empty());
    }

    #[test]
    fn separate_recorders_do_not_share_steps() {
        let first = TraceRecorder::new(RequestId::new());
        let second = TraceRecorder::new(RequestId::new());
        first.record("only-first", Value::Null);

        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
    }

    #[test]
    fn render_includes_label_and_detail() {
        let trace = TraceRecorder::new(RequestId::new());
        trace.record("route.detect", json!({"domain": "coding"}));
        let line = trace.drain()[0].render();
        assert!(line.starts_with("1. ["));
        assert!(line.contains("route.detect - {\"domain\":\"coding\"}"));
    }
}
