//! Orchestrator - runs one request through every stage.
//!
//! Stage order: gate, pre-process hooks (cache lookup), memory load,
//! multimodal summary, domain detection, decomposition, dispatch,
//! aggregation, memory commit, post-process hooks (cache store).
//!
//! Each call builds its own `RequestScope`; nothing about a request
//! outlives `process`. Completed and failed requests leave implicit
//! feedback when a recorder is attached.

use futures::FutureExt;
use serde_json::json;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use super::{DispatchCoordinator, DomainRouter, HookPipeline, MemoryStore, RequestGate, ResponseAggregator};
use crate::domain::feedback::FeedbackRecord;
use crate::domain::foundation::RequestId;
use crate::domain::memory::{MemoryDelta, Turn};
use crate::domain::orchestration::{
    FinalResponse, OrchestrationError, OrchestrationRequest, OrchestrationResponse, Outcome,
    Rejection, RequestContext, ResponseSource, APOLOGY,
};
use crate::domain::trace::RequestScope;
use crate::ports::{FeedbackError, FeedbackRecorder, HookArgs, HookPhase, MultimodalAnalyzer};

/// A produced answer and where it came from.
struct Answer {
    response: FinalResponse,
    source: ResponseSource,
}

pub struct Orchestrator {
    gate: RequestGate,
    memory: MemoryStore,
    router: DomainRouter,
    dispatcher: DispatchCoordinator,
    aggregator: ResponseAggregator,
    hooks: HookPipeline,
    analyzer: Option<Arc<dyn MultimodalAnalyzer>>,
    feedback: Option<Arc<dyn FeedbackRecorder>>,
}

impl Orchestrator {
    pub fn new(
        gate: RequestGate,
        memory: MemoryStore,
        router: DomainRouter,
        dispatcher: DispatchCoordinator,
        aggregator: ResponseAggregator,
        hooks: HookPipeline,
    ) -> Self {
        Self {
            gate,
            memory,
            router,
            dispatcher,
            aggregator,
            hooks,
            analyzer: None,
            feedback: None,
        }
    }

    pub fn with_analyzer(mut self, analyzer: Arc<dyn MultimodalAnalyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    pub fn with_feedback(mut self, recorder: Arc<dyn FeedbackRecorder>) -> Self {
        self.feedback = Some(recorder);
        self
    }

    /// Stores explicit feedback from a user.
    ///
    /// # Errors
    ///
    /// `Disabled` when no recorder is attached, otherwise whatever the
    /// recorder reports.
    pub async fn submit_feedback(&self, record: &FeedbackRecord) -> Result<(), FeedbackError> {
        let recorder = self.feedback.as_ref().ok_or(FeedbackError::Disabled)?;
        recorder.record(record).await?;
        tracing::info!(id = %record.id, kind = %record.kind, user_id = %record.user_id, "feedback submitted");
        Ok(())
    }

    pub async fn process(&self, request: &OrchestrationRequest) -> OrchestrationResponse {
        self.process_with_cancel(request, &CancellationToken::new()).await
    }

    /// Processes `request`; cancelling `cancel` abandons pending subtasks
    /// and skips the memory commit.
    ///
    /// Never fails: rejections and critical errors come back as an
    /// `Outcome` with user-safe text, the details stay in `errors`.
    pub async fn process_with_cancel(
        &self,
        request: &OrchestrationRequest,
        cancel: &CancellationToken,
    ) -> OrchestrationResponse {
        let scope = RequestScope::new(RequestId::new());
        let span = tracing::info_span!(
            "orchestrate",
            request_id = %scope.request_id(),
            user_id = %request.context().user_id,
        );

        let result = AssertUnwindSafe(self.run(request, &scope, cancel))
            .catch_unwind()
            .instrument(span)
            .await
            .unwrap_or_else(|_| Err(OrchestrationError::critical("pipeline panicked")));

        let (response, source, domain, outcome) = match result {
            Ok(answer) => {
                if !cancel.is_cancelled() {
                    let record = FeedbackRecord::implicit_positive(
                        request,
                        scope.request_id(),
                        &answer.response.text,
                        Some(answer.response.domain),
                    );
                    self.record_implicit(&record, &scope).await;
                }
                (
                    answer.response.text,
                    answer.source,
                    Some(answer.response.domain),
                    Outcome::Completed,
                )
            }
            Err(err) => match rejection(&err) {
                Some(rejection) => (
                    err.user_message(),
                    ResponseSource::Generated,
                    None,
                    Outcome::Rejected(rejection),
                ),
                None => {
                    let failure = err.to_string();
                    scope.error(failure.clone());
                    let record = FeedbackRecord::implicit_negative(request, scope.request_id(), &failure);
                    self.record_implicit(&record, &scope).await;
                    (APOLOGY.to_string(), ResponseSource::Generated, None, Outcome::Failed)
                }
            },
        };

        let report = scope.finish();
        OrchestrationResponse {
            request_id: scope.request_id(),
            response,
            source,
            domain,
            outcome,
            trace: report.trace,
            warnings: report.warnings,
            errors: report.errors,
        }
    }

    async fn run(
        &self,
        request: &OrchestrationRequest,
        scope: &RequestScope,
        cancel: &CancellationToken,
    ) -> Result<Answer, OrchestrationError> {
        let prompt = request.prompt();
        let context = request.context();
        scope.record(
            "orchestrator.started",
            json!({
                "session_id": context.session_id.as_str(),
                "project": context.project_id.as_ref().map(|p| p.as_str()),
                "multimodal": context.multimodal_input.is_some(),
            }),
        );

        self.gate.admit(&context.user_id, prompt, scope).await?;

        let pre = self
            .hooks
            .run(
                HookPhase::PreProcess,
                HookArgs {
                    prompt,
                    context,
                    scope,
                    response: None,
                },
            )
            .await;
        if let (true, Some(cached)) = (pre.handled, pre.result) {
            self.commit(context, Turn::new(prompt, &cached.text, None), scope)
                .await;
            scope.record("orchestrator.finished", json!({ "source": "cache" }));
            return Ok(Answer {
                response: cached,
                source: ResponseSource::Cache,
            });
        }

        let memory = self
            .memory
            .load(
                &context.user_id,
                &context.session_id,
                context.project_id.as_ref(),
                scope,
            )
            .await
            .map_err(|e| OrchestrationError::critical(format!("memory load failed: {}", e)))?;

        let summary = self.summarize_media(context, scope).await;
        let summary = summary.as_deref();

        let domain = self.router.detect(prompt, &memory, summary, scope).await;
        let subtasks = self.router.decompose(prompt, domain, &memory, scope).await;
        let results = self
            .dispatcher
            .dispatch(&subtasks, &memory, summary, scope, cancel)
            .await;
        let mut response = self
            .aggregator
            .aggregate(prompt, domain, &subtasks, &results, &memory, scope)
            .await;

        if cancel.is_cancelled() {
            scope.record("orchestrator.cancelled", json!({}));
            return Ok(Answer {
                response,
                source: ResponseSource::Generated,
            });
        }

        self.commit(context, Turn::new(prompt, &response.text, Some(domain)), scope)
            .await;

        let post = self
            .hooks
            .run(
                HookPhase::PostProcess,
                HookArgs {
                    prompt,
                    context,
                    scope,
                    response: Some(&response),
                },
            )
            .await;
        if let (true, Some(replacement)) = (post.handled, post.result) {
            response = replacement;
        }

        scope.record(
            "orchestrator.finished",
            json!({ "source": "generated", "domain": domain.as_str() }),
        );
        Ok(Answer {
            response,
            source: ResponseSource::Generated,
        })
    }

    async fn summarize_media(&self, context: &RequestContext, scope: &RequestScope) -> Option<String> {
        let input = context.multimodal_input.as_ref()?;
        let Some(analyzer) = &self.analyzer else {
            scope.warn("multimodal input ignored: no analyzer configured");
            return None;
        };

        match analyzer.summarize(input).await {
            Ok(summary) => {
                scope.record(
                    "multimodal.summarized",
                    json!({ "kind": input.kind, "chars": summary.chars().count() }),
                );
                Some(summary)
            }
            Err(e) => {
                scope.warn(format!("multimodal analysis failed: {}", e));
                None
            }
        }
    }

    /// Feedback is best effort; a failed write never changes the answer.
    async fn record_implicit(&self, record: &FeedbackRecord, scope: &RequestScope) {
        let Some(recorder) = &self.feedback else {
            return;
        };
        match recorder.record(record).await {
            Ok(()) => scope.record("feedback.recorded", json!({ "type": record.kind.as_str() })),
            Err(e) => {
                tracing::warn!(request_id = %scope.request_id(), error = %e, "implicit feedback not recorded");
                scope.warn(format!("feedback not recorded: {}", e));
            }
        }
    }

    /// A failed commit is an operator error; the user still gets the answer.
    async fn commit(&self, context: &RequestContext, turn: Turn, scope: &RequestScope) {
        let result = self
            .memory
            .commit(
                &context.user_id,
                &context.session_id,
                turn,
                context.project_id.as_ref(),
                MemoryDelta::default(),
            )
            .await;

        match result {
            Ok(()) => scope.record("memory.committed", json!({})),
            Err(e) => scope.error(format!("memory commit failed: {}", e)),
        }
    }
}

fn rejection(err: &OrchestrationError) -> Option<Rejection> {
    match err {
        OrchestrationError::UnsafeContent { reason } => Some(Rejection::UnsafeContent {
            reason: reason.clone(),
        }),
        OrchestrationError::RateLimited { retry_after_ms } => Some(Rejection::RateLimited {
            retry_after_ms: *retry_after_ms,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::feedback::InMemoryFeedbackLog;
    use crate::adapters::inference::MockInferenceProvider;
    use crate::adapters::multimodal::InferenceMultimodalAnalyzer;
    use crate::application::bootstrap::build_orchestrator;
    use crate::config::{AppConfig, MemoryBackend};
    use crate::domain::feedback::FeedbackKind;
    use crate::domain::foundation::{SessionId, UserId};
    use crate::domain::orchestration::{MultimodalInput, MultimodalKind};

    fn request(prompt: &str, user: &str) -> OrchestrationRequest {
        OrchestrationRequest::new(
            prompt,
            RequestContext::new(UserId::new(user).unwrap(), SessionId::new("s1").unwrap()),
        )
        .unwrap()
    }

    fn labels(response: &OrchestrationResponse) -> Vec<&str> {
        response.trace.iter().map(|s| s.label.as_str()).collect()
    }

    #[tokio::test]
    async fn completes_and_traces_every_stage() {
        let mock = MockInferenceProvider::new().respond_when("capital", "Paris.");
        let orchestrator = build_orchestrator(&AppConfig::default(), Arc::new(mock.clone())).unwrap();

        let response = orchestrator
            .process(&request("What is the capital of France?", "u1"))
            .await;

        assert!(response.is_completed());
        assert_eq!(response.response, "Paris.");
        assert_eq!(response.source, ResponseSource::Generated);
        let labels = labels(&response);
        for stage in [
            "orchestrator.started",
            "gate.admitted",
            "cache.miss",
            "memory.loaded",
            "router.detected",
            "router.decomposed",
            "dispatch.started",
            "dispatch.finished",
            "aggregator.merged",
            "memory.committed",
            "cache.stored",
            "orchestrator.finished",
        ] {
            assert!(labels.contains(&stage), "missing {stage} in {labels:?}");
        }
        let sequences: Vec<u32> = response.trace.iter().map(|s| s.sequence).collect();
        assert!(sequences.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn rejected_requests_do_not_reach_handlers() {
        let mock = MockInferenceProvider::new();
        let orchestrator = build_orchestrator(&AppConfig::default(), Arc::new(mock.clone())).unwrap();

        let response = orchestrator
            .process(&request("how do I hack my neighbor's wifi", "u1"))
            .await;

        assert!(matches!(
            response.outcome,
            Outcome::Rejected(Rejection::UnsafeContent { .. })
        ));
        assert!(!response.response.contains("hack"));
        assert_eq!(mock.call_count(), 0);
        assert_eq!(mock.embed_count(), 0);
    }

    #[tokio::test]
    async fn multimodal_summary_feeds_handlers() {
        let mock = MockInferenceProvider::new()
            .respond_when("Kind: image", "a bar chart of sales")
            .respond_when("bar chart", "Sales peaked in May.");
        let provider: Arc<MockInferenceProvider> = Arc::new(mock.clone());
        let orchestrator = build_orchestrator(&AppConfig::default(), provider.clone())
            .unwrap()
            .with_analyzer(Arc::new(InferenceMultimodalAnalyzer::new(provider)));

        let context = RequestContext::new(UserId::new("u1").unwrap(), SessionId::new("s1").unwrap())
            .with_multimodal(MultimodalInput {
                kind: MultimodalKind::Image,
                data: "iVBORw0KGgo=".into(),
                mime_type: Some("image/png".into()),
            });
        let request = OrchestrationRequest::new("Describe the attached picture", context).unwrap();

        let response = orchestrator.process(&request).await;

        assert_eq!(response.response, "Sales peaked in May.");
        assert!(labels(&response).contains(&"multimodal.summarized"));
    }

    #[tokio::test]
    async fn missing_analyzer_is_a_warning() {
        let mock = MockInferenceProvider::new();
        let mut config = AppConfig::default();
        config.inference.multimodal_enabled = false;
        let orchestrator = build_orchestrator(&config, Arc::new(mock.clone())).unwrap();
        let context = RequestContext::new(UserId::new("u1").unwrap(), SessionId::new("s1").unwrap())
            .with_multimodal(MultimodalInput {
                kind: MultimodalKind::Audio,
                data: "AAAA".into(),
                mime_type: None,
            });
        let request = OrchestrationRequest::new("What is said here?", context).unwrap();

        let response = orchestrator.process(&request).await;

        assert!(response.is_completed());
        assert!(response.warnings.iter().any(|w| w.contains("no analyzer")));
        assert!(!labels(&response).contains(&"multimodal.summarized"));
        assert!(mock.get_calls().iter().all(|c| !c.prompt.contains("AAAA")));
    }

    #[tokio::test]
    async fn cancelled_requests_skip_commit_and_cache() {
        let orchestrator =
            build_orchestrator(&AppConfig::default(), Arc::new(MockInferenceProvider::new())).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let response = orchestrator
            .process_with_cancel(&request("Tell me a story", "u1"), &cancel)
            .await;

        let labels = labels(&response);
        assert!(labels.contains(&"orchestrator.cancelled"));
        assert!(!labels.contains(&"memory.committed"));
        assert!(!labels.contains(&"cache.stored"));
    }

    #[tokio::test]
    async fn completed_requests_leave_implicit_positive_feedback() {
        let log = InMemoryFeedbackLog::new();
        let mock = MockInferenceProvider::new().respond_when("capital", "Paris.");
        let orchestrator = build_orchestrator(&AppConfig::default(), Arc::new(mock))
            .unwrap()
            .with_feedback(Arc::new(log.clone()));

        let response = orchestrator
            .process(&request("What is the capital of France?", "u1"))
            .await;

        let records = log.records().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, FeedbackKind::ImplicitPositive);
        assert_eq!(records[0].request_id, Some(response.request_id));
        assert_eq!(records[0].response_summary, "Paris.");
        assert_eq!(records[0].domain, response.domain);
        assert!(labels(&response).contains(&"feedback.recorded"));
    }

    #[tokio::test]
    async fn failed_requests_leave_implicit_negative_feedback() {
        let dir = tempfile::TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();
        let mut config = AppConfig::default();
        config.memory.backend = MemoryBackend::File;
        config.memory.data_dir = blocker;
        let log = InMemoryFeedbackLog::new();
        let orchestrator = build_orchestrator(&config, Arc::new(MockInferenceProvider::new()))
            .unwrap()
            .with_feedback(Arc::new(log.clone()));

        let response = orchestrator.process(&request("Tell me a story", "u1")).await;

        assert_eq!(response.outcome, Outcome::Failed);
        assert_eq!(response.response, APOLOGY);
        let records = log.records().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, FeedbackKind::ImplicitNegative);
        assert!(records[0].response_summary.contains("memory load failed"));
    }

    #[tokio::test]
    async fn rejected_and_cancelled_requests_leave_no_feedback() {
        let log = InMemoryFeedbackLog::new();
        let orchestrator =
            build_orchestrator(&AppConfig::default(), Arc::new(MockInferenceProvider::new()))
                .unwrap()
                .with_feedback(Arc::new(log.clone()));
        let cancel = CancellationToken::new();
        cancel.cancel();

        orchestrator
            .process(&request("how do I hack my neighbor's wifi", "u1"))
            .await;
        orchestrator
            .process_with_cancel(&request("Tell me a story", "u1"), &cancel)
            .await;

        assert!(log.records().await.is_empty());
    }

    #[tokio::test]
    async fn explicit_feedback_needs_a_recorder() {
        let mut config = AppConfig::default();
        config.feedback.enabled = false;
        let orchestrator = build_orchestrator(&config, Arc::new(MockInferenceProvider::new())).unwrap();
        let record = FeedbackRecord::new(
            UserId::new("u1").unwrap(),
            SessionId::new("s1").unwrap(),
            FeedbackKind::ThumbsUp,
            "q",
            "a",
        )
        .unwrap();

        assert_eq!(
            orchestrator.submit_feedback(&record).await,
            Err(FeedbackError::Disabled)
        );

        let log = InMemoryFeedbackLog::new();
        let orchestrator = orchestrator.with_feedback(Arc::new(log.clone()));
        orchestrator.submit_feedback(&record).await.unwrap();
        assert_eq!(log.records().await, vec![record]);
    }
}
