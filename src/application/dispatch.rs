//! DispatchCoordinator - concurrent, isolated execution of subtasks.
//!
//! Every subtask yields exactly one `DomainResult` at its own index. A
//! handler error, panic or timeout only affects its own slot. When the
//! request deadline passes or the caller cancels, in-flight handlers are
//! dropped and the unfinished slots are filled with failures.

use futures::future::BoxFuture;
use futures::{stream, FutureExt, StreamExt};
use serde_json::json;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::DispatchConfig;
use crate::domain::dispatch::{DispatchFailure, DomainResult};
use crate::domain::memory::ComposedMemory;
use crate::domain::routing::{DomainTag, Subtask};
use crate::domain::trace::RequestScope;
use crate::ports::{DomainHandler, HandlerContext};

/// Handlers keyed by domain, plus the fallback for unregistered domains.
#[derive(Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<DomainTag, Arc<dyn DomainHandler>>,
    fallback: Arc<dyn DomainHandler>,
}

impl HandlerRegistry {
    pub fn new(fallback: Arc<dyn DomainHandler>) -> Self {
        Self {
            handlers: HashMap::new(),
            fallback,
        }
    }

    /// Registers `handler` for `domain`, replacing any previous one.
    pub fn register(mut self, domain: DomainTag, handler: Arc<dyn DomainHandler>) -> Self {
        self.handlers.insert(domain, handler);
        self
    }

    /// Registered domains in `DomainTag` order.
    pub fn domains(&self) -> Vec<DomainTag> {
        let mut domains: Vec<DomainTag> = self.handlers.keys().copied().collect();
        domains.sort();
        domains
    }

    /// Handler for `domain`, and whether the fallback was used.
    fn resolve(&self, domain: DomainTag) -> (Arc<dyn DomainHandler>, bool) {
        match self.handlers.get(&domain) {
            Some(handler) => (handler.clone(), false),
            None => (self.fallback.clone(), true),
        }
    }
}

/// Concurrency and time bounds for one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchLimits {
    pub max_in_flight: usize,
    pub subtask_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for DispatchLimits {
    fn default() -> Self {
        Self::from(&DispatchConfig::default())
    }
}

impl From<&DispatchConfig> for DispatchLimits {
    fn from(config: &DispatchConfig) -> Self {
        Self {
            max_in_flight: config.max_in_flight,
            subtask_timeout: config.subtask_timeout(),
            request_timeout: config.request_timeout(),
        }
    }
}

pub struct DispatchCoordinator {
    registry: HandlerRegistry,
    limits: DispatchLimits,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}

impl DispatchCoordinator {
    pub fn new(registry: HandlerRegistry, limits: DispatchLimits) -> Self {
        Self { registry, limits }
    }

    async fn run_one(
        &self,
        handler: Arc<dyn DomainHandler>,
        subtask: &Subtask,
        context: HandlerContext<'_>,
        scope: &RequestScope,
    ) -> DomainResult {
        let started = Instant::now();
        let work = AssertUnwindSafe(handler.process(subtask, context)).catch_unwind();

        let result = match tokio::time::timeout(self.limits.subtask_timeout, work).await {
            Ok(Ok(Ok(result))) => result,
            Ok(Ok(Err(e))) => DomainResult::failed(DispatchFailure::Handler(e.to_string())),
            Ok(Err(payload)) => DomainResult::failed(DispatchFailure::Panicked(panic_message(&*payload))),
            Err(_) => DomainResult::timed_out(),
        };

        if let Some(failure) = &result.error {
            tracing::warn!(
                request_id = %scope.request_id(),
                subtask = %subtask.id(),
                domain = %subtask.domain(),
                handler = handler.name(),
                error = %failure,
                "subtask failed"
            );
            scope.push_error(format!("{} ({}) failed: {}", subtask.id(), subtask.domain(), failure));
        }

        scope.record(
            "dispatch.subtask",
            json!({
                "subtask": subtask.id().ordinal(),
                "domain": subtask.domain(),
                "handler": handler.name(),
                "success": result.success,
                "elapsed_ms": started.elapsed().as_millis() as u64,
            }),
        );
        result
    }

    /// Runs every subtask and returns their results in subtask order.
    pub async fn dispatch(
        &self,
        subtasks: &[Subtask],
        memory: &ComposedMemory,
        multimodal_summary: Option<&str>,
        scope: &RequestScope,
        cancel: &CancellationToken,
    ) -> Vec<DomainResult> {
        let context = HandlerContext {
            request_id: scope.request_id(),
            memory,
            multimodal_summary,
        };
        scope.record(
            "dispatch.started",
            json!({ "subtasks": subtasks.len(), "max_in_flight": self.limits.max_in_flight }),
        );

        let mut slots: Vec<Option<DomainResult>> = (0..subtasks.len()).map(|_| None).collect();

        let pending: Vec<BoxFuture<'_, (usize, DomainResult)>> = subtasks
            .iter()
            .enumerate()
            .map(|(index, subtask)| {
                let (handler, fell_back) = self.registry.resolve(subtask.domain());
                if fell_back {
                    scope.warn(format!(
                        "no handler registered for {}, using {} handler",
                        subtask.domain(),
                        handler.name()
                    ));
                }
                async move { (index, self.run_one(handler, subtask, context, scope).await) }.boxed()
            })
            .collect();
        let mut running = stream::iter(pending).buffer_unordered(self.limits.max_in_flight.max(1));

        let deadline = tokio::time::sleep(self.limits.request_timeout);
        tokio::pin!(deadline);

        let abandoned = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    scope.warn("dispatch cancelled, abandoning unfinished subtasks");
                    break Some(DispatchFailure::Cancelled);
                }
                _ = &mut deadline => {
                    scope.warn("request deadline reached, abandoning unfinished subtasks");
                    break Some(DispatchFailure::Timeout);
                }
                next = running.next() => match next {
                    Some((index, result)) => slots[index] = Some(result),
                    None => break None,
                },
            }
        };
        drop(running);

        let results: Vec<DomainResult> = slots
            .into_iter()
            .zip(subtasks)
            .map(|(slot, subtask)| {
                slot.unwrap_or_else(|| {
                    let failure = abandoned.clone().unwrap_or(DispatchFailure::Timeout);
                    scope.push_error(format!("{} ({}) failed: {}", subtask.id(), subtask.domain(), failure));
                    DomainResult::failed(failure)
                })
            })
            .collect();

        scope.record(
            "dispatch.finished",
            json!({
                "succeeded": results.iter().filter(|r| r.success).count(),
                "failed": results.iter().filter(|r| !r.success).count(),
            }),
        );
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{RequestId, SessionId, SubtaskId, UserId};
    use crate::domain::memory::{Session, UserProfile};
    use crate::ports::HandlerError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Behaviour keyed by subtask content.
    struct ScriptedHandler {
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    impl ScriptedHandler {
        fn new() -> Self {
            Self {
                active: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl DomainHandler for ScriptedHandler {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn process(
            &self,
            subtask: &Subtask,
            _context: HandlerContext<'_>,
        ) -> Result<DomainResult, HandlerError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            let content = subtask.content().to_string();
            let outcome = if content.starts_with("sleep") {
                let ms: u64 = content[5..].trim().parse().unwrap_or(0);
                tokio::time::sleep(Duration::from_millis(ms)).await;
                Ok(DomainResult::ok(content.clone()))
            } else if content == "fail" {
                Err(HandlerError::Other("boom".into()))
            } else if content == "panic" {
                panic!("handler exploded");
            } else {
                Ok(DomainResult::ok(content.clone()))
            };

            self.active.fetch_sub(1, Ordering::SeqCst);
            outcome
        }
    }

    fn memory() -> ComposedMemory {
        let user = UserId::new("u").unwrap();
        ComposedMemory::new(
            Session::new(user.clone(), SessionId::new("s").unwrap()),
            UserProfile::new(user),
            None,
        )
    }

    fn subtasks(contents: &[&str], domain: DomainTag) -> Vec<Subtask> {
        contents
            .iter()
            .enumerate()
            .map(|(i, c)| Subtask::new(SubtaskId::new(i as u32 + 1), domain, *c, "prompt"))
            .collect()
    }

    fn coordinator(handler: Arc<ScriptedHandler>, limits: DispatchLimits) -> DispatchCoordinator {
        let registry = HandlerRegistry::new(handler.clone()).register(DomainTag::General, handler);
        DispatchCoordinator::new(registry, limits)
    }

    fn limits(max_in_flight: usize, subtask_ms: u64, request_ms: u64) -> DispatchLimits {
        DispatchLimits {
            max_in_flight,
            subtask_timeout: Duration::from_millis(subtask_ms),
            request_timeout: Duration::from_millis(request_ms),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn results_keep_subtask_order() {
        let coordinator = coordinator(Arc::new(ScriptedHandler::new()), limits(4, 1_000, 5_000));
        let tasks = subtasks(&["sleep 300", "sleep 100", "sleep 200"], DomainTag::General);
        let scope = RequestScope::new(RequestId::new());

        let results = coordinator
            .dispatch(&tasks, &memory(), None, &scope, &CancellationToken::new())
            .await;

        let outputs: Vec<_> = results.iter().map(|r| r.text().unwrap()).collect();
        assert_eq!(outputs, vec!["sleep 300", "sleep 100", "sleep 200"]);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_isolated() {
        let coordinator = coordinator(Arc::new(ScriptedHandler::new()), limits(4, 1_000, 5_000));
        let tasks = subtasks(&["ok", "fail", "panic", "sleep 5000", "also ok"], DomainTag::General);
        let scope = RequestScope::new(RequestId::new());

        let results = coordinator
            .dispatch(&tasks, &memory(), None, &scope, &CancellationToken::new())
            .await;

        assert_eq!(results.len(), 5);
        assert!(results[0].success);
        assert_eq!(results[1].error, Some(DispatchFailure::Handler("boom".into())));
        assert!(matches!(&results[2].error, Some(DispatchFailure::Panicked(m)) if m == "handler exploded"));
        assert_eq!(results[3].error, Some(DispatchFailure::Timeout));
        assert!(results[4].success);
        assert_eq!(scope.errors().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn respects_max_in_flight() {
        let handler = Arc::new(ScriptedHandler::new());
        let coordinator = coordinator(handler.clone(), limits(2, 1_000, 5_000));
        let tasks = subtasks(&["sleep 50"; 6], DomainTag::General);

        coordinator
            .dispatch(
                &tasks,
                &memory(),
                None,
                &RequestScope::new(RequestId::new()),
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(handler.peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn request_deadline_keeps_completed_results() {
        let coordinator = coordinator(Arc::new(ScriptedHandler::new()), limits(4, 10_000, 500));
        let tasks = subtasks(&["sleep 100", "sleep 2000"], DomainTag::General);
        let scope = RequestScope::new(RequestId::new());

        let results = coordinator
            .dispatch(&tasks, &memory(), None, &scope, &CancellationToken::new())
            .await;

        assert!(results[0].success);
        assert_eq!(results[1].error, Some(DispatchFailure::Timeout));
        assert_eq!(scope.warnings().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_abandons_pending_subtasks() {
        let coordinator = coordinator(Arc::new(ScriptedHandler::new()), limits(4, 10_000, 10_000));
        let tasks = subtasks(&["sleep 1000"], DomainTag::General);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let results = coordinator
            .dispatch(
                &tasks,
                &memory(),
                None,
                &RequestScope::new(RequestId::new()),
                &cancel,
            )
            .await;

        assert_eq!(results[0].error, Some(DispatchFailure::Cancelled));
    }

    #[tokio::test]
    async fn unregistered_domain_uses_fallback_with_warning() {
        let fallback = Arc::new(ScriptedHandler::new());
        let coordinator = DispatchCoordinator::new(HandlerRegistry::new(fallback), DispatchLimits::default());
        let tasks = subtasks(&["hello"], DomainTag::Grammar);
        let scope = RequestScope::new(RequestId::new());

        let results = coordinator
            .dispatch(&tasks, &memory(), None, &scope, &CancellationToken::new())
            .await;

        assert_eq!(results[0].text(), Some("hello"));
        assert_eq!(scope.warnings().len(), 1);
    }

    #[tokio::test]
    async fn dispatch_runs_on_a_spawned_task() {
        let coordinator = Arc::new(coordinator(Arc::new(ScriptedHandler::new()), limits(2, 1_000, 5_000)));
        let tasks = subtasks(&["first", "second"], DomainTag::General);

        let handle = tokio::spawn(async move {
            let scope = RequestScope::new(RequestId::new());
            coordinator
                .dispatch(&tasks, &memory(), None, &scope, &CancellationToken::new())
                .await
        });

        let results = handle.await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.success));
    }
}
