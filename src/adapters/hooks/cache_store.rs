//! Stores generated answers after the turn is committed.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use crate::application::{cache_key, CacheLayer};
use crate::ports::{Hook, HookArgs, HookError, HookOutcome, HookPhase};

/// Caches answers whose subtasks all succeeded and that carried no
/// attachment. Partial answers are not cached so a later retry can do better.
pub struct CacheStoreHook {
    cache: Arc<CacheLayer>,
}

impl CacheStoreHook {
    pub fn new(cache: Arc<CacheLayer>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl Hook for CacheStoreHook {
    fn name(&self) -> &str {
        "cache_store"
    }

    async fn run(&self, phase: HookPhase, args: HookArgs<'_>) -> Result<HookOutcome, HookError> {
        let (HookPhase::PostProcess, Some(response)) = (phase, args.response) else {
            return Ok(HookOutcome::pass());
        };
        if args.context.multimodal_input.is_some() {
            return Ok(HookOutcome::pass());
        }
        if response.failures().next().is_some() {
            args.scope.record("cache.skipped", json!({ "reason": "partial failure" }));
            return Ok(HookOutcome::pass());
        }

        let embedding = self
            .cache
            .embedding_for(args.prompt)
            .await
            .map_err(|e| HookError(e.to_string()))?;
        self.cache
            .set(&cache_key(args.prompt), response.clone(), embedding)
            .await;

        args.scope.record("cache.stored", json!({}));
        Ok(HookOutcome::pass())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dispatch::DispatchFailure;
    use crate::domain::foundation::{RequestId, SessionId, SubtaskId, UserId};
    use crate::domain::orchestration::{FinalResponse, PartSummary, RequestContext};
    use crate::domain::routing::DomainTag;
    use crate::domain::trace::RequestScope;

    fn response(success: bool) -> FinalResponse {
        FinalResponse {
            text: "done".to_string(),
            domain: DomainTag::General,
            parts: vec![PartSummary {
                subtask_id: SubtaskId::new(1),
                domain: DomainTag::General,
                success,
                error: (!success).then_some(DispatchFailure::Timeout),
            }],
        }
    }

    async fn run(cache: &Arc<CacheLayer>, answer: &FinalResponse) {
        let hook = CacheStoreHook::new(cache.clone());
        let scope = RequestScope::new(RequestId::new());
        let context =
            RequestContext::new(UserId::new("u").unwrap(), SessionId::new("s").unwrap());
        let outcome = hook
            .run(
                HookPhase::PostProcess,
                HookArgs {
                    prompt: "Say something",
                    context: &context,
                    scope: &scope,
                    response: Some(answer),
                },
            )
            .await
            .unwrap();
        assert!(!outcome.handled);
    }

    #[tokio::test]
    async fn stores_successful_answers() {
        let cache = Arc::new(CacheLayer::new(10, None));
        run(&cache, &response(true)).await;
        assert_eq!(cache.get_exact(&cache_key("say something")).await, Some(response(true)));
    }

    #[tokio::test]
    async fn skips_partial_answers() {
        let cache = Arc::new(CacheLayer::new(10, None));
        run(&cache, &response(false)).await;
        assert!(cache.is_empty());
    }
}
