//! Cache lookup ahead of routing.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use crate::application::{cache_key, CacheLayer};
use crate::ports::{Hook, HookArgs, HookError, HookOutcome, HookPhase};

/// Tries the exact tier, then the semantic tier. A hit short-circuits the
/// request with the cached answer. Requests carrying attachments are never
/// answered from cache since the key covers the prompt only.
pub struct CacheCheckHook {
    cache: Arc<CacheLayer>,
}

impl CacheCheckHook {
    pub fn new(cache: Arc<CacheLayer>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl Hook for CacheCheckHook {
    fn name(&self) -> &str {
        "cache_check"
    }

    async fn run(&self, phase: HookPhase, args: HookArgs<'_>) -> Result<HookOutcome, HookError> {
        if phase != HookPhase::PreProcess {
            return Ok(HookOutcome::pass());
        }
        if args.context.multimodal_input.is_some() {
            args.scope.record("cache.skipped", json!({ "reason": "multimodal input" }));
            return Ok(HookOutcome::pass());
        }

        let key = cache_key(args.prompt);
        if let Some(hit) = self.cache.get_exact(&key).await {
            args.scope.record("cache.hit", json!({ "tier": "exact" }));
            return Ok(HookOutcome::handled(hit));
        }

        if self.cache.semantic_enabled() {
            let hit = self
                .cache
                .get_semantic(args.prompt)
                .await
                .map_err(|e| HookError(e.to_string()))?;
            if let Some(hit) = hit {
                args.scope.record("cache.hit", json!({ "tier": "semantic" }));
                return Ok(HookOutcome::handled(hit));
            }
        }

        args.scope.record("cache.miss", json!({}));
        Ok(HookOutcome::pass())
    }
}
